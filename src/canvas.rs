//! Software canvas
//!
//! A plain `Vec<u32>` pixel buffer in 0xAARRGGBB packing, the format minifb
//! presents directly. Tile art lands here through a scaled nearest-neighbour
//! blit with source-over alpha; whole-frame shifts use a raw copy.

use image::RgbaImage;

use crate::geometry::Rect;

/// Frame background, a near-black blue.
pub const BACKGROUND: u32 = 0xFF05_050F;

pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    /// Active clip rects in screen space; empty means unclipped. Only
    /// [`Canvas::blit_image`] honours the clip.
    clip: Vec<Rect>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
            clip: Vec::new(),
        }
    }

    /// Restrict subsequent image blits to the union of the given rects.
    pub fn set_clip(&mut self, rects: &[Rect]) {
        self.clip.clear();
        self.clip.extend_from_slice(rects);
    }

    pub fn clear_clip(&mut self) {
        self.clip.clear();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![BACKGROUND; width * height];
        self.clip.clear();
    }

    pub fn clear(&mut self) {
        self.pixels.fill(BACKGROUND);
    }

    /// Reset a screen-space region to the background colour.
    pub fn clear_rect(&mut self, rect: &Rect) {
        let (x0, y0, x1, y1) = self.pixel_span(rect);
        for y in y0..y1 {
            let row = y * self.width;
            self.pixels[row + x0..row + x1].fill(BACKGROUND);
        }
    }

    /// Draw an image into a screen-space rect, scaling nearest-neighbour and
    /// compositing source-over.
    pub fn blit_image(&mut self, img: &RgbaImage, dst: &Rect) {
        if dst.width <= 0.0 || dst.height <= 0.0 {
            return;
        }
        let (src_w, src_h) = img.dimensions();
        let (x0, y0, x1, y1) = self.pixel_span(dst);

        for y in y0..y1 {
            let v = (y as f64 + 0.5 - dst.top) / dst.height;
            let sy = ((v * src_h as f64) as u32).min(src_h - 1);
            for x in x0..x1 {
                if !self.clip.is_empty() && !self.clip.iter().any(|c| contains(c, x, y)) {
                    continue;
                }
                let u = (x as f64 + 0.5 - dst.left) / dst.width;
                let sx = ((u * src_w as f64) as u32).min(src_w - 1);
                let px = img.get_pixel(sx, sy).0;
                match px[3] {
                    0 => {}
                    255 => {
                        self.pixels[y * self.width + x] =
                            0xFF00_0000 | (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
                    }
                    alpha => {
                        let idx = y * self.width + x;
                        self.pixels[idx] = blend(self.pixels[idx], px, alpha);
                    }
                }
            }
        }
    }

    /// Overwrite-copy another canvas shifted by (dx, dy), clipping to this
    /// canvas. No compositing; background pixels copy too.
    pub fn blit_canvas(&mut self, src: &Canvas, dx: i64, dy: i64) {
        for y in 0..src.height as i64 {
            let ty = y + dy;
            if ty < 0 || ty >= self.height as i64 {
                continue;
            }
            let sx0 = (-dx).clamp(0, src.width as i64);
            let sx1 = (self.width as i64 - dx).clamp(0, src.width as i64);
            if sx0 >= sx1 {
                continue;
            }
            let src_row = y as usize * src.width;
            let dst_row = ty as usize * self.width + (sx0 + dx) as usize;
            let span = (sx1 - sx0) as usize;
            self.pixels[dst_row..dst_row + span]
                .copy_from_slice(&src.pixels[src_row + sx0 as usize..src_row + sx1 as usize]);
        }
    }

    /// Overwrite this canvas with another of the same size.
    pub fn copy_from(&mut self, src: &Canvas) {
        debug_assert_eq!((self.width, self.height), (src.width, src.height));
        self.pixels.copy_from_slice(&src.pixels);
    }

    /// Rect -> half-open pixel spans, bounded to the canvas.
    fn pixel_span(&self, rect: &Rect) -> (usize, usize, usize, usize) {
        let x0 = rect.left.floor().max(0.0) as usize;
        let y0 = rect.top.floor().max(0.0) as usize;
        let x1 = (rect.left + rect.width).ceil().clamp(0.0, self.width as f64) as usize;
        let y1 = (rect.top + rect.height).ceil().clamp(0.0, self.height as f64) as usize;
        (x0.min(x1), y0.min(y1), x1, y1)
    }
}

/// Half-open pixel containment.
fn contains(rect: &Rect, x: usize, y: usize) -> bool {
    let (x, y) = (x as f64, y as f64);
    x >= rect.left && x < rect.left + rect.width && y >= rect.top && y < rect.top + rect.height
}

/// Source-over blend of an RGBA pixel onto a packed background pixel.
fn blend(under: u32, over: [u8; 4], alpha: u8) -> u32 {
    let a = alpha as u32;
    let inv = 255 - a;
    let r = (over[0] as u32 * a + ((under >> 16) & 0xFF) * inv) / 255;
    let g = (over[1] as u32 * a + ((under >> 8) & 0xFF) * inv) / 255;
    let b = (over[2] as u32 * a + (under & 0xFF) * inv) / 255;
    0xFF00_0000 | r << 16 | g << 8 | b
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_clear_rect_stays_in_bounds() {
        let mut canvas = Canvas::new(8, 8);
        let red = 0xFFFF_0000;
        for px in 0..64 {
            canvas.pixels[px] = red;
        }

        canvas.clear_rect(&Rect::new(2.0, 2.0, 3.0, 3.0));
        assert_eq!(canvas.pixel(1, 1), red);
        assert_eq!(canvas.pixel(2, 2), BACKGROUND);
        assert_eq!(canvas.pixel(4, 4), BACKGROUND);
        assert_eq!(canvas.pixel(5, 5), red);

        // off-canvas rects clip instead of panicking
        canvas.clear_rect(&Rect::new(-5.0, -5.0, 100.0, 2.0));
        assert_eq!(canvas.pixel(7, 0), BACKGROUND);
    }

    #[test]
    fn test_blit_image_unscaled() {
        let mut canvas = Canvas::new(4, 4);
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        canvas.blit_image(&img, &Rect::new(1.0, 1.0, 2.0, 2.0));

        assert_eq!(canvas.pixel(0, 0), BACKGROUND);
        assert_eq!(canvas.pixel(1, 1), 0xFF0A_141E);
        assert_eq!(canvas.pixel(2, 2), 0xFF0A_141E);
        assert_eq!(canvas.pixel(3, 3), BACKGROUND);
    }

    #[test]
    fn test_blit_image_skips_transparent_pixels() {
        let mut canvas = Canvas::new(2, 2);
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 255, 255, 0]));
        canvas.blit_image(&img, &Rect::new(0.0, 0.0, 2.0, 2.0));

        assert_eq!(canvas.pixel(0, 0), BACKGROUND);
        assert_eq!(canvas.pixel(1, 0), 0xFFFF_FFFF);
    }

    #[test]
    fn test_blit_image_blends_partial_alpha() {
        let mut canvas = Canvas::new(1, 1);
        canvas.pixels[0] = 0xFF00_0000;
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128]));
        canvas.blit_image(&img, &Rect::new(0.0, 0.0, 1.0, 1.0));

        let px = canvas.pixel(0, 0);
        let r = (px >> 16) & 0xFF;
        assert!((127..=129).contains(&r), "r = {}", r);
    }

    #[test]
    fn test_blit_canvas_shifts_and_clips() {
        let mut src = Canvas::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                src.pixels[y * 3 + x] = 0xFF00_0000 | (y * 3 + x) as u32;
            }
        }

        let mut dst = Canvas::new(3, 3);
        dst.blit_canvas(&src, 1, 1);

        // shifted content
        assert_eq!(dst.pixel(1, 1), src.pixel(0, 0));
        assert_eq!(dst.pixel(2, 2), src.pixel(1, 1));
        // uncovered strip keeps its previous contents
        assert_eq!(dst.pixel(0, 0), BACKGROUND);

        let mut neg = Canvas::new(3, 3);
        neg.blit_canvas(&src, -1, -1);
        assert_eq!(neg.pixel(0, 0), src.pixel(1, 1));
        assert_eq!(neg.pixel(1, 1), src.pixel(2, 2));
    }

    #[test]
    fn test_clip_limits_image_blits_only() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_clip(&[Rect::new(0.0, 0.0, 2.0, 4.0)]);

        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        canvas.blit_image(&img, &Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(canvas.pixel(1, 1), 0xFFFF_0000);
        assert_eq!(canvas.pixel(2, 1), BACKGROUND);

        canvas.clear_clip();
        canvas.blit_image(&img, &Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(canvas.pixel(2, 1), 0xFFFF_0000);
    }

    #[test]
    fn test_blit_image_scales_up() {
        let mut canvas = Canvas::new(4, 4);
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
        img.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        canvas.blit_image(&img, &Rect::new(0.0, 0.0, 4.0, 4.0));

        assert_eq!(canvas.pixel(0, 0), 0xFF00_FF00);
        assert_eq!(canvas.pixel(3, 3), 0xFFFF_0000);
    }
}
