//! Tileset loading and slicing
//!
//! The atlas packs the top faces in a grid on the left half and the matching
//! half-width side faces on the right half: for tile index `i` at grid cell
//! (col, row), the y side strip sits at the same row offset past the grid and
//! the x side strip another half tile to its right. Shadow decals are two
//! 30x18 stamps, y on the left, x on the right.

use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};
use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Shadow decal size in source pixels.
pub const SHADOW_WIDTH: u32 = 30;
pub const SHADOW_HEIGHT: u32 = 18;

use crate::config::EngineConfig;

/// Sliced tile art: one top face and two side faces per surface type.
pub struct Tileset {
    tops: Vec<RgbaImage>,
    x_sides: Vec<RgbaImage>,
    y_sides: Vec<RgbaImage>,
    shadow_x: RgbaImage,
    shadow_y: RgbaImage,
    tile_width: u32,
    tile_height: u32,
}

impl Tileset {
    /// Load and slice an atlas from disk.
    pub fn load(path: &Path, config: &EngineConfig) -> Option<Self> {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(err) => {
                warn!("could not open tileset {}: {}", path.display(), err);
                return None;
            }
        };
        Some(Self::from_image(&img, config))
    }

    /// Slice an atlas image into per-type tiles.
    pub fn from_image(img: &DynamicImage, config: &EngineConfig) -> Self {
        let tw = config.tile_width as u32;
        let th = config.tile_height as u32;
        let per_row = config.tileset_items_per_row as u32;
        let grid_width = per_row * tw;

        let mut tops = Vec::with_capacity(config.type_count as usize);
        let mut x_sides = Vec::with_capacity(config.type_count as usize);
        let mut y_sides = Vec::with_capacity(config.type_count as usize);

        for idx in 0..config.type_count as u32 {
            let col = idx % per_row;
            let row = idx / per_row;
            let src_x = col * tw;
            let src_y = row * th;

            tops.push(img.crop_imm(src_x, src_y, tw, th).to_rgba8());
            y_sides.push(
                img.crop_imm(grid_width + src_x, src_y, tw / 2, th)
                    .to_rgba8(),
            );
            x_sides.push(
                img.crop_imm(grid_width + src_x + tw / 2, src_y, tw / 2, th)
                    .to_rgba8(),
            );
        }

        let (shadow_y, shadow_x) = shadow_decals();

        Self {
            tops,
            x_sides,
            y_sides,
            shadow_x,
            shadow_y,
            tile_width: tw,
            tile_height: th,
        }
    }

    /// Synthesize flat-colour tiles so the engine runs without art assets.
    pub fn procedural(config: &EngineConfig, seed: u64) -> Self {
        let tw = config.tile_width as u32;
        let th = config.tile_height as u32;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut tops = Vec::with_capacity(config.type_count as usize);
        let mut x_sides = Vec::with_capacity(config.type_count as usize);
        let mut y_sides = Vec::with_capacity(config.type_count as usize);

        for idx in 0..config.type_count {
            let [r, g, b] = PALETTE[idx as usize % PALETTE.len()];

            let mut top = RgbaImage::new(tw, th);
            for (x, y, px) in top.enumerate_pixels_mut() {
                if inside_diamond(x, y, tw, th) {
                    let n: u8 = rng.gen_range(0..16);
                    *px = Rgba([r.saturating_add(n), g.saturating_add(n), b.saturating_add(n), 255]);
                } else {
                    *px = Rgba([0, 0, 0, 0]);
                }
            }
            tops.push(top);

            x_sides.push(flat_side(tw / 2, th, [shade(r, 0.55), shade(g, 0.55), shade(b, 0.55)]));
            y_sides.push(flat_side(tw / 2, th, [shade(r, 0.75), shade(g, 0.75), shade(b, 0.75)]));
        }

        let (shadow_y, shadow_x) = shadow_decals();

        Self {
            tops,
            x_sides,
            y_sides,
            shadow_x,
            shadow_y,
            tile_width: tw,
            tile_height: th,
        }
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn top(&self, idx: u8) -> &RgbaImage {
        &self.tops[idx as usize]
    }

    pub fn x_side(&self, idx: u8) -> &RgbaImage {
        &self.x_sides[idx as usize]
    }

    pub fn y_side(&self, idx: u8) -> &RgbaImage {
        &self.y_sides[idx as usize]
    }

    pub fn shadow_x(&self) -> &RgbaImage {
        &self.shadow_x
    }

    pub fn shadow_y(&self) -> &RgbaImage {
        &self.shadow_y
    }
}

const PALETTE: [[u8; 3]; 8] = [
    [86, 125, 70],   // grass
    [110, 139, 61],  // scrub
    [140, 132, 87],  // dry field
    [156, 124, 76],  // dirt
    [136, 140, 141], // rock
    [196, 187, 158], // sand
    [224, 228, 234], // snow
    [52, 107, 160],  // water
];

fn shade(channel: u8, factor: f64) -> u8 {
    (channel as f64 * factor).round() as u8
}

fn flat_side(width: u32, height: u32, [r, g, b]: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]))
}

/// Inside the diamond footprint a top face occupies within its tile rect.
fn inside_diamond(x: u32, y: u32, width: u32, height: u32) -> bool {
    let hw = width as f64 / 2.0;
    let hh = height as f64 / 2.0;
    let dx = (x as f64 + 0.5 - hw) / hw;
    let dy = (y as f64 + 0.5 - hh) / hh;
    dx.abs() + dy.abs() <= 1.0
}

/// Two soft black stamps for the side-face drop shadows.
fn shadow_decals() -> (RgbaImage, RgbaImage) {
    let mut shadow_y = RgbaImage::new(SHADOW_WIDTH, SHADOW_HEIGHT);
    let mut shadow_x = RgbaImage::new(SHADOW_WIDTH, SHADOW_HEIGHT);
    for (x, _, px) in shadow_y.enumerate_pixels_mut() {
        // fade out towards the far edge of the stamp
        let alpha = 90 - (x * 60 / SHADOW_WIDTH) as u8;
        *px = Rgba([0, 0, 0, alpha]);
    }
    for (x, _, px) in shadow_x.enumerate_pixels_mut() {
        let alpha = 30 + (x * 60 / SHADOW_WIDTH) as u8;
        *px = Rgba([0, 0, 0, alpha]);
    }
    (shadow_y, shadow_x)
}
