//! Frame rendering
//!
//! Paints the resident world into a [`Canvas`] back-to-front: depth layers
//! from the bottom up, chunks in residency order, cells row-major within a
//! chunk. Two paths share the same painter, so their output is identical for
//! a given world state: a full repaint, and an incremental repaint that
//! shifts the previous frame by the panned pixel distance and repaints only
//! the strips of newly exposed screen.

use std::time::Instant;

use image::RgbaImage;

use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::geometry::Rect;
use crate::stats::FrameStats;
use crate::tileset::{Tileset, SHADOW_HEIGHT, SHADOW_WIDTH};
use crate::transition::{BlendDirection, TransitionCache};
use crate::view::{Projection, Viewport};
use crate::visibility::FaceInfo;
use crate::world::World;

/// Shadow decals overhang the tile rect by a few world pixels; culling
/// probes grow by this much so strip repaints never miss a decal.
const SHADOW_MARGIN: f64 = 5.0;

/// Everything the painter reads for one frame.
pub struct Scene<'a> {
    pub world: &'a World,
    pub viewport: &'a Viewport,
    pub projection: &'a Projection,
    pub tileset: &'a Tileset,
    pub config: &'a EngineConfig,
    /// Draw blended top tiles across surface-type edges.
    pub blend: bool,
}

/// Double-buffered painter with an incremental repaint path.
pub struct Renderer {
    canvas: Canvas,
    buffer: Canvas,
    /// Pixel offset of the previous frame's viewport, in the units
    /// [`Viewport::pixel_offset`] reports.
    prev_offset: Option<(i64, i64)>,
    prev_zoom: f64,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            buffer: Canvas::new(width, height),
            prev_offset: None,
            prev_zoom: 1.0,
        }
    }

    /// The presented frame.
    pub fn frame(&self) -> &[u32] {
        self.canvas.data()
    }

    pub fn width(&self) -> usize {
        self.canvas.width()
    }

    pub fn height(&self) -> usize {
        self.canvas.height()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.canvas.resize(width, height);
        self.buffer.resize(width, height);
        self.prev_offset = None;
    }

    /// Forget the previous frame; the next incremental draw repaints fully.
    pub fn invalidate(&mut self) {
        self.prev_offset = None;
    }

    /// Repaint the whole frame from scratch.
    pub fn draw_full(
        &mut self,
        scene: &Scene,
        transitions: &mut TransitionCache,
        stats: &mut FrameStats,
    ) {
        let start = Instant::now();
        self.canvas.clear();
        draw_scene(&mut self.canvas, scene, transitions, stats, None);
        self.remember(scene);
        stats.draw_ms = start.elapsed().as_secs_f64() * 1000.0;
    }

    /// Repaint by reusing the previous frame: shift it by the panned pixel
    /// distance and repaint only the newly exposed strips. Falls back to a
    /// full repaint when there is no previous frame, the zoom changed, or
    /// the pan exceeds the screen.
    pub fn draw_incremental(
        &mut self,
        scene: &Scene,
        transitions: &mut TransitionCache,
        stats: &mut FrameStats,
    ) {
        let zoom = scene.viewport.zoom();
        let prev = match self.prev_offset {
            Some(prev) if self.prev_zoom == zoom => prev,
            _ => return self.draw_full(scene, transitions, stats),
        };

        // pixel offsets are whole pixels, so the shift is exact and every
        // carried pixel lands where a full repaint would put it
        let (px, py) = scene.viewport.pixel_offset();
        let dx_px = px as i64 - prev.0;
        let dy_px = py as i64 - prev.1;
        let (w, h) = (self.canvas.width() as i64, self.canvas.height() as i64);

        if dx_px.abs() >= w || dy_px.abs() >= h {
            return self.draw_full(scene, transitions, stats);
        }

        let start = Instant::now();
        if dx_px == 0 && dy_px == 0 {
            self.remember(scene);
            stats.draw_ms = start.elapsed().as_secs_f64() * 1000.0;
            return;
        }

        let mut strips: Vec<Rect> = Vec::new();
        if dx_px > 0 {
            strips.push(Rect::new(0.0, 0.0, dx_px as f64, h as f64));
        } else if dx_px < 0 {
            strips.push(Rect::new((w + dx_px) as f64, 0.0, -dx_px as f64, h as f64));
        }
        if dy_px > 0 {
            strips.push(Rect::new(0.0, 0.0, w as f64, dy_px as f64));
        } else if dy_px < 0 {
            strips.push(Rect::new(0.0, (h + dy_px) as f64, w as f64, -dy_px as f64));
        }

        // shifted previous frame covers everything outside the strips
        self.buffer.blit_canvas(&self.canvas, dx_px, dy_px);
        for strip in &strips {
            self.buffer.clear_rect(strip);
        }

        // one z-ordered pass over both strips; clipping keeps a tile that
        // pokes out of a strip from overpainting settled pixels
        let regions: Vec<Rect> = strips.iter().map(|s| scene.viewport.to_world(s)).collect();
        self.buffer.set_clip(&strips);
        draw_scene(&mut self.buffer, scene, transitions, stats, Some(&regions));
        self.buffer.clear_clip();

        self.canvas.copy_from(&self.buffer);
        self.remember(scene);
        stats.draw_ms = start.elapsed().as_secs_f64() * 1000.0;
    }

    fn remember(&mut self, scene: &Scene) {
        let (px, py) = scene.viewport.pixel_offset();
        self.prev_offset = Some((px as i64, py as i64));
        self.prev_zoom = scene.viewport.zoom();
    }
}

/// Paint the scene into `target`, optionally restricted to a set of
/// world-space regions. Painter order is fixed: z bottom-up, chunks in
/// residency order, rows then columns within a chunk.
fn draw_scene(
    target: &mut Canvas,
    scene: &Scene,
    transitions: &mut TransitionCache,
    stats: &mut FrameStats,
    regions: Option<&[Rect]>,
) {
    let view_bounds = scene.viewport.world_bounds();
    let depth = scene.config.board_depth;
    // margin covers the shadow overhang plus up to one screen pixel of
    // rasterization slop, expressed in world units
    let margin = SHADOW_MARGIN + 1.0 / scene.viewport.zoom();

    for z in 0..depth {
        for chunk in scene.world.iter() {
            let probe = inflate(&chunk.actual_bounds, margin);
            if !probe.intersects(&view_bounds) {
                continue;
            }
            if let Some(regions) = regions {
                if !regions.iter().any(|r| probe.intersects(r)) {
                    continue;
                }
            }
            if z == 0 {
                stats.chunks_visible += 1;
            }

            let (ox, oy) = chunk.origin();
            for y in 0..chunk.height() {
                for x in 0..chunk.width() {
                    let cell = match chunk.cell(x, y, z) {
                        Some(cell) => cell,
                        None => continue,
                    };
                    let info = chunk.faces[chunk.index(x, y, z)];
                    if !info.any_exposed() {
                        continue;
                    }

                    let tile_rect = scene.projection.cell_world_rect(
                        ox + x as i64,
                        oy + y as i64,
                        z as i64,
                    );
                    let tile_probe = inflate(&tile_rect, margin);
                    if !tile_probe.intersects(&view_bounds) {
                        continue;
                    }
                    if let Some(regions) = regions {
                        if !regions.iter().any(|r| tile_probe.intersects(r)) {
                            continue;
                        }
                    }

                    stats.tiles_drawn += 1;
                    draw_tile(target, scene, transitions, cell, info, &tile_rect);
                }
            }
        }
    }
}

/// Paint one cell: top face, then the +x side with its shadow, then the +y
/// side with its shadow.
fn draw_tile(
    target: &mut Canvas,
    scene: &Scene,
    transitions: &mut TransitionCache,
    cell: u8,
    info: FaceInfo,
    tile_rect: &Rect,
) {
    let view = scene.viewport.to_view(tile_rect);
    let zoom = scene.viewport.zoom();
    let half = view.width / 2.0;

    if info.top {
        let img = top_image(scene, transitions, cell, info);
        target.blit_image(img, &view);
    }

    if info.x_side {
        let dst = Rect::new(view.left + half, view.top, half, view.height);
        target.blit_image(scene.tileset.x_side(cell), &dst);
        if info.x_shadow {
            let dst = Rect::new(
                view.left + half - 5.0 * zoom,
                view.top + view.height / 2.0 + 3.0 * zoom,
                SHADOW_WIDTH as f64 * zoom,
                SHADOW_HEIGHT as f64 * zoom,
            );
            target.blit_image(scene.tileset.shadow_x(), &dst);
        }
    }

    if info.y_side {
        let dst = Rect::new(view.left, view.top, half, view.height);
        target.blit_image(scene.tileset.y_side(cell), &dst);
        if info.y_shadow {
            let dst = Rect::new(
                view.left - 5.0 * zoom,
                view.top + view.height / 2.0 + 3.0 * zoom,
                SHADOW_WIDTH as f64 * zoom,
                SHADOW_HEIGHT as f64 * zoom,
            );
            target.blit_image(scene.tileset.shadow_y(), &dst);
        }
    }
}

/// The plain top tile, or a cached blend towards a differing neighbour when
/// blending is on. The +x neighbour wins over +y when both differ.
fn top_image<'a>(
    scene: &'a Scene,
    transitions: &'a mut TransitionCache,
    cell: u8,
    info: FaceInfo,
) -> &'a RgbaImage {
    if scene.blend {
        if let Some(to) = info.x_value.filter(|v| *v != cell) {
            return transitions.get(scene.tileset, BlendDirection::AlongX, cell, to);
        }
        if let Some(to) = info.y_value.filter(|v| *v != cell) {
            return transitions.get(scene.tileset, BlendDirection::AlongY, cell, to);
        }
    }
    scene.tileset.top(cell)
}

fn inflate(rect: &Rect, margin: f64) -> Rect {
    Rect::new(
        rect.left - margin,
        rect.top - margin,
        rect.width + 2.0 * margin,
        rect.height + 2.0 * margin,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::snap_delta;

    fn config() -> EngineConfig {
        EngineConfig {
            board_width: 4,
            board_height: 4,
            board_depth: 8,
            shallow_threshold: 3,
            ..Default::default()
        }
    }

    /// Varied heights and surface types to exercise sides, shadows, liquid
    /// columns and blended edges.
    fn sampler(x: i64, y: i64) -> (f64, f64) {
        let height = ((x * 31 + y * 17).rem_euclid(9)) as f64 / 8.0;
        let biome = ((x + 2 * y).rem_euclid(5)) as f64 / 4.0;
        (height, biome)
    }

    struct Fixture {
        config: EngineConfig,
        projection: Projection,
        world: World,
        tileset: Tileset,
        viewport: Viewport,
    }

    fn fixture(screen: (usize, usize)) -> Fixture {
        let config = config();
        let projection = Projection::new(&config);
        let tileset = Tileset::procedural(&config, 5);
        let viewport = Viewport::new(&config, screen.0, screen.1);

        let mut world = World::new();
        let mut stats = FrameStats::default();
        let mut sample = sampler;
        world.sync_to_viewport(
            &inflate(&viewport.world_bounds(), 400.0),
            &config,
            &projection,
            &mut sample,
            &mut stats,
        );

        Fixture {
            config,
            projection,
            world,
            tileset,
            viewport,
        }
    }

    fn scene<'a>(fx: &'a Fixture, blend: bool) -> Scene<'a> {
        Scene {
            world: &fx.world,
            viewport: &fx.viewport,
            projection: &fx.projection,
            tileset: &fx.tileset,
            config: &fx.config,
            blend,
        }
    }

    #[test]
    fn test_full_draw_touches_the_frame() {
        let fx = fixture((160, 120));
        let mut renderer = Renderer::new(160, 120);
        let mut transitions = TransitionCache::new(1);
        let mut stats = FrameStats::default();

        renderer.draw_full(&scene(&fx, false), &mut transitions, &mut stats);
        assert!(stats.tiles_drawn > 0);
        assert!(stats.chunks_visible > 0);
        assert!(
            renderer.frame().iter().any(|px| *px != crate::canvas::BACKGROUND),
            "frame stayed blank"
        );
    }

    #[test]
    fn test_full_draw_is_deterministic() {
        let fx = fixture((160, 120));
        let mut transitions = TransitionCache::new(1);

        let mut a = Renderer::new(160, 120);
        let mut stats = FrameStats::default();
        a.draw_full(&scene(&fx, true), &mut transitions, &mut stats);

        let mut b = Renderer::new(160, 120);
        let mut stats = FrameStats::default();
        b.draw_full(&scene(&fx, true), &mut transitions, &mut stats);

        assert_eq!(a.frame(), b.frame());
    }

    #[test]
    fn test_incremental_matches_full_over_a_pan_sequence() {
        for blend in [false, true] {
            let mut fx = fixture((160, 120));
            let mut transitions = TransitionCache::new(1);
            let mut stats = FrameStats::default();

            let mut incremental = Renderer::new(160, 120);
            incremental.draw_full(&scene(&fx, blend), &mut transitions, &mut stats);

            for (dx, dy) in [(3.0, 0.0), (0.0, -2.0), (5.0, 4.0), (-7.0, 1.0), (-1.0, -6.0)] {
                fx.viewport.pan(dx, dy);

                incremental.draw_incremental(&scene(&fx, blend), &mut transitions, &mut stats);

                let mut full = Renderer::new(160, 120);
                full.draw_full(&scene(&fx, blend), &mut transitions, &mut stats);

                assert_eq!(
                    incremental.frame(),
                    full.frame(),
                    "pan ({}, {}) blend {}",
                    dx,
                    dy,
                    blend
                );
            }
        }
    }

    /// At zoom 0.3 a snapped delta times the zoom lands ulps off an
    /// integer; the shifted previous frame must still match a fresh full
    /// repaint pixel for pixel.
    #[test]
    fn test_incremental_matches_full_at_fractional_zoom() {
        for blend in [false, true] {
            let mut fx = fixture((160, 120));
            fx.viewport.set_zoom(0.3);
            let mut transitions = TransitionCache::new(1);
            let mut stats = FrameStats::default();

            let mut incremental = Renderer::new(160, 120);
            incremental.draw_full(&scene(&fx, blend), &mut transitions, &mut stats);

            for (dx, dy) in [(0.0, -4.0), (7.0, 0.0), (-13.0, 2.0), (3.0, 3.0)] {
                fx.viewport.pan(snap_delta(dx, 0.3), snap_delta(dy, 0.3));

                incremental.draw_incremental(&scene(&fx, blend), &mut transitions, &mut stats);

                let mut full = Renderer::new(160, 120);
                full.draw_full(&scene(&fx, blend), &mut transitions, &mut stats);

                assert_eq!(
                    incremental.frame(),
                    full.frame(),
                    "pan ({}, {}) blend {}",
                    dx,
                    dy,
                    blend
                );
            }
        }
    }

    #[test]
    fn test_incremental_with_no_motion_keeps_the_frame() {
        let fx = fixture((160, 120));
        let mut transitions = TransitionCache::new(1);
        let mut stats = FrameStats::default();

        let mut renderer = Renderer::new(160, 120);
        renderer.draw_full(&scene(&fx, false), &mut transitions, &mut stats);
        let before = renderer.frame().to_vec();

        stats.reset();
        renderer.draw_incremental(&scene(&fx, false), &mut transitions, &mut stats);
        assert_eq!(renderer.frame(), before.as_slice());
        assert_eq!(stats.tiles_drawn, 0);
    }

    #[test]
    fn test_zoom_change_falls_back_to_full() {
        let mut fx = fixture((160, 120));
        let mut transitions = TransitionCache::new(1);
        let mut stats = FrameStats::default();

        let mut renderer = Renderer::new(160, 120);
        renderer.draw_full(&scene(&fx, false), &mut transitions, &mut stats);

        fx.viewport.set_zoom(2.0);
        renderer.draw_incremental(&scene(&fx, false), &mut transitions, &mut stats);

        let mut full = Renderer::new(160, 120);
        full.draw_full(&scene(&fx, false), &mut transitions, &mut stats);
        assert_eq!(renderer.frame(), full.frame());
    }

    #[test]
    fn test_first_incremental_paints_fully() {
        let fx = fixture((160, 120));
        let mut transitions = TransitionCache::new(1);
        let mut stats = FrameStats::default();

        let mut renderer = Renderer::new(160, 120);
        renderer.draw_incremental(&scene(&fx, false), &mut transitions, &mut stats);

        let mut full = Renderer::new(160, 120);
        full.draw_full(&scene(&fx, false), &mut transitions, &mut stats);
        assert_eq!(renderer.frame(), full.frame());
    }
}
