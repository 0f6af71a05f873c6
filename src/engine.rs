//! Engine facade
//!
//! Owns the whole pipeline and runs it once per tick: apply viewport input,
//! sync chunk residency to the visible world bounds, then repaint through
//! the incremental path unless it has been switched off.

use log::info;

use crate::config::{ConfigError, EngineConfig};
use crate::render::{Renderer, Scene};
use crate::stats::FrameStats;
use crate::terrain::Terrain;
use crate::tileset::Tileset;
use crate::transition::TransitionCache;
use crate::view::{snap_delta, Projection, Viewport};
use crate::world::World;

pub struct Engine {
    config: EngineConfig,
    projection: Projection,
    viewport: Viewport,
    terrain: Terrain,
    world: World,
    tileset: Tileset,
    transitions: TransitionCache,
    renderer: Renderer,
    stats: FrameStats,
    blend: bool,
    incremental: bool,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        tileset: Tileset,
        seed: u64,
        screen_width: usize,
        screen_height: usize,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let terrain = Terrain::new(&config, seed)?;
        info!(
            "engine up: seed {}, {}x{} screen, {}x{}x{} chunks",
            seed,
            screen_width,
            screen_height,
            config.board_width,
            config.board_height,
            config.board_depth
        );

        Ok(Self {
            projection: Projection::new(&config),
            viewport: Viewport::new(&config, screen_width, screen_height),
            terrain,
            world: World::new(),
            tileset,
            transitions: TransitionCache::new(seed),
            renderer: Renderer::new(screen_width, screen_height),
            stats: FrameStats::default(),
            blend: true,
            incremental: true,
            config,
        })
    }

    /// Pan by a world-space delta, snapped so the frame shift lands on
    /// whole pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let zoom = self.viewport.zoom();
        self.viewport
            .pan(snap_delta(dx, zoom), snap_delta(dy, zoom));
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    /// Returns the zoom actually applied after clamping.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.viewport.set_zoom(zoom)
    }

    pub fn blend(&self) -> bool {
        self.blend
    }

    pub fn set_blend(&mut self, blend: bool) {
        if self.blend != blend {
            self.blend = blend;
            self.renderer.invalidate();
        }
    }

    pub fn incremental(&self) -> bool {
        self.incremental
    }

    pub fn set_incremental(&mut self, incremental: bool) {
        self.incremental = incremental;
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport.screen_width = width;
        self.viewport.screen_height = height;
        self.renderer.resize(width, height);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn resident_chunks(&self) -> usize {
        self.world.len()
    }

    /// The presented frame, valid after [`Engine::tick`].
    pub fn frame(&self) -> &[u32] {
        self.renderer.frame()
    }

    /// Run one frame: stream chunks for the current viewport, then repaint.
    pub fn tick(&mut self) {
        self.stats.reset();

        let bounds = self.viewport.world_bounds();
        let terrain = &mut self.terrain;
        let mut sample = |x, y| terrain.sample(x, y);
        self.world.sync_to_viewport(
            &bounds,
            &self.config,
            &self.projection,
            &mut sample,
            &mut self.stats,
        );

        let scene = Scene {
            world: &self.world,
            viewport: &self.viewport,
            projection: &self.projection,
            tileset: &self.tileset,
            config: &self.config,
            blend: self.blend,
        };
        if self.incremental {
            self.renderer
                .draw_incremental(&scene, &mut self.transitions, &mut self.stats);
        } else {
            self.renderer
                .draw_full(&scene, &mut self.transitions, &mut self.stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BACKGROUND;

    fn engine() -> Engine {
        let config = EngineConfig {
            board_width: 4,
            board_height: 4,
            board_depth: 8,
            field_size: 9,
            ..Default::default()
        };
        let tileset = Tileset::procedural(&config, 3);
        Engine::new(config, tileset, 1234, 160, 120).unwrap()
    }

    #[test]
    fn test_first_tick_streams_and_paints() {
        let mut eng = engine();
        eng.tick();

        assert!(eng.resident_chunks() > 0);
        assert!(eng.stats().chunks_loaded > 0);
        assert!(eng.stats().tiles_drawn > 0);
        assert!(eng.frame().iter().any(|px| *px != BACKGROUND));
    }

    #[test]
    fn test_pan_snaps_to_whole_frame_pixels() {
        let mut eng = engine();
        eng.set_zoom(0.3);
        eng.pan(5.0, -7.3);

        let zoom = eng.zoom();
        let (ox, oy) = eng.viewport.offset;
        for value in [ox * zoom, oy * zoom] {
            assert!((value - value.round()).abs() < 1e-9, "offset {}", value);
        }
    }

    #[test]
    fn test_panning_streams_new_chunks() {
        let mut eng = engine();
        eng.tick();
        let loaded = eng.stats().chunks_loaded;
        assert!(loaded > 0);

        // far enough to leave every previously loaded chunk behind
        eng.pan(50_000.0, 0.0);
        eng.tick();
        assert!(eng.stats().chunks_removed > 0);
        assert!(eng.stats().chunks_loaded > 0);
        assert!(eng.resident_chunks() > 0);
    }

    #[test]
    fn test_repeated_ticks_are_stable() {
        let mut eng = engine();
        eng.tick();
        let frame = eng.frame().to_vec();

        eng.tick();
        assert_eq!(eng.stats().chunks_loaded, 0);
        assert_eq!(eng.frame(), frame.as_slice());
    }

    #[test]
    fn test_resize_repaints_at_new_size() {
        let mut eng = engine();
        eng.tick();
        eng.resize(200, 80);
        eng.tick();
        assert_eq!(eng.frame().len(), 200 * 80);
        assert!(eng.frame().iter().any(|px| *px != BACKGROUND));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            field_size: 10,
            ..Default::default()
        };
        let tileset = Tileset::procedural(&config, 3);
        assert!(Engine::new(config, tileset, 1, 100, 100).is_err());
    }
}
