//! Viewport transform and isometric cell projection
//!
//! The viewport is the only place pan offset and zoom live; every streaming
//! and culling decision for a tick is made against the world-space bounds it
//! reports. Transforms return new rectangles and never mutate their input.

use crate::config::EngineConfig;
use crate::geometry::Rect;

/// Pan offset, zoom factor and screen size for one tick.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Pan offset in world pixels (unbounded).
    pub offset: (f64, f64),
    zoom: f64,
    zoom_min: f64,
    zoom_max: f64,
    pub screen_width: usize,
    pub screen_height: usize,
}

impl Viewport {
    pub fn new(config: &EngineConfig, screen_width: usize, screen_height: usize) -> Self {
        Self {
            offset: (0.0, 0.0),
            zoom: 1.0,
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
            screen_width,
            screen_height,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to the configured range. Clamping is the
    /// setter's invariant, not the input layer's: any caller gets a legal
    /// zoom back.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
        self.zoom
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset.0 += dx;
        self.offset.1 += dy;
    }

    /// The pan translation in whole screen pixels. Tile geometry scales
    /// first and translates by this, so two offsets whose pixel offsets
    /// differ by (n, m) produce screens shifted by exactly (n, m) pixels,
    /// at any zoom.
    pub fn pixel_offset(&self) -> (f64, f64) {
        ((self.offset.0 * self.zoom).round(), (self.offset.1 * self.zoom).round())
    }

    /// World rectangle -> screen rectangle.
    pub fn to_view(&self, rect: &Rect) -> Rect {
        let (px, py) = self.pixel_offset();
        rect.scaled(self.zoom).translated(px, py)
    }

    /// Screen rectangle -> world rectangle (inverse of [`Viewport::to_view`]).
    pub fn to_world(&self, rect: &Rect) -> Rect {
        let (px, py) = self.pixel_offset();
        rect.translated(-px, -py).scaled(1.0 / self.zoom)
    }

    /// The full screen expressed in world coordinates.
    pub fn world_bounds(&self) -> Rect {
        let screen = Rect::new(0.0, 0.0, self.screen_width as f64, self.screen_height as f64);
        self.to_world(&screen)
    }
}

/// Round a world-space pan delta outward so `delta * zoom` lands on a whole
/// pixel. Off-pixel frame shifts both blur and slow down the blit path.
pub fn snap_delta(delta: f64, zoom: f64) -> f64 {
    let snapped = (delta.abs() * zoom).ceil() / zoom;
    if delta < 0.0 {
        -snapped
    } else {
        snapped
    }
}

/// Fixed per-axis pixel deltas mapping integer cell coordinates to world
/// pixel rectangles. This is the exact isometric projection: advancing one
/// cell along an axis moves the tile origin by that axis' delta vector.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    delta_x: (f64, f64),
    delta_y: (f64, f64),
    delta_z: (f64, f64),
    tile_width: f64,
    tile_height: f64,
}

impl Projection {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            delta_x: config.delta_x,
            delta_y: config.delta_y,
            delta_z: config.delta_z,
            tile_width: config.tile_width as f64,
            tile_height: config.tile_height as f64,
        }
    }

    /// World pixel rectangle of the cell at integer coordinates (x, y, z).
    pub fn cell_world_rect(&self, x: i64, y: i64, z: i64) -> Rect {
        let (x, y, z) = (x as f64, y as f64, z as f64);
        let left = x * self.delta_x.0 + y * self.delta_y.0 + z * self.delta_z.0;
        let top = x * self.delta_x.1 + y * self.delta_y.1 + z * self.delta_z.1;
        Rect::new(left, top, self.tile_width, self.tile_height)
    }
}
