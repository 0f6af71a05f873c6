//! Engine configuration
//!
//! One explicit parameter struct threaded through generation, streaming and
//! rendering. Defaults mirror the classic setup: 8x8x16 chunks, a 129-edge
//! fractal field, 8 surface types in a 3-column tileset of 50x33 tiles.

use thiserror::Error;

/// Validation failures for [`EngineConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("field size must be 2^k + 1, got {0}")]
    FieldSize(usize),

    #[error("roughness must lie in [0, 1], got {0}")]
    Roughness(f64),

    #[error("chunk dimensions must be nonzero")]
    EmptyBoard,

    #[error("tile pixel dimensions must be nonzero")]
    EmptyTile,

    #[error("surface type count must be at least 1")]
    NoSurfaceTypes,

    #[error("field resolution divisor must be nonzero")]
    ZeroResolution,

    #[error("shallow depth threshold {threshold} outside 1..={depth}")]
    ShallowThreshold { threshold: usize, depth: usize },

    #[error("zoom range [{min}, {max}] is invalid")]
    ZoomRange { min: f64, max: f64 },

    #[error("projection axes {dx:?} and {dy:?} are colinear")]
    ColinearAxes { dx: (f64, f64), dy: (f64, f64) },
}

/// All generation and projection parameters.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Cells per chunk along the X axis.
    pub board_width: usize,
    /// Cells per chunk along the Y axis.
    pub board_height: usize,
    /// Depth layers per chunk (the Z axis, bottom to top).
    pub board_depth: usize,

    /// Edge length of a fractal field chunk; must be `2^k + 1`.
    pub field_size: usize,
    /// Roughness of the height field, in [0, 1].
    pub height_roughness: f64,
    /// Roughness of the biome field, in [0, 1].
    pub biome_roughness: f64,
    /// World cells per height-field sample.
    pub height_resolution: i64,
    /// World cells per biome-field sample.
    pub biome_resolution: i64,

    /// Columns with fewer occupied layers than this become liquid; the single
    /// liquid cell sits at layer `shallow_threshold - 1`.
    pub shallow_threshold: usize,
    /// Surface type used for liquid cells.
    pub liquid_type: u8,

    /// Number of surface types in the tileset.
    pub type_count: u8,
    /// Top-tile columns per tileset row.
    pub tileset_items_per_row: u32,
    /// Tile pixel width.
    pub tile_width: u32,
    /// Tile pixel height.
    pub tile_height: u32,

    /// World pixel offset when advancing one cell on the X axis.
    pub delta_x: (f64, f64),
    /// World pixel offset when advancing one cell on the Y axis.
    pub delta_y: (f64, f64),
    /// World pixel offset when advancing one layer on the Z axis.
    pub delta_z: (f64, f64),

    /// Zoom clamp range.
    pub zoom_min: f64,
    pub zoom_max: f64,

    /// Autoscroll speed in world pixels per tick.
    pub scroll_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_width: 8,
            board_height: 8,
            board_depth: 16,
            field_size: 129,
            height_roughness: 0.5,
            biome_roughness: 0.5,
            height_resolution: 1,
            biome_resolution: 1,
            shallow_threshold: 4,
            liquid_type: 7,
            type_count: 8,
            tileset_items_per_row: 3,
            tile_width: 50,
            tile_height: 33,
            delta_x: (25.0, 12.0),
            delta_y: (-25.0, 12.0),
            delta_z: (0.0, -8.0),
            zoom_min: 0.1,
            zoom_max: 4.0,
            scroll_speed: 5.0,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the generators and renderer cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_width == 0 || self.board_height == 0 || self.board_depth == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if !is_pow2_plus_1(self.field_size) {
            return Err(ConfigError::FieldSize(self.field_size));
        }
        for r in [self.height_roughness, self.biome_roughness] {
            if !(0.0..=1.0).contains(&r) {
                return Err(ConfigError::Roughness(r));
            }
        }
        if self.height_resolution == 0 || self.biome_resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if self.shallow_threshold == 0 || self.shallow_threshold > self.board_depth {
            return Err(ConfigError::ShallowThreshold {
                threshold: self.shallow_threshold,
                depth: self.board_depth,
            });
        }
        if self.type_count == 0 {
            return Err(ConfigError::NoSurfaceTypes);
        }
        if self.tile_width == 0 || self.tile_height == 0 || self.tileset_items_per_row == 0 {
            return Err(ConfigError::EmptyTile);
        }
        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            return Err(ConfigError::ZoomRange {
                min: self.zoom_min,
                max: self.zoom_max,
            });
        }
        // the ground axes must span the plane or chunk footprints collapse
        // and screen positions cannot be mapped back to cells
        let det = self.delta_x.0 * self.delta_y.1 - self.delta_y.0 * self.delta_x.1;
        if det.abs() < f64::EPSILON {
            return Err(ConfigError::ColinearAxes {
                dx: self.delta_x,
                dy: self.delta_y,
            });
        }
        Ok(())
    }

    /// Depth layer holding the single liquid cell of a shallow column.
    pub fn liquid_layer(&self) -> usize {
        self.shallow_threshold - 1
    }
}

fn is_pow2_plus_1(size: usize) -> bool {
    size >= 3 && (size - 1).is_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_field_size_must_be_pow2_plus_1() {
        for good in [3, 5, 9, 17, 33, 65, 129, 257] {
            let cfg = EngineConfig { field_size: good, ..Default::default() };
            assert_eq!(cfg.validate(), Ok(()), "size {}", good);
        }
        for bad in [0, 1, 2, 4, 6, 128, 130] {
            let cfg = EngineConfig { field_size: bad, ..Default::default() };
            assert_eq!(cfg.validate(), Err(ConfigError::FieldSize(bad)));
        }
    }

    #[test]
    fn test_roughness_range_is_enforced() {
        let cfg = EngineConfig { biome_roughness: 1.5, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::Roughness(1.5)));

        let cfg = EngineConfig { height_roughness: -0.1, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::Roughness(-0.1)));
    }

    #[test]
    fn test_zoom_range_is_enforced() {
        let cfg = EngineConfig { zoom_min: 0.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZoomRange { .. })));

        let cfg = EngineConfig { zoom_min: 2.0, zoom_max: 1.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZoomRange { .. })));
    }

    #[test]
    fn test_colinear_projection_axes_are_rejected() {
        // parallel to the default delta_x
        let cfg = EngineConfig { delta_y: (50.0, 24.0), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ColinearAxes { .. })));

        let cfg = EngineConfig { delta_x: (0.0, 0.0), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ColinearAxes { .. })));
    }

    #[test]
    fn test_shallow_threshold_bounds() {
        let cfg = EngineConfig { shallow_threshold: 17, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ShallowThreshold { threshold: 17, depth: 16 })
        ));
        assert_eq!(EngineConfig::default().liquid_layer(), 3);
    }
}
