//! World chunks
//!
//! A chunk is a fixed-size 3-D block of cells, the unit of streaming. Cells
//! are immutable after population; the parallel face records are re-derived
//! by the visibility pass. Each chunk caches a loose bound (full depth range)
//! and a tight bound (realized min/max occupied layer) in world pixel space.

use crate::config::EngineConfig;
use crate::geometry::{bounding_box, Rect};
use crate::view::Projection;
use crate::visibility::FaceInfo;

/// World-chunk coordinate.
pub type ChunkCoord = (i64, i64);

pub struct Chunk {
    pub coord: ChunkCoord,
    width: usize,
    height: usize,
    depth: usize,
    /// Dense cell array indexed [z][y][x]; `None` is empty space.
    cells: Vec<Option<u8>>,
    /// Face records, same shape as `cells`.
    pub faces: Vec<FaceInfo>,
    /// Bound over the full depth range, used for residency decisions.
    pub bounds: Rect,
    /// Bound over the realized occupied depth range, used for draw culling.
    pub actual_bounds: Rect,
}

impl Chunk {
    /// Populate a chunk from terrain samples. `sample` maps a world cell
    /// column to its (height, biome) scalars in [0, 1]. Columns whose
    /// realized height falls below the shallow threshold collapse to a single
    /// liquid cell at the liquid layer; everything else is a solid column of
    /// the biome's surface type.
    pub fn populate(
        coord: ChunkCoord,
        config: &EngineConfig,
        projection: &Projection,
        sample: &mut dyn FnMut(i64, i64) -> (f64, f64),
    ) -> Self {
        let (w, h, d) = (config.board_width, config.board_height, config.board_depth);
        let mut cells: Vec<Option<u8>> = vec![None; w * h * d];

        let origin_x = coord.0 * w as i64;
        let origin_y = coord.1 * h as i64;
        let max_type = (config.type_count - 1) as f64;

        let mut min_layer = d - 1;
        let mut max_layer = 0;

        for j in 0..h {
            for i in 0..w {
                let (height_val, biome_val) = sample(origin_x + i as i64, origin_y + j as i64);

                let column_height = (1.0 + height_val * (d - 1) as f64).floor() as usize;
                let surface = config.type_count - 1 - (biome_val * max_type).floor() as u8;

                if column_height < config.shallow_threshold {
                    let layer = config.liquid_layer();
                    cells[index_for(w, h, i, j, layer)] = Some(config.liquid_type);
                    min_layer = min_layer.min(layer);
                    max_layer = max_layer.max(layer);
                } else {
                    let top = column_height.min(d);
                    for k in 0..top {
                        cells[index_for(w, h, i, j, k)] = Some(surface);
                    }
                    min_layer = 0;
                    max_layer = max_layer.max(top - 1);
                }
            }
        }

        let bounds = chunk_bounds(coord, config, projection, 0, d - 1);
        let actual_bounds = chunk_bounds(coord, config, projection, min_layer, max_layer);

        Self {
            coord,
            width: w,
            height: h,
            depth: d,
            faces: vec![FaceInfo::default(); w * h * d],
            cells,
            bounds,
            actual_bounds,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Flat index of local coordinates.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        index_for(self.width, self.height, x, y, z)
    }

    /// Cell at local coordinates; `None` is empty space.
    pub fn cell(&self, x: usize, y: usize, z: usize) -> Option<u8> {
        self.cells[self.index(x, y, z)]
    }

    /// World cell coordinates of this chunk's (0, 0) column.
    pub fn origin(&self) -> (i64, i64) {
        (
            self.coord.0 * self.width as i64,
            self.coord.1 * self.height as i64,
        )
    }
}

fn index_for(width: usize, height: usize, x: usize, y: usize, z: usize) -> usize {
    (z * height + y) * width + x
}

/// World pixel bound of a chunk between two depth layers: the bounding box of
/// its eight projected corner cells.
pub fn chunk_bounds(
    coord: ChunkCoord,
    config: &EngineConfig,
    projection: &Projection,
    min_layer: usize,
    max_layer: usize,
) -> Rect {
    let left = coord.0 * config.board_width as i64;
    let top = coord.1 * config.board_height as i64;
    let right = left + config.board_width as i64 - 1;
    let bottom = top + config.board_height as i64 - 1;
    let (lo, hi) = (min_layer as i64, max_layer as i64);

    bounding_box(&[
        projection.cell_world_rect(left, top, lo),
        projection.cell_world_rect(right, top, lo),
        projection.cell_world_rect(left, bottom, lo),
        projection.cell_world_rect(right, bottom, lo),
        projection.cell_world_rect(left, top, hi),
        projection.cell_world_rect(right, top, hi),
        projection.cell_world_rect(left, bottom, hi),
        projection.cell_world_rect(right, bottom, hi),
    ])
}
