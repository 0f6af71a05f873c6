//! Chunk streaming
//!
//! Owns chunk residency: a coordinate index plus the insertion-ordered list
//! the renderer iterates. Each tick residency is synced against the viewport
//! bounds in two phases: evict chunks whose loose bound no longer intersects,
//! then grow outward from the resident set, loading every absent neighbour
//! whose bound intersects, until a full pass inserts nothing.

use std::collections::HashMap;

use log::debug;

use crate::chunk::{chunk_bounds, Chunk, ChunkCoord};
use crate::config::EngineConfig;
use crate::geometry::Rect;
use crate::stats::FrameStats;
use crate::view::Projection;
use crate::visibility;

/// Sampler mapping a world cell column to its (height, biome) scalars.
pub type ColumnSampler<'a> = &'a mut dyn FnMut(i64, i64) -> (f64, f64);

/// The set of resident chunks.
#[derive(Default)]
pub struct World {
    chunks: HashMap<ChunkCoord, Chunk>,
    order: Vec<ChunkCoord>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Resident chunks in insertion order (the renderer's iteration order).
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.order.iter().filter_map(move |c| self.chunks.get(c))
    }

    /// Bring residency in line with the viewport bounds for this tick.
    pub fn sync_to_viewport(
        &mut self,
        bounds: &Rect,
        config: &EngineConfig,
        projection: &Projection,
        sample: ColumnSampler,
        stats: &mut FrameStats,
    ) {
        self.unload_outside(bounds, stats);

        // a viewport jump can evict everything at once; reseed from the
        // chunk under the viewport centre so the load phase has a frontier
        if self.is_empty() {
            let centre = chunk_under(
                bounds.left + bounds.width / 2.0,
                bounds.top + bounds.height / 2.0,
                config,
            );
            self.insert_chunk(centre, config, projection, sample, stats);
        }

        // grow until a full pass inserts nothing; bounded by the finite set
        // of chunks whose bounds can intersect the viewport
        loop {
            let frontier: Vec<ChunkCoord> = self.order.clone();
            let mut inserted = false;

            for (cx, cy) in frontier {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let candidate = (cx + dx, cy + dy);
                        if self.chunks.contains_key(&candidate) {
                            continue;
                        }
                        let loose =
                            chunk_bounds(candidate, config, projection, 0, config.board_depth - 1);
                        if loose.intersects(bounds) {
                            self.insert_chunk(candidate, config, projection, sample, stats);
                            inserted = true;
                        }
                    }
                }
            }

            if !inserted {
                break;
            }
        }
    }

    fn unload_outside(&mut self, bounds: &Rect, stats: &mut FrameStats) {
        let chunks = &mut self.chunks;
        self.order.retain(|coord| {
            let keep = chunks
                .get(coord)
                .map(|ch| ch.bounds.intersects(bounds))
                .unwrap_or(false);
            if !keep {
                chunks.remove(coord);
                stats.chunks_removed += 1;
                debug!("evicted chunk {:?}", coord);
            }
            keep
        });
    }

    /// Instantiate, annotate and register one chunk, then refresh the border
    /// records of any already-resident axis neighbour so their face data sees
    /// the new cells.
    fn insert_chunk(
        &mut self,
        coord: ChunkCoord,
        config: &EngineConfig,
        projection: &Projection,
        sample: ColumnSampler,
        stats: &mut FrameStats,
    ) {
        let chunk = Chunk::populate(coord, config, projection, sample);
        self.chunks.insert(coord, chunk);
        self.order.push(coord);

        let faces = visibility::compute_faces(&self.chunks[&coord], &self.chunks);
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.faces = faces;
        }

        for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            let neighbour = (coord.0 + dx, coord.1 + dy);
            if let Some(chunk) = self.chunks.get(&neighbour) {
                let updates = visibility::compute_border_faces(chunk, &self.chunks);
                if let Some(chunk) = self.chunks.get_mut(&neighbour) {
                    for (idx, record) in updates {
                        chunk.faces[idx] = record;
                    }
                }
            }
        }

        stats.chunks_loaded += 1;
        debug!("loaded chunk {:?}", coord);
    }
}

/// The chunk whose cell grid contains the world pixel position (px, py) at
/// layer 0, by inverting the two ground-axis deltas.
fn chunk_under(px: f64, py: f64, config: &EngineConfig) -> ChunkCoord {
    let (ax, ay) = config.delta_x;
    let (bx, by) = config.delta_y;
    let det = ax * by - bx * ay;
    if det.abs() < f64::EPSILON {
        return (0, 0);
    }
    let cell_x = (px * by - py * bx) / det;
    let cell_y = (ax * py - ay * px) / det;
    (
        (cell_x / config.board_width as f64).floor() as i64,
        (cell_y / config.board_height as f64).floor() as i64,
    )
}
