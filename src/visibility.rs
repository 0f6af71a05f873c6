//! Face exposure and shadow annotation
//!
//! For every occupied cell the annotator derives which of its three drawable
//! faces (top, +x side, +y side) border empty space, whether a contact shadow
//! applies, and the surface type of the neighbouring cell on each side.
//! Neighbours outside the chunk resolve through the residency index; an
//! absent neighbour chunk counts as exposed (the edge of the loaded world is
//! always drawn).

use std::collections::HashMap;

use crate::chunk::{Chunk, ChunkCoord};

/// Derived per-cell visibility record. Never hand-edited; recomputed from the
/// owning chunk and its resident axis neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FaceInfo {
    /// Top face borders empty space or the depth ceiling.
    pub top: bool,
    /// +x side face borders empty space.
    pub x_side: bool,
    /// +y side face borders empty space.
    pub y_side: bool,
    /// Occupied cell one layer below the +x neighbour position.
    pub x_shadow: bool,
    /// Occupied cell one layer below the +y neighbour position.
    pub y_shadow: bool,
    /// Surface type of the +x neighbour cell, if any.
    pub x_value: Option<u8>,
    /// Surface type of the +y neighbour cell, if any.
    pub y_value: Option<u8>,
}

impl FaceInfo {
    /// Whether any face would be drawn at all.
    pub fn any_exposed(&self) -> bool {
        self.top || self.x_side || self.y_side
    }
}

/// Full O(volume) annotation of every cell in a chunk.
pub fn compute_faces(chunk: &Chunk, index: &HashMap<ChunkCoord, Chunk>) -> Vec<FaceInfo> {
    let mut faces = vec![FaceInfo::default(); chunk.width() * chunk.height() * chunk.depth()];
    for z in 0..chunk.depth() {
        for y in 0..chunk.height() {
            for x in 0..chunk.width() {
                faces[chunk.index(x, y, z)] = face_info(chunk, x, y, z, index);
            }
        }
    }
    faces
}

/// Borders-only O(perimeter) re-annotation, used when a neighbour chunk
/// arrives. Returns (flat index, record) updates for the four border
/// rows/columns of every layer.
pub fn compute_border_faces(
    chunk: &Chunk,
    index: &HashMap<ChunkCoord, Chunk>,
) -> Vec<(usize, FaceInfo)> {
    let (w, h) = (chunk.width(), chunk.height());
    let mut updates = Vec::with_capacity(chunk.depth() * 2 * (w + h));

    for z in 0..chunk.depth() {
        for x in 0..w {
            updates.push((chunk.index(x, 0, z), face_info(chunk, x, 0, z, index)));
            updates.push((chunk.index(x, h - 1, z), face_info(chunk, x, h - 1, z, index)));
        }
        for y in 0..h {
            updates.push((chunk.index(0, y, z), face_info(chunk, 0, y, z, index)));
            updates.push((chunk.index(w - 1, y, z), face_info(chunk, w - 1, y, z, index)));
        }
    }
    updates
}

/// The visibility record for one cell.
fn face_info(chunk: &Chunk, x: usize, y: usize, z: usize, index: &HashMap<ChunkCoord, Chunk>) -> FaceInfo {
    let (w, h, d) = (chunk.width(), chunk.height(), chunk.depth());
    let (cx, cy) = chunk.coord;
    let mut info = FaceInfo::default();

    // top: exposed at the depth ceiling or under an empty cell
    info.top = z + 1 == d || chunk.cell(x, y, z + 1).is_none();

    // +x side
    if x + 1 < w {
        let neighbour = chunk.cell(x + 1, y, z);
        info.x_side = neighbour.is_none();
        info.x_value = neighbour;
        info.x_shadow = z > 0 && chunk.cell(x + 1, y, z - 1).is_some();
    } else if let Some(adjacent) = index.get(&(cx + 1, cy)) {
        let neighbour = adjacent.cell(0, y, z);
        info.x_side = neighbour.is_none();
        info.x_value = neighbour;
        info.x_shadow = z > 0 && adjacent.cell(0, y, z - 1).is_some();
    } else {
        info.x_side = true;
    }

    // +y side
    if y + 1 < h {
        let neighbour = chunk.cell(x, y + 1, z);
        info.y_side = neighbour.is_none();
        info.y_value = neighbour;
        info.y_shadow = z > 0 && chunk.cell(x, y + 1, z - 1).is_some();
    } else if let Some(adjacent) = index.get(&(cx, cy + 1)) {
        let neighbour = adjacent.cell(x, 0, z);
        info.y_side = neighbour.is_none();
        info.y_value = neighbour;
        info.y_shadow = z > 0 && adjacent.cell(x, 0, z - 1).is_some();
    } else {
        info.y_side = true;
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::view::Projection;

    fn config() -> EngineConfig {
        EngineConfig {
            board_width: 4,
            board_height: 4,
            board_depth: 6,
            shallow_threshold: 1,
            ..Default::default()
        }
    }

    fn solid_chunk(coord: ChunkCoord, cfg: &EngineConfig, height_val: f64) -> Chunk {
        let projection = Projection::new(cfg);
        Chunk::populate(coord, cfg, &projection, &mut |_, _| (height_val, 1.0))
    }

    #[test]
    fn test_interior_faces_are_hidden() {
        let cfg = config();
        let chunk = solid_chunk((0, 0), &cfg, 1.0);
        let index = HashMap::new();
        let faces = compute_faces(&chunk, &index);

        // interior cell: occupied on all sides and above
        let info = faces[chunk.index(1, 1, 2)];
        assert!(!info.top);
        assert!(!info.x_side);
        assert!(!info.y_side);
        assert_eq!(info.x_value, Some(0));
        assert_eq!(info.y_value, Some(0));
    }

    #[test]
    fn test_top_layer_is_exposed() {
        let cfg = config();
        let chunk = solid_chunk((0, 0), &cfg, 1.0);
        let faces = compute_faces(&chunk, &HashMap::new());
        assert!(faces[chunk.index(1, 1, 5)].top);
    }

    #[test]
    fn test_world_edge_is_exposed() {
        let cfg = config();
        let chunk = solid_chunk((0, 0), &cfg, 1.0);
        let faces = compute_faces(&chunk, &HashMap::new());

        // no chunk at (1, 0) or (0, 1): border sides are exposed
        let info = faces[chunk.index(3, 1, 0)];
        assert!(info.x_side);
        assert_eq!(info.x_value, None);

        let info = faces[chunk.index(1, 3, 0)];
        assert!(info.y_side);
        assert_eq!(info.y_value, None);
    }

    #[test]
    fn test_resident_neighbour_hides_border_faces() {
        let cfg = config();
        let mut index = HashMap::new();
        index.insert((1, 0), solid_chunk((1, 0), &cfg, 1.0));
        index.insert((0, 1), solid_chunk((0, 1), &cfg, 1.0));
        let chunk = solid_chunk((0, 0), &cfg, 1.0);

        let faces = compute_faces(&chunk, &index);

        let info = faces[chunk.index(3, 1, 0)];
        assert!(!info.x_side);
        assert_eq!(info.x_value, Some(0));

        let info = faces[chunk.index(1, 3, 0)];
        assert!(!info.y_side);
        assert_eq!(info.y_value, Some(0));
    }

    #[test]
    fn test_shadow_when_supported_below() {
        let cfg = config();
        // columns of height 3 next to full columns: the step exposes sides,
        // and the occupied layer below the neighbour casts the contact shadow
        let projection = Projection::new(&cfg);
        let chunk = Chunk::populate((0, 0), &cfg, &projection, &mut |x, _| {
            if x == 1 {
                (1.0, 1.0) // full column at x = 1
            } else {
                (0.3, 1.0) // short columns elsewhere
            }
        });
        let faces = compute_faces(&chunk, &HashMap::new());

        // one layer above the short column's top, the exposed side sits
        // directly on occupied ground and gets the shadow; higher up it
        // does not
        let short_top = (1.0_f64 + 0.3 * 5.0).floor() as usize - 1; // top layer of short columns
        let info = faces[chunk.index(1, 0, short_top + 1)];
        assert!(info.x_side);
        assert!(info.x_shadow, "short column top supports the contact shadow");

        let info = faces[chunk.index(1, 0, short_top + 2)];
        assert!(info.x_side);
        assert!(!info.x_shadow, "no support two layers above the short column");
    }

    #[test]
    fn test_border_updates_touch_only_borders() {
        let cfg = config();
        let chunk = solid_chunk((0, 0), &cfg, 1.0);
        let updates = compute_border_faces(&chunk, &HashMap::new());

        for (idx, _) in &updates {
            // recover local coordinates from the flat index
            let per_layer = cfg.board_width * cfg.board_height;
            let rem = idx % per_layer;
            let y = rem / cfg.board_width;
            let x = rem % cfg.board_width;
            assert!(
                x == 0 || x == cfg.board_width - 1 || y == 0 || y == cfg.board_height - 1,
                "interior index {} in border update set",
                idx
            );
        }
    }
}
