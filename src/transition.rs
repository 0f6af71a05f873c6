//! Transition tile cache
//!
//! Where a top face borders a different surface type, the renderer draws a
//! blended tile instead of a hard edge: the `from` tile with a stochastic
//! scatter of `to` pixels, dense near the shared edge and sparse away from
//! it. Blends are synthesized on first use, keyed by (direction, from, to),
//! and kept for the life of the cache. Each key gets its own seeded stream so
//! a given blend looks identical across runs and across cache instances.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use image::RgbaImage;
use log::trace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::tileset::Tileset;

/// Which neighbour the blend leans towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendDirection {
    /// Blend towards the +x neighbour (bottom-right tile edge).
    AlongX,
    /// Blend towards the +y neighbour (bottom-left tile edge).
    AlongY,
}

impl BlendDirection {
    /// Corner densities [top-left, top-right, bottom-left, bottom-right]
    /// interpolated across the tile to drive the scatter mask.
    fn corner_weights(self) -> [f64; 4] {
        match self {
            BlendDirection::AlongX => [0.0, 0.0, 0.0, 2.0],
            BlendDirection::AlongY => [0.0, 0.0, 2.0, 0.0],
        }
    }
}

type BlendKey = (BlendDirection, u8, u8);

/// Lazily filled store of blended top tiles.
pub struct TransitionCache {
    tiles: HashMap<BlendKey, RgbaImage>,
    seed: u64,
}

impl TransitionCache {
    pub fn new(seed: u64) -> Self {
        Self {
            tiles: HashMap::new(),
            seed,
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The blended tile for drawing `from` next to a `to` neighbour,
    /// synthesizing it on first request.
    pub fn get(
        &mut self,
        tileset: &Tileset,
        direction: BlendDirection,
        from: u8,
        to: u8,
    ) -> &RgbaImage {
        let key = (direction, from, to);
        if !self.tiles.contains_key(&key) {
            trace!("synthesizing blend {:?}", key);
            let tile = synthesize(tileset, direction, from, to, blend_seed(self.seed, key));
            self.tiles.insert(key, tile);
        }
        &self.tiles[&key]
    }
}

fn blend_seed(master: u64, key: BlendKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Copy the `from` top tile and scatter `to` pixels over it, with inclusion
/// probability interpolated bilinearly from the direction's corner weights.
fn synthesize(
    tileset: &Tileset,
    direction: BlendDirection,
    from: u8,
    to: u8,
    seed: u64,
) -> RgbaImage {
    let mut tile = tileset.top(from).clone();
    let source = tileset.top(to);
    let (width, height) = tile.dimensions();
    let [tl, tr, bl, br] = direction.corner_weights();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for y in 0..height {
        for x in 0..width {
            let fx = x as f64 / (width - 1) as f64;
            let fy = y as f64 / (height - 1) as f64;
            let density = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;
            if rng.gen::<f64>() < density {
                let px = *source.get_pixel(x, y);
                if px[3] > 0 {
                    tile.put_pixel(x, y, px);
                }
            }
        }
    }

    tile
}
