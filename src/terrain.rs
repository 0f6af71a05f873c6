//! Seamless fractal terrain fields
//!
//! A chunked midpoint-displacement ("diamond-square") generator over an
//! unbounded integer grid. Chunks are generated lazily and cached forever;
//! a new chunk seeds its borders from every already-generated neighbour so
//! that shared edges are bit-identical regardless of generation order.
//!
//! Two independent field instances (height, biome) make up the terrain
//! sampler consumed by chunk population.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{ConfigError, EngineConfig};

/// Field-chunk coordinate.
pub type FieldCoord = (i64, i64);

/// A lazily chunked diamond-square scalar field in [0, 1].
pub struct DiamondSquare {
    size: usize,
    roughness: f64,
    seed: u64,
    label: &'static str,
    chunks: HashMap<FieldCoord, Vec<f64>>,
}

impl DiamondSquare {
    /// `size` must be `2^k + 1`; `roughness` must lie in [0, 1].
    pub fn new(
        size: usize,
        roughness: f64,
        seed: u64,
        label: &'static str,
    ) -> Result<Self, ConfigError> {
        if size < 3 || !(size - 1).is_power_of_two() {
            return Err(ConfigError::FieldSize(size));
        }
        if !(0.0..=1.0).contains(&roughness) {
            return Err(ConfigError::Roughness(roughness));
        }
        Ok(Self {
            size,
            roughness,
            seed,
            label,
            chunks: HashMap::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of generated chunks currently cached.
    pub fn cached_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// The field value at (x, y), generating the owning chunk on first use.
    /// Repeated queries at the same coordinate return the identical value.
    pub fn value(&mut self, x: i64, y: i64) -> f64 {
        let size = self.size as i64;
        let coord = (x.div_euclid(size), y.div_euclid(size));
        self.ensure_chunk(coord);

        let ix = x.rem_euclid(size) as usize;
        let iy = y.rem_euclid(size) as usize;
        self.chunks[&coord][iy * self.size + ix]
    }

    fn ensure_chunk(&mut self, coord: FieldCoord) {
        if self.chunks.contains_key(&coord) {
            return;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(chunk_seed(self.seed, self.label, coord));
        let mut grid = seed_borders(self.size, coord, &self.chunks, &mut rng);
        displace(&mut grid, self.size, self.roughness, coord, &self.chunks, &mut rng);

        let values: Vec<f64> = grid
            .into_iter()
            .map(|v| v.unwrap_or(0.5)) // a 2^k+1 grid is always fully filled
            .collect();
        self.chunks.insert(coord, values);
    }
}

/// Derive the per-chunk RNG seed from the master seed, the field label and
/// the chunk coordinate.
fn chunk_seed(master: u64, label: &str, coord: FieldCoord) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    label.hash(&mut hasher);
    coord.hash(&mut hasher);
    hasher.finish()
}

/// Build the initial working grid for a chunk: copy borders and corners from
/// every already-generated neighbour, then random-fill any corner still
/// unset.
///
/// The scan order — left, right, top, bottom, then the TL/TR/BL/BR diagonals
/// — is a contract: the first neighbour to supply a value wins and nothing
/// set is ever overwritten, which is what makes shared edges bit-identical
/// regardless of generation order.
fn seed_borders(
    size: usize,
    (cx, cy): FieldCoord,
    chunks: &HashMap<FieldCoord, Vec<f64>>,
    rng: &mut ChaCha8Rng,
) -> Vec<Option<f64>> {
    let mut grid: Vec<Option<f64>> = vec![None; size * size];
    let last = size - 1;

    let mut put = |grid: &mut Vec<Option<f64>>, x: usize, y: usize, v: f64| {
        let slot = &mut grid[y * size + x];
        if slot.is_none() {
            *slot = Some(v);
        }
    };
    let peek = |chunk: &Vec<f64>, x: usize, y: usize| chunk[y * size + x];

    if let Some(left) = chunks.get(&(cx - 1, cy)) {
        for y in 0..size {
            put(&mut grid, 0, y, peek(left, last, y));
        }
    }
    if let Some(right) = chunks.get(&(cx + 1, cy)) {
        for y in 0..size {
            put(&mut grid, last, y, peek(right, 0, y));
        }
    }
    if let Some(top) = chunks.get(&(cx, cy - 1)) {
        for x in 0..size {
            put(&mut grid, x, 0, peek(top, x, last));
        }
    }
    if let Some(bottom) = chunks.get(&(cx, cy + 1)) {
        for x in 0..size {
            put(&mut grid, x, last, peek(bottom, x, 0));
        }
    }

    if let Some(tl) = chunks.get(&(cx - 1, cy - 1)) {
        put(&mut grid, 0, 0, peek(tl, last, last));
    }
    if let Some(tr) = chunks.get(&(cx + 1, cy - 1)) {
        put(&mut grid, last, 0, peek(tr, 0, last));
    }
    if let Some(bl) = chunks.get(&(cx - 1, cy + 1)) {
        put(&mut grid, 0, last, peek(bl, last, 0));
    }
    if let Some(br) = chunks.get(&(cx + 1, cy + 1)) {
        put(&mut grid, last, last, peek(br, 0, 0));
    }

    // corners no neighbour supplied get a fresh draw
    for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
        if grid[y * size + x].is_none() {
            grid[y * size + x] = Some(rng.gen::<f64>());
        }
    }

    grid
}

/// Iterative midpoint displacement: halve the feature length down to 2,
/// running a diamond step then a square step per pass, halving the applied
/// roughness after each pass. Pre-set cells are never overwritten.
fn displace(
    grid: &mut Vec<Option<f64>>,
    size: usize,
    roughness: f64,
    coord: FieldCoord,
    chunks: &HashMap<FieldCoord, Vec<f64>>,
    rng: &mut ChaCha8Rng,
) {
    let mut length = size;
    let mut applied = roughness;

    while length > 2 {
        let step = length - 1;

        // diamond step: centre of every axis-aligned square of this length
        for j in (0..size - 1).step_by(step) {
            for i in (0..size - 1).step_by(step) {
                let mx = i + step / 2;
                let my = j + step / 2;
                if grid[my * size + mx].is_some() {
                    continue;
                }
                let corners = [
                    grid[j * size + i],
                    grid[j * size + (i + step)],
                    grid[(j + step) * size + i],
                    grid[(j + step) * size + (i + step)],
                ];
                let perturb = (2.0 * rng.gen::<f64>() - 1.0) * applied;
                grid[my * size + mx] = Some(clamp01(average(corners) + perturb));
            }
        }

        // square step: midpoint of every square edge, reading across chunk
        // borders when the probe leaves this grid
        let half = length / 2;
        let mut j = 0;
        while j < size {
            let mut i = if (j / half) % 2 == 0 { half } else { 0 };
            while i < size {
                square_midpoint(grid, size, i, j, length, applied, coord, chunks, rng);
                i += step;
            }
            j += half;
        }

        applied /= 2.0;
        length = (length - 1) / 2 + 1;
    }
}

/// Fill one edge midpoint as the average of the up-to-4 surrounding diamond
/// points plus a perturbation. Probes that land in an uncached neighbour are
/// excluded from the average (they change the divisor, not the numerator).
#[allow(clippy::too_many_arguments)]
fn square_midpoint(
    grid: &mut Vec<Option<f64>>,
    size: usize,
    x: usize,
    y: usize,
    length: usize,
    applied: f64,
    coord: FieldCoord,
    chunks: &HashMap<FieldCoord, Vec<f64>>,
    rng: &mut ChaCha8Rng,
) {
    if grid[y * size + x].is_some() {
        return;
    }

    let half = (length / 2) as i64;
    let (x, y) = (x as i64, y as i64);
    let probes = [
        raw_value(grid, size, x - half, y, coord, chunks),
        raw_value(grid, size, x + half, y, coord, chunks),
        raw_value(grid, size, x, y - half, coord, chunks),
        raw_value(grid, size, x, y + half, coord, chunks),
    ];

    let perturb = (2.0 * rng.gen::<f64>() - 1.0) * applied;
    grid[y as usize * size + x as usize] = Some(clamp01(average(probes) + perturb));
}

/// Value at local coordinates that may fall outside the working grid.
/// Outside probes resolve against the neighbouring chunk if it is cached,
/// using the shared-edge offset convention (column `size-1` of a chunk is the
/// same world position as column 0 of its right neighbour), else `None`.
fn raw_value(
    grid: &[Option<f64>],
    size: usize,
    x: i64,
    y: i64,
    (cx, cy): FieldCoord,
    chunks: &HashMap<FieldCoord, Vec<f64>>,
) -> Option<f64> {
    let s = size as i64;
    if (0..s).contains(&x) && (0..s).contains(&y) {
        return grid[y as usize * size + x as usize];
    }

    let dst = ((cx * s + x).div_euclid(s), (cy * s + y).div_euclid(s));
    let values = chunks.get(&dst)?;

    let fold = |v: i64| -> usize {
        if v >= 0 {
            (v % s) as usize
        } else {
            (s - 1 - (v.abs() % s)) as usize
        }
    };
    Some(values[fold(y) * size + fold(x)])
}

fn average(points: [Option<f64>; 4]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0;
    for p in points.into_iter().flatten() {
        sum += p;
        count += 1;
    }
    sum / count as f64
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// The two-field terrain sampler: an independent height field and biome
/// field, each read at its own resolution divisor.
pub struct Terrain {
    height: DiamondSquare,
    biome: DiamondSquare,
    height_resolution: i64,
    biome_resolution: i64,
}

impl Terrain {
    pub fn new(config: &EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        if config.height_resolution == 0 || config.biome_resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        Ok(Self {
            height: DiamondSquare::new(config.field_size, config.height_roughness, seed, "height")?,
            biome: DiamondSquare::new(config.field_size, config.biome_roughness, seed, "biome")?,
            height_resolution: config.height_resolution,
            biome_resolution: config.biome_resolution,
        })
    }

    /// Height and biome scalars, both in [0, 1], for a world cell column.
    pub fn sample(&mut self, x: i64, y: i64) -> (f64, f64) {
        let h = self.height.value(
            x.div_euclid(self.height_resolution),
            y.div_euclid(self.height_resolution),
        );
        let b = self.biome.value(
            x.div_euclid(self.biome_resolution),
            y.div_euclid(self.biome_resolution),
        );
        (h, b)
    }
}
