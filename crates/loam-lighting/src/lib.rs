//! In-chunk sky light: direct column seeding followed by a bounded flood fill.
//!
//! Light never crosses chunk borders. Neighbour chunks only matter for face
//! visibility, which the mesher resolves through `Chunk::get_world`.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use loam_blocks::MAX_SKY_LIGHT;
use loam_chunk::Chunk;

/// Upper bound on voxels popped by one flood fill.
pub const FLOOD_NODE_CAP: usize = 5000;

/// Voxels raised to this level or below are not expanded further.
pub const LEAF_LEVEL: u8 = 2;

/// Reusable work queue for [`compute_sky_light`]. One per thread.
#[derive(Default)]
pub struct SkyLightScratch {
    queue: VecDeque<(usize, usize, usize)>,
}

impl SkyLightScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkyLightStats {
    /// Air voxels lit straight from above.
    pub direct: usize,
    /// Frontier voxels the flood fill started from.
    pub seeds: usize,
    /// Voxels popped from the queue.
    pub processed: usize,
    /// The node cap stopped propagation early.
    pub capped: bool,
}

const NEIGHBORS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

#[inline]
fn step(
    (x, y, z): (usize, usize, usize),
    (dx, dy, dz): (i32, i32, i32),
    (sx, sy, sz): (usize, usize, usize),
) -> Option<(usize, usize, usize)> {
    let nx = x as i32 + dx;
    let ny = y as i32 + dy;
    let nz = z as i32 + dz;
    if nx < 0 || ny < 0 || nz < 0 || nx >= sx as i32 || ny >= sy as i32 || nz >= sz as i32 {
        return None;
    }
    Some((nx as usize, ny as usize, nz as usize))
}

/// Recomputes the chunk's sky light field in place against `max_level` (clamped to 15).
///
/// The result is also stored as the chunk's base field, which
/// [`rescale_sky_light`] scales from.
pub fn compute_sky_light(
    chunk: &mut Chunk,
    max_level: u8,
    scratch: &mut SkyLightScratch,
) -> SkyLightStats {
    let stats = flood(chunk, max_level, scratch);
    chunk.store_sky_base();
    stats
}

fn flood(chunk: &mut Chunk, max_level: u8, scratch: &mut SkyLightScratch) -> SkyLightStats {
    let max_level = max_level.min(MAX_SKY_LIGHT);
    let dims = chunk.dims();
    let size = (dims.sx, dims.sy, dims.sz);
    let (sx, sy, sz) = size;
    let mut stats = SkyLightStats::default();
    chunk.set_light_max(max_level);

    for b in chunk.blocks_mut().iter_mut() {
        b.sky_light = 0;
    }
    if max_level == 0 {
        return stats;
    }

    // Direct light: air above the first obstruction in each column.
    for z in 0..sz {
        for x in 0..sx {
            for y in (0..sy).rev() {
                let i = chunk.idx(x, y, z);
                let b = &mut chunk.blocks_mut()[i];
                if !b.is_air() {
                    break;
                }
                b.sky_light = max_level;
                stats.direct += 1;
            }
        }
    }

    let top = chunk
        .blocks()
        .iter()
        .map(|b| b.sky_light)
        .max()
        .unwrap_or(0);
    if top == 0 {
        return stats;
    }

    let q = &mut scratch.queue;
    q.clear();
    for y in 0..sy {
        for z in 0..sz {
            for x in 0..sx {
                let b = chunk.blocks()[chunk.idx(x, y, z)];
                if !b.is_air() || b.sky_light != top {
                    continue;
                }
                let frontier = NEIGHBORS.iter().any(|&d| {
                    step((x, y, z), d, size).is_some_and(|(nx, ny, nz)| {
                        let n = chunk.blocks()[chunk.idx(nx, ny, nz)];
                        n.is_air() && n.sky_light < top
                    })
                });
                if frontier {
                    q.push_back((x, y, z));
                }
            }
        }
    }
    stats.seeds = q.len();

    while let Some(pos) = q.pop_front() {
        if stats.processed >= FLOOD_NODE_CAP {
            stats.capped = true;
            break;
        }
        stats.processed += 1;
        let current = chunk.blocks()[chunk.idx(pos.0, pos.1, pos.2)].sky_light;
        if current == 0 {
            continue;
        }
        let spread = current - 1;
        for &d in &NEIGHBORS {
            let Some((nx, ny, nz)) = step(pos, d, size) else {
                continue;
            };
            let i = chunk.idx(nx, ny, nz);
            let n = &mut chunk.blocks_mut()[i];
            if n.is_air() && n.sky_light < spread {
                n.sky_light = spread;
                if spread > LEAF_LEVEL {
                    q.push_back((nx, ny, nz));
                }
            }
        }
    }
    q.clear();
    stats
}

/// Convenience wrapper that allocates its own scratch queue.
pub fn light_chunk(chunk: &mut Chunk, max_level: u8) -> SkyLightStats {
    let mut scratch = SkyLightScratch::new();
    compute_sky_light(chunk, max_level, &mut scratch)
}

/// Remaps an already-lit chunk to a new sky maximum. Lit voxels are scaled
/// proportionally, rounded to nearest and clamped to 1..=15; dark voxels stay dark.
///
/// Scaling starts from the base field stored by [`compute_sky_light`], so
/// repeated rescales never accumulate rounding. Chunks without a base scale
/// their current values.
pub fn rescale_sky_light(chunk: &mut Chunk, new_max: u8) {
    let new_max = new_max.min(MAX_SKY_LIGHT);
    if chunk.light_max() == new_max {
        return;
    }
    match chunk.sky_base_max() {
        Some(base_max) => {
            chunk.remap_from_sky_base(|l| scale_level(l, base_max, new_max));
        }
        None => {
            let old_max = chunk.light_max();
            for b in chunk.blocks_mut().iter_mut() {
                b.sky_light = scale_level(b.sky_light, old_max, new_max);
            }
        }
    }
    chunk.set_light_max(new_max);
}

#[inline]
fn scale_level(level: u8, from: u8, to: u8) -> u8 {
    if level == 0 || from == 0 {
        return level;
    }
    let (old, new) = (u32::from(from), u32::from(to));
    let scaled = (u32::from(level) * new * 2 + old) / (2 * old);
    scaled.clamp(1, u32::from(MAX_SKY_LIGHT)) as u8
}

#[cfg(test)]
mod tests;
