use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Coordinate in the flat layout, where every chunk spans the full height.
    #[inline]
    pub const fn flat(cx: i32, cz: i32) -> Self {
        Self { cx, cy: 0, cz }
    }

    #[inline]
    pub fn with_y(self, cy: i32) -> Self {
        Self { cy, ..self }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

/// Chebyshev distance on the horizontal chunk grid.
#[inline]
pub fn chebyshev_xz(a: ChunkCoord, b: ChunkCoord) -> i32 {
    (a.cx - b.cx).abs().max((a.cz - b.cz).abs())
}

/// Horizontal ring of coordinates at exactly Chebyshev distance `r` from `center`,
/// walked around the perimeter. `cy` is copied from `center`.
pub fn ring(center: ChunkCoord, r: i32) -> Vec<ChunkCoord> {
    if r <= 0 {
        return vec![center];
    }
    let mut out = Vec::with_capacity(8 * r as usize);
    for dx in -r..=r {
        out.push(center.offset(dx, 0, -r));
    }
    for dz in (-r + 1)..=r {
        out.push(center.offset(r, 0, dz));
    }
    for dx in (-r..r).rev() {
        out.push(center.offset(dx, 0, r));
    }
    for dz in ((-r + 1)..r).rev() {
        out.push(center.offset(-r, 0, dz));
    }
    out
}

/// All rings from 0 through `radius`, nearest first.
pub fn rings_within(center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
    let side = (2 * radius.max(0) + 1) as usize;
    let mut out = Vec::with_capacity(side * side);
    for r in 0..=radius.max(0) {
        out.extend(ring(center, r));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ring_sizes_and_distances() {
        let c = ChunkCoord::flat(3, -7);
        assert_eq!(ring(c, 0), vec![c]);
        for r in 1..6 {
            let ring = ring(c, r);
            assert_eq!(ring.len(), 8 * r as usize);
            let unique: HashSet<_> = ring.iter().copied().collect();
            assert_eq!(unique.len(), ring.len());
            assert!(ring.iter().all(|k| chebyshev_xz(*k, c) == r));
        }
    }

    #[test]
    fn rings_within_is_square_and_ordered() {
        let c = ChunkCoord::flat(0, 0);
        let all = rings_within(c, 2);
        assert_eq!(all.len(), 25);
        let dists: Vec<i32> = all.iter().map(|k| chebyshev_xz(*k, c)).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
    }
}
