use crate::coord::ChunkCoord;

/// How the world is partitioned vertically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// One chunk spans the full world height; four horizontal neighbours.
    Flat,
    /// Stacked cubic chunks with vertical indices `0..layers`; six neighbours.
    Columns { layers: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDims {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub layout: Layout,
}

impl ChunkDims {
    pub const fn flat(height: usize) -> Self {
        Self {
            sx: 16,
            sy: height,
            sz: 16,
            layout: Layout::Flat,
        }
    }

    pub const fn columns(size: usize, layers: i32) -> Self {
        Self {
            sx: size,
            sy: size,
            sz: size,
            layout: Layout::Columns { layers },
        }
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.sx * self.sy * self.sz
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        matches!(self.layout, Layout::Columns { .. })
    }

    /// Number of vertical chunk indices.
    #[inline]
    pub fn layers(&self) -> i32 {
        match self.layout {
            Layout::Flat => 1,
            Layout::Columns { layers } => layers.max(1),
        }
    }

    #[inline]
    pub fn contains_layer(&self, cy: i32) -> bool {
        cy >= 0 && cy < self.layers()
    }

    /// Total world height in blocks; world y spans `0..world_height()`.
    #[inline]
    pub fn world_height(&self) -> i32 {
        self.sy as i32 * self.layers()
    }

    /// Chunk containing a world position. Uses floor division so negative
    /// coordinates land in negative chunks. In the flat layout `cy` is always 0.
    #[inline]
    pub fn chunk_of(&self, wx: i32, wy: i32, wz: i32) -> ChunkCoord {
        let cy = match self.layout {
            Layout::Flat => 0,
            Layout::Columns { .. } => wy.div_euclid(self.sy as i32),
        };
        ChunkCoord::new(
            wx.div_euclid(self.sx as i32),
            cy,
            wz.div_euclid(self.sz as i32),
        )
    }

    #[inline]
    pub fn origin(&self, coord: ChunkCoord) -> (i32, i32, i32) {
        (
            coord.cx * self.sx as i32,
            coord.cy * self.sy as i32,
            coord.cz * self.sz as i32,
        )
    }

    /// Chunk-relative position. Components are not clamped.
    #[inline]
    pub fn local_of(&self, coord: ChunkCoord, wx: i32, wy: i32, wz: i32) -> (i32, i32, i32) {
        let (ox, oy, oz) = self.origin(coord);
        (wx - ox, wy - oy, wz - oz)
    }
}
