//! Chunk grid, neighbour links and terrain generation.
#![forbid(unsafe_code)]

mod direction;
mod generate;

pub use direction::Direction;
pub use generate::{GenerateError, TerrainGenerator, generate_chunk};

use std::collections::HashMap;
use std::hash::BuildHasher;

use loam_blocks::{Block, BlockKind, MAX_SKY_LIGHT};
use loam_world::{ChunkCoord, ChunkDims, Layout};

/// Lookup of live chunks by coordinate. Neighbour links resolve through this.
pub trait ChunkSource {
    fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk>;
}

impl<S: BuildHasher> ChunkSource for HashMap<ChunkCoord, Chunk, S> {
    #[inline]
    fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.get(&coord)
    }
}

impl<S: BuildHasher> ChunkSource for hashbrown::HashMap<ChunkCoord, Chunk, S> {
    #[inline]
    fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.get(&coord)
    }
}

#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    dims: ChunkDims,
    blocks: Vec<Block>,
    // Non-owning handles, indexed by `Direction::index`.
    neighbors: [Option<ChunkCoord>; 6],
    light_max: u8,
    // Sky light as last computed, before any brightness rescale.
    sky_base: Vec<u8>,
    base_max: u8,
}

impl Chunk {
    /// Empty (all air, unlit) chunk.
    pub fn new(coord: ChunkCoord, dims: ChunkDims) -> Self {
        Self {
            coord,
            dims,
            blocks: vec![Block::AIR; dims.volume()],
            neighbors: [None; 6],
            light_max: MAX_SKY_LIGHT,
            sky_base: Vec::new(),
            base_max: 0,
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.dims.sz + z) * self.dims.sx + x
    }

    /// Linear index for a local position, or `None` when out of bounds.
    #[inline]
    pub fn index_of(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= self.dims.sx || y >= self.dims.sy || z >= self.dims.sz {
            return None;
        }
        Some(self.idx(x, y, z))
    }

    /// Block at a local position; air when out of bounds.
    #[inline]
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Block {
        match self.index_of(x, y, z) {
            Some(i) => self.blocks[i],
            None => Block::AIR,
        }
    }

    /// Writes a category at a local position, resetting its light. Out of bounds is a no-op.
    /// Returns whether a voxel was written.
    #[inline]
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, kind: BlockKind) -> bool {
        match self.index_of(x, y, z) {
            Some(i) => {
                self.blocks[i] = Block::new(kind);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn sky_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.get_local(x, y, z).sky_light
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        let (lx, ly, lz) = self.dims.local_of(self.coord, wx, wy, wz);
        self.index_of(lx, ly, lz).is_some()
    }

    /// Resolves a world position against this chunk and its linked neighbours.
    ///
    /// Positions inside an unlinked neighbour yield [`Block::UNLOADED`] (solid).
    /// Only direct neighbours are consulted; anything more than one chunk away
    /// on any axis is also treated as unloaded. Above the world is lit air and
    /// below it is solid.
    pub fn get_world<S>(&self, world: &S, wx: i32, wy: i32, wz: i32) -> Block
    where
        S: ChunkSource + ?Sized,
    {
        let (lx, ly, lz) = self.dims.local_of(self.coord, wx, wy, wz);
        if let Some(i) = self.index_of(lx, ly, lz) {
            return self.blocks[i];
        }
        let (sx, sy, sz) = (
            self.dims.sx as i32,
            self.dims.sy as i32,
            self.dims.sz as i32,
        );
        let far = |l: i32, s: i32| l < -s || l >= 2 * s;
        if far(lx, sx) || far(lz, sz) {
            return Block::UNLOADED;
        }

        let dir = if ly < 0 || ly >= sy {
            let up = ly >= sy;
            match self.dims.layout {
                Layout::Flat => return self.outside_world(up),
                Layout::Columns { .. } => {
                    if far(ly, sy) {
                        return Block::UNLOADED;
                    }
                    let ncy = self.coord.cy + if up { 1 } else { -1 };
                    if !self.dims.contains_layer(ncy) {
                        return self.outside_world(up);
                    }
                    if up { Direction::Up } else { Direction::Down }
                }
            }
        } else if lx < 0 {
            Direction::West
        } else if lx >= sx {
            Direction::East
        } else if lz < 0 {
            Direction::North
        } else {
            Direction::South
        };

        match self.neighbor(dir).and_then(|n| world.chunk(n)) {
            Some(nb) => nb.get_world(world, wx, wy, wz),
            None => Block::UNLOADED,
        }
    }

    #[inline]
    fn outside_world(&self, above: bool) -> Block {
        if above {
            Block {
                kind: BlockKind::Air,
                sky_light: self.light_max,
            }
        } else {
            Block::UNLOADED
        }
    }

    /// Whether the face of local voxel (x,y,z) pointing `dir` borders a
    /// transparent voxel. Faces against unloaded neighbours are hidden.
    pub fn face_visible<S>(&self, world: &S, x: i32, y: i32, z: i32, dir: Direction) -> bool
    where
        S: ChunkSource + ?Sized,
    {
        if self.get_local(x, y, z).is_air() {
            return false;
        }
        let (ox, oy, oz) = self.dims.origin(self.coord);
        let (dx, dy, dz) = dir.offset();
        self.get_world(world, ox + x + dx, oy + y + dy, oz + z + dz)
            .is_transparent()
    }

    #[inline]
    pub fn neighbor(&self, dir: Direction) -> Option<ChunkCoord> {
        self.neighbors[dir.index()]
    }

    #[inline]
    pub fn link(&mut self, dir: Direction, other: ChunkCoord) {
        self.neighbors[dir.index()] = Some(other);
    }

    #[inline]
    pub fn unlink(&mut self, dir: Direction) -> Option<ChunkCoord> {
        self.neighbors[dir.index()].take()
    }

    /// Linked neighbours with their slot.
    pub fn linked(&self) -> impl Iterator<Item = (Direction, ChunkCoord)> + '_ {
        Direction::ALL
            .iter()
            .filter_map(|d| self.neighbors[d.index()].map(|c| (*d, c)))
    }

    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[inline]
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Sky maximum the displayed light field is scaled to.
    #[inline]
    pub fn light_max(&self) -> u8 {
        self.light_max
    }

    #[inline]
    pub fn set_light_max(&mut self, max: u8) {
        self.light_max = max;
    }

    /// Snapshots the current light field as the base that later rescales derive from.
    pub fn store_sky_base(&mut self) {
        self.sky_base.clear();
        self.sky_base.extend(self.blocks.iter().map(|b| b.sky_light));
        self.base_max = self.light_max;
    }

    /// Maximum the stored base was lit against, or `None` when no base is stored.
    #[inline]
    pub fn sky_base_max(&self) -> Option<u8> {
        (self.sky_base.len() == self.blocks.len()).then_some(self.base_max)
    }

    /// Rewrites every voxel's light as `f(base level)`. Returns false, leaving the
    /// chunk untouched, when no base is stored.
    pub fn remap_from_sky_base<F>(&mut self, f: F) -> bool
    where
        F: Fn(u8) -> u8,
    {
        if self.sky_base.len() != self.blocks.len() {
            return false;
        }
        for (b, &base) in self.blocks.iter_mut().zip(&self.sky_base) {
            b.sky_light = f(base);
        }
        true
    }

    /// Applies world-space overrides that fall inside this chunk. Returns how many landed.
    pub fn apply_overrides<I>(&mut self, overrides: I) -> usize
    where
        I: IntoIterator<Item = ((i32, i32, i32), BlockKind)>,
    {
        let mut applied = 0;
        for ((wx, wy, wz), kind) in overrides {
            let (lx, ly, lz) = self.dims.local_of(self.coord, wx, wy, wz);
            if self.set_local(lx, ly, lz, kind) {
                applied += 1;
            }
        }
        applied
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_air())
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        !self.has_non_air()
    }
}
