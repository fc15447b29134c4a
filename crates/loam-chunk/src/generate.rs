use std::error::Error;

use loam_blocks::{Block, BlockKind};
use loam_world::{ChunkCoord, ChunkDims, Terrain};

use crate::Chunk;

pub type GenerateError = Box<dyn Error + Send + Sync>;

/// Fills a freshly created, all-air chunk. Called from the generation worker,
/// so implementations must only hold read-only state.
pub trait TerrainGenerator: Send + Sync {
    fn generate(&self, chunk: &mut Chunk) -> Result<(), GenerateError>;
}

impl TerrainGenerator for Terrain {
    fn generate(&self, chunk: &mut Chunk) -> Result<(), GenerateError> {
        let dims = chunk.dims();
        let (ox, oy, oz) = dims.origin(chunk.coord());
        let (sx, sy, sz) = (dims.sx, dims.sy, dims.sz);
        for z in 0..sz {
            for x in 0..sx {
                let height = self.column_height(ox + x as i32, oz + z as i32);
                if height < oy {
                    continue;
                }
                let top = ((height - oy) as usize).min(sy - 1);
                for y in 0..=top {
                    let kind = self.kind_in_column(height, oy + y as i32);
                    if kind != BlockKind::Air {
                        let i = chunk.idx(x, y, z);
                        chunk.blocks_mut()[i] = Block::new(kind);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Creates an empty chunk and runs the generator over it.
pub fn generate_chunk<G>(
    generator: &G,
    coord: ChunkCoord,
    dims: ChunkDims,
) -> Result<Chunk, GenerateError>
where
    G: TerrainGenerator + ?Sized,
{
    let mut chunk = Chunk::new(coord, dims);
    generator.generate(&mut chunk)?;
    Ok(chunk)
}
