use hashbrown::HashMap;
use loam_chunk::{Chunk, ChunkSource, Direction};
use loam_runtime::MeshOwner;
use loam_world::ChunkCoord;

/// Stand-in for a renderer: counts exposed faces per loaded chunk.
#[derive(Default)]
pub struct FaceCounter {
    faces: HashMap<ChunkCoord, usize>,
    rebuilds: u64,
}

impl FaceCounter {
    pub fn total_faces(&self) -> usize {
        self.faces.values().sum()
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    fn rebuild(&mut self, chunk: &Chunk, world: &dyn ChunkSource) {
        self.faces.insert(chunk.coord(), count_faces(chunk, world));
        self.rebuilds += 1;
    }
}

impl MeshOwner for FaceCounter {
    fn on_chunk_installed(&mut self, chunk: &Chunk, world: &dyn ChunkSource) {
        self.rebuild(chunk, world);
    }

    fn on_chunk_neighbors_changed(&mut self, chunk: &Chunk, world: &dyn ChunkSource) {
        self.rebuild(chunk, world);
    }

    fn on_chunk_evicted(&mut self, chunk: &Chunk) {
        self.faces.remove(&chunk.coord());
    }
}

pub fn count_faces(chunk: &Chunk, world: &dyn ChunkSource) -> usize {
    let dims = chunk.dims();
    let mut n = 0;
    for y in 0..dims.sy as i32 {
        for z in 0..dims.sz as i32 {
            for x in 0..dims.sx as i32 {
                if chunk.get_local(x, y, z).is_air() {
                    continue;
                }
                n += Direction::ALL
                    .iter()
                    .filter(|&&d| chunk.face_visible(world, x, y, z, d))
                    .count();
            }
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_blocks::BlockKind;
    use loam_world::ChunkDims;

    #[test]
    fn unloaded_borders_hide_faces() {
        let dims = ChunkDims::flat(8);
        let mut chunk = Chunk::new(ChunkCoord::flat(0, 0), dims);
        chunk.set_local(0, 3, 0, BlockKind::Stone);
        let world: HashMap<ChunkCoord, Chunk> = HashMap::new();
        // West and north neighbours are missing, so only four faces show.
        assert_eq!(count_faces(&chunk, &world), 4);
    }

    #[test]
    fn linked_air_neighbour_exposes_border_face() {
        let dims = ChunkDims::flat(8);
        let home = ChunkCoord::flat(0, 0);
        let west = ChunkCoord::flat(-1, 0);
        let mut chunk = Chunk::new(home, dims);
        chunk.set_local(0, 3, 5, BlockKind::Stone);
        chunk.link(Direction::West, west);
        let mut other = Chunk::new(west, dims);
        other.link(Direction::East, home);
        let mut world: HashMap<ChunkCoord, Chunk> = HashMap::new();
        world.insert(west, other);
        assert_eq!(count_faces(&chunk, &world), 6);
    }
}
