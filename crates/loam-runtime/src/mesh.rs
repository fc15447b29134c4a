use loam_chunk::{Chunk, ChunkSource};

/// Receiver of chunk lifecycle events, normally the renderer.
///
/// All hooks run on the update thread. `world` resolves neighbour links so
/// implementations can call [`Chunk::get_world`] and [`Chunk::face_visible`].
pub trait MeshOwner {
    /// A chunk entered the live map. Its neighbours are already linked.
    fn on_chunk_installed(&mut self, chunk: &Chunk, world: &dyn ChunkSource);

    /// Something that affects this chunk's border faces or light changed.
    fn on_chunk_neighbors_changed(&mut self, chunk: &Chunk, world: &dyn ChunkSource);

    /// The chunk is about to be dropped; release anything built from it.
    fn on_chunk_evicted(&mut self, chunk: &Chunk);

    /// A voxel inside this chunk was edited and the chunk relit.
    fn on_chunk_modified(&mut self, chunk: &Chunk, world: &dyn ChunkSource) {
        self.on_chunk_neighbors_changed(chunk, world);
    }
}

/// Ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMeshOwner;

impl MeshOwner for NullMeshOwner {
    fn on_chunk_installed(&mut self, _chunk: &Chunk, _world: &dyn ChunkSource) {}
    fn on_chunk_neighbors_changed(&mut self, _chunk: &Chunk, _world: &dyn ChunkSource) {}
    fn on_chunk_evicted(&mut self, _chunk: &Chunk) {}
}
