//! Chunk streaming: a single background generation worker feeding a
//! manager that owns the live chunk map.
#![forbid(unsafe_code)]

mod manager;
mod mesh;
mod worker;

pub use manager::ChunkManager;
pub use mesh::{MeshOwner, NullMeshOwner};

use loam_world::ChunkCoord;

/// Lifecycle of one chunk coordinate as seen by the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    Unloaded,
    Queued,
    Generating,
    /// Finished by the worker, waiting to be installed.
    Ready,
    Loaded,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub loaded: usize,
    /// Queued, generating, or ready but not yet installed.
    pub pending: usize,
    pub requested: u64,
    pub installed: u64,
    pub evicted: u64,
    /// Ready chunks dropped because the observer moved away.
    pub discarded: u64,
    pub failed: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("chunk {0:?} is not loaded")]
    NotLoaded(ChunkCoord),
    #[error("position ({x}, {y}, {z}) is outside the editable world")]
    OutOfRange { x: i32, y: i32, z: i32 },
    #[error(transparent)]
    Save(loam_save::SaveError),
}
