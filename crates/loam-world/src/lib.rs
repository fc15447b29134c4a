//! World coordinates, chunk dimensions, configuration and terrain sampling.
#![forbid(unsafe_code)]

pub mod config;
mod coord;
mod dims;
pub mod terrain;

pub use config::{LayoutConfig, TerrainConfig, WorldConfig};
pub use coord::{ChunkCoord, chebyshev_xz, ring, rings_within};
pub use dims::{ChunkDims, Layout};
pub use terrain::Terrain;
