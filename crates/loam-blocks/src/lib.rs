//! Block categories and the per-voxel block value.
#![forbid(unsafe_code)]

pub mod types;

pub use types::{Block, BlockKind, MAX_SKY_LIGHT};
