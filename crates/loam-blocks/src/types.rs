use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highest sky light level a voxel can hold.
pub const MAX_SKY_LIGHT: u8 = 15;

/// Block category. The discriminant is the on-disk tag and must stay stable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BlockKind {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Sand = 4,
    Gravel = 5,
    Bedrock = 6,
    Planks = 7,
}

impl BlockKind {
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Air,
        BlockKind::Grass,
        BlockKind::Dirt,
        BlockKind::Stone,
        BlockKind::Sand,
        BlockKind::Gravel,
        BlockKind::Bedrock,
        BlockKind::Planks,
    ];

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Air is the only category light and the observer pass through.
    #[inline]
    pub const fn is_transparent(self) -> bool {
        matches!(self, BlockKind::Air)
    }

    #[inline]
    pub const fn is_solid(self) -> bool {
        !self.is_transparent()
    }

    pub const fn name(self) -> &'static str {
        match self {
            BlockKind::Air => "air",
            BlockKind::Grass => "grass",
            BlockKind::Dirt => "dirt",
            BlockKind::Stone => "stone",
            BlockKind::Sand => "sand",
            BlockKind::Gravel => "gravel",
            BlockKind::Bedrock => "bedrock",
            BlockKind::Planks => "planks",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == lower)
            .ok_or_else(|| format!("unknown block kind '{s}'"))
    }
}

/// A voxel: category plus its current sky light level (0..=15).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block {
    pub kind: BlockKind,
    pub sky_light: u8,
}

impl Block {
    pub const AIR: Block = Block::new(BlockKind::Air);

    /// Returned for positions inside a neighbour that is not linked yet.
    /// Solid so that faces on an unloaded seam are not considered visible.
    pub const UNLOADED: Block = Block::new(BlockKind::Stone);

    #[inline]
    pub const fn new(kind: BlockKind) -> Self {
        Self { kind, sky_light: 0 }
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        matches!(self.kind, BlockKind::Air)
    }

    #[inline]
    pub const fn is_transparent(self) -> bool {
        self.kind.is_transparent()
    }

    #[inline]
    pub const fn is_solid(self) -> bool {
        self.kind.is_solid()
    }
}

impl From<BlockKind> for Block {
    fn from(kind: BlockKind) -> Self {
        Block::new(kind)
    }
}
