//! Deterministic terrain sampling. Same seed and position always yield the same block.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use loam_blocks::BlockKind;

use crate::config::TerrainConfig;

#[derive(Clone, Debug, PartialEq)]
enum Profile {
    Normal {
        base_height: i32,
        amplitude: f32,
        dirt_depth: i32,
        sand_level: i32,
    },
    Flat {
        thickness: i32,
    },
}

/// Read-only height-field sampler, shared by reference with the generation worker.
pub struct Terrain {
    seed: i32,
    noise: FastNoiseLite,
    detail: FastNoiseLite,
    profile: Profile,
    world_height: i32,
}

impl Terrain {
    pub fn new(seed: i32, cfg: &TerrainConfig, world_height: i32) -> Self {
        let (frequency, profile) = match *cfg {
            TerrainConfig::Normal {
                frequency,
                base_height,
                amplitude,
                dirt_depth,
                sand_level,
            } => (
                frequency,
                Profile::Normal {
                    base_height,
                    amplitude,
                    dirt_depth: dirt_depth.max(0),
                    sand_level,
                },
            ),
            TerrainConfig::Flat { thickness } => (
                0.01,
                Profile::Flat {
                    thickness: thickness.max(0),
                },
            ),
        };
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        let mut detail = FastNoiseLite::with_seed(seed ^ 0x5f3_7a1);
        detail.set_noise_type(Some(NoiseType::OpenSimplex2));
        detail.set_frequency(Some(frequency * 4.0));
        Self {
            seed,
            noise,
            detail,
            profile,
            world_height: world_height.max(1),
        }
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    #[inline]
    pub fn world_height(&self) -> i32 {
        self.world_height
    }

    /// Height of the topmost solid block in a column, or -1 for an empty column.
    pub fn column_height(&self, wx: i32, wz: i32) -> i32 {
        let h = match self.profile {
            Profile::Flat { thickness } => thickness - 1,
            Profile::Normal {
                base_height,
                amplitude,
                ..
            } => {
                let (x, z) = (wx as f32, wz as f32);
                let n = self.noise.get_noise_2d(x, z) + 0.25 * self.detail.get_noise_2d(x, z);
                base_height + (n * amplitude).round() as i32
            }
        };
        h.clamp(-1, self.world_height - 1)
    }

    /// Category at `wy` in a column whose surface is at `height`.
    pub fn kind_in_column(&self, height: i32, wy: i32) -> BlockKind {
        if wy < 0 || wy > height {
            return BlockKind::Air;
        }
        if wy == 0 {
            return BlockKind::Bedrock;
        }
        match self.profile {
            Profile::Flat { .. } => {
                if wy == height {
                    BlockKind::Grass
                } else {
                    BlockKind::Dirt
                }
            }
            Profile::Normal {
                dirt_depth,
                sand_level,
                ..
            } => {
                let depth = height - wy;
                if height <= sand_level {
                    if depth <= dirt_depth {
                        BlockKind::Sand
                    } else if depth <= dirt_depth + 2 {
                        BlockKind::Gravel
                    } else {
                        BlockKind::Stone
                    }
                } else if depth == 0 {
                    BlockKind::Grass
                } else if depth <= dirt_depth {
                    BlockKind::Dirt
                } else {
                    BlockKind::Stone
                }
            }
        }
    }

    pub fn kind_at(&self, wx: i32, wy: i32, wz: i32) -> BlockKind {
        self.kind_in_column(self.column_height(wx, wz), wy)
    }
}
