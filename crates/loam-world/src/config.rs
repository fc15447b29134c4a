use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use loam_blocks::MAX_SKY_LIGHT;

use crate::dims::ChunkDims;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_render_distance")]
    pub render_distance: i32,
    #[serde(default = "default_max_sky_light")]
    pub max_sky_light: u8,
    #[serde(default = "default_requests_per_update")]
    pub requests_per_update: usize,
    #[serde(default = "default_installs_per_update")]
    pub installs_per_update: usize,
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: u64,
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
}

fn default_seed() -> i32 {
    1337
}
fn default_render_distance() -> i32 {
    8
}
fn default_max_sky_light() -> u8 {
    MAX_SKY_LIGHT
}
fn default_requests_per_update() -> usize {
    4
}
fn default_installs_per_update() -> usize {
    8
}
fn default_autosave_secs() -> u64 {
    30
}
fn default_save_dir() -> PathBuf {
    PathBuf::from("worlds/default")
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            render_distance: default_render_distance(),
            max_sky_light: default_max_sky_light(),
            requests_per_update: default_requests_per_update(),
            installs_per_update: default_installs_per_update(),
            autosave_secs: default_autosave_secs(),
            save_dir: default_save_dir(),
            layout: LayoutConfig::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: WorldConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    /// Clamp values that would otherwise break the streaming loop.
    pub fn sanitized(mut self) -> Self {
        self.render_distance = self.render_distance.max(0);
        self.max_sky_light = self.max_sky_light.clamp(1, MAX_SKY_LIGHT);
        self.requests_per_update = self.requests_per_update.max(1);
        self.installs_per_update = self.installs_per_update.max(1);
        self
    }

    pub fn dims(&self) -> ChunkDims {
        self.layout.dims()
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_secs)
    }

    pub fn save_file(&self) -> PathBuf {
        self.save_dir.join("overrides.bin")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LayoutConfig {
    Flat {
        #[serde(default = "default_flat_height")]
        height: usize,
    },
    Columns {
        #[serde(default = "default_column_size")]
        size: usize,
        #[serde(default = "default_column_layers")]
        layers: i32,
    },
}

fn default_flat_height() -> usize {
    256
}
fn default_column_size() -> usize {
    16
}
fn default_column_layers() -> i32 {
    8
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig::Flat {
            height: default_flat_height(),
        }
    }
}

impl LayoutConfig {
    pub fn dims(&self) -> ChunkDims {
        match *self {
            LayoutConfig::Flat { height } => ChunkDims::flat(height.max(1)),
            LayoutConfig::Columns { size, layers } => {
                ChunkDims::columns(size.max(1), layers.max(1))
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TerrainConfig {
    Normal {
        #[serde(default = "default_frequency")]
        frequency: f32,
        #[serde(default = "default_base_height")]
        base_height: i32,
        #[serde(default = "default_amplitude")]
        amplitude: f32,
        #[serde(default = "default_dirt_depth")]
        dirt_depth: i32,
        #[serde(default = "default_sand_level")]
        sand_level: i32,
    },
    Flat {
        #[serde(default = "default_flat_thickness")]
        thickness: i32,
    },
}

fn default_frequency() -> f32 {
    0.01
}
fn default_base_height() -> i32 {
    64
}
fn default_amplitude() -> f32 {
    24.0
}
fn default_dirt_depth() -> i32 {
    3
}
fn default_sand_level() -> i32 {
    58
}
fn default_flat_thickness() -> i32 {
    4
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig::Normal {
            frequency: default_frequency(),
            base_height: default_base_height(),
            amplitude: default_amplitude(),
            dirt_depth: default_dirt_depth(),
            sand_level: default_sand_level(),
        }
    }
}
