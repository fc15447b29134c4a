//! Headless driver: streams a world around an observer walking east,
//! placing blocks along the way and cycling the sky brightness.

mod day_cycle;
mod faces;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use loam_blocks::BlockKind;
use loam_chunk::TerrainGenerator;
use loam_runtime::ChunkManager;
use loam_save::WorldSave;
use loam_world::{Terrain, WorldConfig};

use crate::day_cycle::DayCycle;
use crate::faces::FaceCounter;

#[derive(Parser, Debug)]
#[command(name = "loam", about = "Stream a voxel world around a moving observer")]
struct Args {
    /// World config file (TOML). Defaults are used when it does not exist.
    #[arg(long, default_value = "world.toml")]
    config: PathBuf,
    #[arg(long)]
    seed: Option<i32>,
    #[arg(long)]
    render_distance: Option<i32>,
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Number of update ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Blocks the observer walks east per tick.
    #[arg(long, default_value_t = 0.5)]
    speed: f32,
    /// Place a block under the observer every N ticks (0 disables).
    #[arg(long, default_value_t = 60)]
    edit_every: u32,
    /// Ticks per day/night cycle (0 keeps the sky at full brightness).
    #[arg(long, default_value_t = 0)]
    day_ticks: u32,
    /// Sleep between ticks.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
}

fn load_config(args: &Args) -> Result<WorldConfig, Box<dyn Error>> {
    let mut config = if args.config.exists() {
        log::info!("loading world config from {}", args.config.display());
        WorldConfig::load(&args.config)?
    } else {
        log::info!(
            "{} not found; using default world config",
            args.config.display()
        );
        WorldConfig::default()
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(rd) = args.render_distance {
        config.render_distance = rd;
    }
    if let Some(dir) = &args.save_dir {
        config.save_dir = dir.clone();
    }
    Ok(config.sanitized())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(&args)?;
    let dims = config.dims();

    let save = Arc::new(WorldSave::open(
        config.save_file(),
        config.autosave_interval(),
    ));
    let terrain = Arc::new(Terrain::new(
        config.seed,
        &config.terrain,
        dims.world_height(),
    ));
    let generator: Arc<dyn TerrainGenerator> = terrain.clone();
    let mut manager = ChunkManager::new(&config, generator, save, FaceCounter::default())?;
    let mut day = (args.day_ticks > 0)
        .then(|| DayCycle::new(args.day_ticks as f32, config.max_sky_light));

    let (mut x, z) = (0.5f32, 0.5f32);
    for tick in 0..args.ticks {
        let ground = terrain.column_height(x.floor() as i32, z.floor() as i32);
        manager.update(x, (ground + 2) as f32, z);

        if let Some(cycle) = day.as_mut() {
            let level = cycle.advance(1.0);
            if level != manager.sky_brightness() {
                log::info!(target: "events", "[tick {}] SkyBrightness level={}", tick, level);
                manager.set_sky_brightness(level);
            }
        }

        if args.edit_every > 0 && tick > 0 && tick % args.edit_every == 0 {
            let (wx, wy, wz) = (x.floor() as i32, ground + 1, z.floor() as i32 + 2);
            match manager.set_block_at(wx, wy, wz, BlockKind::Planks) {
                Ok(()) => log::info!(
                    target: "events",
                    "[tick {}] BlockPlaced ({},{},{}) block={}",
                    tick,
                    wx,
                    wy,
                    wz,
                    BlockKind::Planks
                ),
                Err(e) => log::warn!(target: "events", "[tick {}] BlockPlaceFailed {}", tick, e),
            }
        }

        if tick % 100 == 0 {
            let s = manager.stats();
            log::info!(
                "[tick {}] center={:?} loaded={} pending={} faces={}",
                tick,
                manager.center(),
                s.loaded,
                s.pending,
                manager.mesh().total_faces()
            );
        }

        x += args.speed;
        if args.tick_ms > 0 {
            thread::sleep(Duration::from_millis(args.tick_ms));
        }
    }

    let s = manager.stats();
    log::info!(
        "done: requested={} installed={} evicted={} discarded={} failed={} mesh rebuilds={}",
        s.requested,
        s.installed,
        s.evicted,
        s.discarded,
        s.failed,
        manager.mesh().rebuilds()
    );
    manager.shutdown()?;
    Ok(())
}
