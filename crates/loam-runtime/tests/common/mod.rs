#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use loam_blocks::BlockKind;
use loam_chunk::{Chunk, ChunkSource, GenerateError, TerrainGenerator};
use loam_runtime::{ChunkManager, MeshOwner};
use loam_save::WorldSave;
use loam_world::{ChunkCoord, LayoutConfig, WorldConfig};

/// Stone below `ground`, air above. Records every call and can be told to
/// fail, panic or stall.
pub struct TestGen {
    pub ground: i32,
    pub calls: Mutex<Vec<ChunkCoord>>,
    pub fail_once: Mutex<HashSet<ChunkCoord>>,
    pub panic_once: Mutex<HashSet<ChunkCoord>>,
    pub open: AtomicBool,
}

impl TestGen {
    pub fn new(ground: i32) -> Arc<Self> {
        Arc::new(Self {
            ground,
            calls: Mutex::new(Vec::new()),
            fail_once: Mutex::new(HashSet::new()),
            panic_once: Mutex::new(HashSet::new()),
            open: AtomicBool::new(true),
        })
    }

    pub fn calls(&self) -> Vec<ChunkCoord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl TerrainGenerator for TestGen {
    fn generate(&self, chunk: &mut Chunk) -> Result<(), GenerateError> {
        while !self.open.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
        let coord = chunk.coord();
        self.calls.lock().unwrap().push(coord);
        if self.fail_once.lock().unwrap().remove(&coord) {
            return Err(format!("no terrain for {coord:?}").into());
        }
        if self.panic_once.lock().unwrap().remove(&coord) {
            panic!("terrain blew up at {coord:?}");
        }
        let dims = chunk.dims();
        let (_, oy, _) = dims.origin(coord);
        for y in 0..dims.sy as i32 {
            if oy + y >= self.ground {
                break;
            }
            for z in 0..dims.sz as i32 {
                for x in 0..dims.sx as i32 {
                    chunk.set_local(x, y, z, BlockKind::Stone);
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct Recorder {
    pub installed: Vec<ChunkCoord>,
    pub neighbors_changed: Vec<ChunkCoord>,
    pub modified: Vec<ChunkCoord>,
    pub evicted: Vec<ChunkCoord>,
}

impl MeshOwner for Recorder {
    fn on_chunk_installed(&mut self, chunk: &Chunk, world: &dyn ChunkSource) {
        for (_, n) in chunk.linked() {
            assert!(world.chunk(n).is_some(), "{:?} linked to missing {n:?}", chunk.coord());
        }
        self.installed.push(chunk.coord());
    }

    fn on_chunk_neighbors_changed(&mut self, chunk: &Chunk, _world: &dyn ChunkSource) {
        self.neighbors_changed.push(chunk.coord());
    }

    fn on_chunk_evicted(&mut self, chunk: &Chunk) {
        self.evicted.push(chunk.coord());
    }

    fn on_chunk_modified(&mut self, chunk: &Chunk, _world: &dyn ChunkSource) {
        self.modified.push(chunk.coord());
    }
}

pub fn flat_config(render_distance: i32) -> WorldConfig {
    WorldConfig {
        render_distance,
        requests_per_update: 4,
        installs_per_update: 8,
        layout: LayoutConfig::Flat { height: 32 },
        ..WorldConfig::default()
    }
}

pub fn manager(
    config: &WorldConfig,
    generator: &Arc<TestGen>,
    save: Arc<WorldSave>,
) -> ChunkManager<Recorder> {
    let generator: Arc<dyn TerrainGenerator> = generator.clone();
    ChunkManager::new(config, generator, save, Recorder::default()).unwrap()
}

pub fn memory_save() -> Arc<WorldSave> {
    Arc::new(WorldSave::in_memory(Duration::from_secs(30)))
}

/// Calls `update_at` until `done` holds, failing after a generous timeout.
pub fn pump_until<M, F>(mgr: &mut ChunkManager<M>, center: ChunkCoord, mut done: F)
where
    M: MeshOwner,
    F: FnMut(&ChunkManager<M>) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        mgr.update_at(center);
        if done(mgr) {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "timed out waiting on streaming: {:?}",
            mgr.stats()
        );
        thread::sleep(Duration::from_millis(1));
    }
}

/// Pumps until nothing is in flight and `loaded` chunks are live.
pub fn settle<M: MeshOwner>(mgr: &mut ChunkManager<M>, center: ChunkCoord, loaded: usize) {
    pump_until(mgr, center, |m| {
        let s = m.stats();
        s.pending == 0 && s.loaded == loaded
    });
}
