use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashMap;
use loam_chunk::{Chunk, GenerateError, TerrainGenerator, generate_chunk};
use loam_lighting::{SkyLightScratch, compute_sky_light, rescale_sky_light};
use loam_save::WorldSave;
use loam_world::{ChunkCoord, ChunkDims};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Queued,
    Generating,
    Ready,
}

pub(crate) enum WorkerOut {
    Ready(Chunk),
    Failed {
        coord: ChunkCoord,
        error: GenerateError,
    },
}

type StageMap = Arc<Mutex<HashMap<ChunkCoord, Stage>>>;

fn lock_stages(stages: &StageMap) -> MutexGuard<'_, HashMap<ChunkCoord, Stage>> {
    stages.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the worker thread reads while building a chunk.
pub(crate) struct WorkerCtx {
    pub generator: Arc<dyn TerrainGenerator>,
    pub save: Arc<WorldSave>,
    pub dims: ChunkDims,
    pub base_sky: u8,
    pub sky_max: Arc<AtomicU8>,
}

/// The single generation thread plus its request/ready channels.
///
/// The stage map doubles as the dedup set: a coordinate has an entry from
/// the moment it is requested until the manager installs, discards, or
/// drops it after a failure.
pub(crate) struct GenWorker {
    tx: Option<Sender<ChunkCoord>>,
    rx: Receiver<WorkerOut>,
    stages: StageMap,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl GenWorker {
    pub fn spawn(ctx: WorkerCtx) -> io::Result<Self> {
        let (req_tx, req_rx) = unbounded::<ChunkCoord>();
        let (out_tx, out_rx) = unbounded::<WorkerOut>();
        let stages: StageMap = Arc::new(Mutex::new(HashMap::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let stages = stages.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("loam-gen".into())
                .spawn(move || run(ctx, req_rx, out_tx, stages, stop))?
        };
        log::info!("generation worker started");
        Ok(Self {
            tx: Some(req_tx),
            rx: out_rx,
            stages,
            stop,
            handle: Some(handle),
        })
    }

    /// Queues `coord` unless it already has an outstanding request.
    pub fn request(&self, coord: ChunkCoord) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        {
            let mut stages = lock_stages(&self.stages);
            if stages.contains_key(&coord) {
                return false;
            }
            stages.insert(coord, Stage::Queued);
        }
        if tx.send(coord).is_err() {
            lock_stages(&self.stages).remove(&coord);
            return false;
        }
        true
    }

    /// Next finished item, never blocking.
    pub fn try_next(&self) -> Option<WorkerOut> {
        self.rx.try_recv().ok()
    }

    pub fn stage(&self, coord: ChunkCoord) -> Option<Stage> {
        lock_stages(&self.stages).get(&coord).copied()
    }

    /// Forgets a coordinate so it can be requested again.
    pub fn release(&self, coord: ChunkCoord) {
        lock_stages(&self.stages).remove(&coord);
    }

    pub fn pending(&self) -> usize {
        lock_stages(&self.stages).len()
    }

    /// Stops the worker after its current chunk and joins it. Requests still
    /// in the channel are dropped.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        self.tx = None;
        if handle.join().is_err() {
            log::error!("generation worker panicked outside a generator call");
        }
        lock_stages(&self.stages).clear();
        log::info!("generation worker stopped");
    }
}

impl Drop for GenWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    ctx: WorkerCtx,
    rx: Receiver<ChunkCoord>,
    tx: Sender<WorkerOut>,
    stages: StageMap,
    stop: Arc<AtomicBool>,
) {
    let mut scratch = SkyLightScratch::new();
    while let Ok(coord) = rx.recv() {
        if stop.load(Ordering::Acquire) {
            break;
        }
        lock_stages(&stages).insert(coord, Stage::Generating);
        let out = match build_chunk(&ctx, coord, &mut scratch) {
            Ok(chunk) => {
                lock_stages(&stages).insert(coord, Stage::Ready);
                WorkerOut::Ready(chunk)
            }
            Err(error) => WorkerOut::Failed { coord, error },
        };
        if tx.send(out).is_err() {
            break;
        }
    }
}

/// Generate, apply saved edits, then light at the base level and scale to
/// the current sky maximum.
fn build_chunk(
    ctx: &WorkerCtx,
    coord: ChunkCoord,
    scratch: &mut SkyLightScratch,
) -> Result<Chunk, GenerateError> {
    let generated = panic::catch_unwind(AssertUnwindSafe(|| {
        generate_chunk(ctx.generator.as_ref(), coord, ctx.dims)
    }));
    let mut chunk = match generated {
        Ok(result) => result?,
        Err(payload) => return Err(panic_message(payload.as_ref()).into()),
    };
    let overrides = ctx.save.overrides_in_chunk(coord, ctx.dims);
    if !overrides.is_empty() {
        let applied = chunk.apply_overrides(overrides);
        log::debug!("applied {applied} saved edits to {coord:?}");
    }
    compute_sky_light(&mut chunk, ctx.base_sky, scratch);
    rescale_sky_light(&mut chunk, ctx.sky_max.load(Ordering::Acquire));
    Ok(chunk)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("generator panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("generator panicked: {s}")
    } else {
        "generator panicked".to_string()
    }
}
