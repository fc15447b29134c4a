//! Sparse store of player edits that survive chunk eviction and restarts.
#![forbid(unsafe_code)]

pub mod format;
pub mod key;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use loam_blocks::BlockKind;
use loam_world::{ChunkCoord, ChunkDims};

pub use format::Record;
pub use key::{pack, unpack};

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("save file is corrupt: {reason}")]
    Corrupt { reason: String },
    #[error("position ({x}, {y}, {z}) cannot be stored in a packed key")]
    OutOfRange { x: i32, y: i32, z: i32 },
}

struct SaveState {
    overrides: HashMap<u64, BlockKind>,
    dirty: bool,
    last_write: Instant,
}

/// Override map plus the bookkeeping for periodic writes.
///
/// Shared between the update thread (edits, autosave) and the generation
/// worker (reads while building chunks); all state sits behind one mutex.
pub struct WorldSave {
    path: Option<PathBuf>,
    autosave_interval: Duration,
    state: Mutex<SaveState>,
    // Serializes snapshot + write so an older snapshot never lands after a newer one.
    io_lock: Mutex<()>,
}

impl WorldSave {
    /// Opens the save at `path`, replaying any existing records. A missing
    /// file starts a fresh world; an unreadable one is logged and ignored.
    pub fn open(path: impl Into<PathBuf>, autosave_interval: Duration) -> Self {
        let path = path.into();
        let mut overrides = HashMap::new();
        match format::read_records(&path) {
            Ok(records) => {
                for ((x, y, z), kind) in records {
                    match key::pack(x, y, z) {
                        Some(k) => {
                            overrides.insert(k, kind);
                        }
                        None => log::warn!("skipping out-of-range override at ({x}, {y}, {z})"),
                    }
                }
                log::info!("loaded {} overrides from {}", overrides.len(), path.display());
            }
            Err(e) => {
                log::warn!("ignoring save file {}: {e}", path.display());
            }
        }
        Self::with_state(Some(path), autosave_interval, overrides)
    }

    /// A store with no backing file; flushes succeed without touching disk.
    pub fn in_memory(autosave_interval: Duration) -> Self {
        Self::with_state(None, autosave_interval, HashMap::new())
    }

    fn with_state(
        path: Option<PathBuf>,
        autosave_interval: Duration,
        overrides: HashMap<u64, BlockKind>,
    ) -> Self {
        Self {
            path,
            autosave_interval,
            state: Mutex::new(SaveState {
                overrides,
                dirty: false,
                last_write: Instant::now(),
            }),
            io_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SaveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval
    }

    /// Remembers `kind` at a world position, replacing any earlier value.
    pub fn record_override(
        &self,
        x: i32,
        y: i32,
        z: i32,
        kind: BlockKind,
    ) -> Result<(), SaveError> {
        let k = key::pack(x, y, z).ok_or(SaveError::OutOfRange { x, y, z })?;
        let mut st = self.lock();
        st.overrides.insert(k, kind);
        st.dirty = true;
        Ok(())
    }

    pub fn lookup_override(&self, x: i32, y: i32, z: i32) -> Option<BlockKind> {
        let k = key::pack(x, y, z)?;
        self.lock().overrides.get(&k).copied()
    }

    /// Every override whose position falls inside `coord` under `dims`.
    pub fn overrides_in_chunk(&self, coord: ChunkCoord, dims: ChunkDims) -> Vec<Record> {
        let st = self.lock();
        st.overrides
            .iter()
            .map(|(&k, &kind)| (key::unpack(k), kind))
            .filter(|&((x, y, z), _)| {
                dims.chunk_of(x, y, z) == coord && in_vertical_span(dims, coord, y)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Writes the full override set and clears the dirty flag.
    pub fn flush(&self) -> Result<(), SaveError> {
        self.write_snapshot(Instant::now())
    }

    /// Writes if dirty and the autosave interval has elapsed since the last
    /// successful write. Returns whether a write happened. Failures are logged
    /// and leave both the dirty flag and the last write time alone, so the
    /// next tick retries.
    pub fn autosave_tick(&self) -> bool {
        self.autosave_tick_at(Instant::now())
    }

    pub fn autosave_tick_at(&self, now: Instant) -> bool {
        {
            let st = self.lock();
            if !st.dirty || now.saturating_duration_since(st.last_write) < self.autosave_interval {
                return false;
            }
        }
        match self.write_snapshot(now) {
            Ok(()) => {
                log::debug!("autosaved {} overrides", self.len());
                true
            }
            Err(e) => {
                log::warn!("autosave failed: {e}");
                false
            }
        }
    }

    fn write_snapshot(&self, now: Instant) -> Result<(), SaveError> {
        let _io = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<Record> = {
            let mut st = self.lock();
            st.dirty = false;
            st.overrides
                .iter()
                .map(|(&k, &kind)| (key::unpack(k), kind))
                .collect()
        };
        if let Some(path) = &self.path {
            records.sort_unstable_by_key(|&(pos, _)| pos);
            if let Err(e) = format::write_records(path, &records) {
                self.lock().dirty = true;
                return Err(e);
            }
        }
        self.lock().last_write = now;
        Ok(())
    }
}

// Flat chunks span the whole world height, so y outside it never belongs to them.
fn in_vertical_span(dims: ChunkDims, coord: ChunkCoord, y: i32) -> bool {
    let (_, oy, _) = dims.origin(coord);
    y >= oy && y < oy + dims.sy as i32
}
