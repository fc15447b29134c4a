use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use hashbrown::HashMap;
use loam_blocks::{Block, BlockKind, MAX_SKY_LIGHT};
use loam_chunk::{Chunk, Direction, TerrainGenerator};
use loam_lighting::{SkyLightScratch, compute_sky_light, rescale_sky_light};
use loam_save::{SaveError, WorldSave};
use loam_world::{ChunkCoord, ChunkDims, WorldConfig, chebyshev_xz, rings_within};
use rayon::prelude::*;

use crate::mesh::{MeshOwner, NullMeshOwner};
use crate::worker::{GenWorker, Stage, WorkerCtx, WorkerOut};
use crate::{ChunkState, EditError, Stats};

/// Owns the live chunk map and streams chunks in and out around an observer.
///
/// Only the thread calling [`ChunkManager::update`] touches loaded chunks.
/// Generation happens on one background worker; finished chunks are handed
/// back through a channel and installed here, never blocking.
pub struct ChunkManager<M: MeshOwner = NullMeshOwner> {
    dims: ChunkDims,
    render_distance: i32,
    requests_per_update: usize,
    installs_per_update: usize,
    chunks: HashMap<ChunkCoord, Chunk>,
    save: Arc<WorldSave>,
    worker: GenWorker,
    // Level chunks are lit at; the displayed maximum is rescaled from it.
    base_sky: u8,
    sky_max: Arc<AtomicU8>,
    mesh: M,
    center: Option<ChunkCoord>,
    // Load order for the current center, nearest first.
    desired: Vec<ChunkCoord>,
    cursor: usize,
    scratch: SkyLightScratch,
    stats: Stats,
}

impl<M: MeshOwner> ChunkManager<M> {
    pub fn new(
        config: &WorldConfig,
        generator: Arc<dyn TerrainGenerator>,
        save: Arc<WorldSave>,
        mesh: M,
    ) -> io::Result<Self> {
        let config = config.clone().sanitized();
        let dims = config.dims();
        let sky_max = Arc::new(AtomicU8::new(config.max_sky_light));
        let worker = GenWorker::spawn(WorkerCtx {
            generator,
            save: save.clone(),
            dims,
            base_sky: config.max_sky_light,
            sky_max: sky_max.clone(),
        })?;
        log::info!(
            "chunk manager: {}x{}x{} chunks, {} layer(s), render distance {}",
            dims.sx,
            dims.sy,
            dims.sz,
            dims.layers(),
            config.render_distance
        );
        Ok(Self {
            dims,
            render_distance: config.render_distance,
            requests_per_update: config.requests_per_update,
            installs_per_update: config.installs_per_update,
            chunks: HashMap::new(),
            save,
            worker,
            base_sky: config.max_sky_light,
            sky_max,
            mesh,
            center: None,
            desired: Vec::new(),
            cursor: 0,
            scratch: SkyLightScratch::new(),
            stats: Stats::default(),
        })
    }

    /// Advances streaming for an observer at world position (x, y, z).
    pub fn update(&mut self, x: f32, y: f32, z: f32) {
        let mut center = self
            .dims
            .chunk_of(x.floor() as i32, y.floor() as i32, z.floor() as i32);
        center.cy = center.cy.clamp(0, self.dims.layers() - 1);
        self.update_at(center);
    }

    /// Same as [`update`](Self::update) with the observer's chunk given directly.
    pub fn update_at(&mut self, center: ChunkCoord) {
        if self.center != Some(center) {
            self.recenter(center);
        }
        self.drain_ready(center);
        self.request_missing();
        self.save.autosave_tick();
        debug_assert!(self.links_are_symmetric(), "neighbour links out of sync");
    }

    fn recenter(&mut self, center: ChunkCoord) {
        self.center = Some(center);
        self.desired = desired_coords(&self.dims, center, self.render_distance);
        self.cursor = 0;

        let keep = self.render_distance + 1;
        let mut doomed: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|c| chebyshev_xz(*c, center) > keep)
            .collect();
        doomed.sort_unstable();
        for coord in doomed {
            self.evict(coord);
        }
    }

    fn is_desired(&self, coord: ChunkCoord, center: ChunkCoord) -> bool {
        chebyshev_xz(coord, center) <= self.render_distance && self.dims.contains_layer(coord.cy)
    }

    fn drain_ready(&mut self, center: ChunkCoord) {
        for _ in 0..self.installs_per_update {
            let Some(out) = self.worker.try_next() else {
                break;
            };
            match out {
                WorkerOut::Ready(chunk) => {
                    let coord = chunk.coord();
                    self.worker.release(coord);
                    if self.is_desired(coord, center) {
                        self.install(chunk);
                    } else {
                        self.stats.discarded += 1;
                        log::debug!("discarding late chunk {coord:?}");
                    }
                }
                WorkerOut::Failed { coord, error } => {
                    self.worker.release(coord);
                    self.stats.failed += 1;
                    log::error!("generating chunk {coord:?} failed: {error}");
                    if let Some(i) = self.desired.iter().position(|c| *c == coord) {
                        self.cursor = self.cursor.min(i);
                    }
                }
            }
        }
    }

    fn request_missing(&mut self) {
        let mut sent = 0;
        while sent < self.requests_per_update && self.cursor < self.desired.len() {
            let coord = self.desired[self.cursor];
            self.cursor += 1;
            if self.chunks.contains_key(&coord) || self.worker.stage(coord).is_some() {
                continue;
            }
            if self.worker.request(coord) {
                sent += 1;
                self.stats.requested += 1;
            }
        }
    }

    fn install(&mut self, mut chunk: Chunk) {
        let coord = chunk.coord();
        debug_assert!(!self.chunks.contains_key(&coord), "chunk {coord:?} installed twice");
        if self.chunks.contains_key(&coord) {
            log::warn!("dropping duplicate chunk {coord:?}");
            return;
        }
        let sky = self.sky_max.load(Ordering::Acquire);
        if chunk.light_max() != sky {
            rescale_sky_light(&mut chunk, sky);
        }
        for &dir in Direction::for_dims(&self.dims) {
            let n = step(coord, dir);
            if let Some(other) = self.chunks.get_mut(&n) {
                debug_assert!(other.neighbor(dir.opposite()).is_none());
                other.link(dir.opposite(), coord);
                chunk.link(dir, n);
            }
        }
        self.chunks.insert(coord, chunk);
        self.stats.installed += 1;
        log::debug!("installed chunk {coord:?}");

        if let Some(c) = self.chunks.get(&coord) {
            self.mesh.on_chunk_installed(c, &self.chunks);
        }
        for n in mesh_neighbors(&self.dims, coord) {
            if let Some(c) = self.chunks.get(&n) {
                self.mesh.on_chunk_neighbors_changed(c, &self.chunks);
            }
        }
    }

    fn evict(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get(&coord) else {
            return;
        };
        self.mesh.on_chunk_evicted(chunk);
        let links: Vec<(Direction, ChunkCoord)> = chunk.linked().collect();
        for &(dir, n) in &links {
            if let Some(other) = self.chunks.get_mut(&n) {
                let back = other.unlink(dir.opposite());
                debug_assert_eq!(back, Some(coord));
            }
        }
        self.chunks.remove(&coord);
        self.stats.evicted += 1;
        log::debug!("evicted chunk {coord:?}");

        // Border faces of surviving neighbours now face an unloaded chunk.
        let keep = self.render_distance + 1;
        for (_, n) in links {
            let survives = self.center.is_none_or(|c| chebyshev_xz(n, c) <= keep);
            if !survives {
                continue;
            }
            if let Some(c) = self.chunks.get(&n) {
                self.mesh.on_chunk_neighbors_changed(c, &self.chunks);
            }
        }
    }

    /// Block at a world position, or `None` when its chunk is not loaded.
    pub fn get_block_at(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        let coord = self.dims.chunk_of(wx, wy, wz);
        let chunk = self.chunks.get(&coord)?;
        Some(chunk.get_world(&self.chunks, wx, wy, wz))
    }

    /// Edits a loaded voxel, records it for persistence and relights its chunk.
    pub fn set_block_at(
        &mut self,
        wx: i32,
        wy: i32,
        wz: i32,
        kind: BlockKind,
    ) -> Result<(), EditError> {
        if wy < 0 || wy >= self.dims.world_height() {
            return Err(EditError::OutOfRange { x: wx, y: wy, z: wz });
        }
        let coord = self.dims.chunk_of(wx, wy, wz);
        if !self.chunks.contains_key(&coord) {
            return Err(EditError::NotLoaded(coord));
        }
        if let Err(e) = self.save.record_override(wx, wy, wz, kind) {
            return Err(match e {
                SaveError::OutOfRange { x, y, z } => EditError::OutOfRange { x, y, z },
                other => EditError::Save(other),
            });
        }

        let (lx, ly, lz) = self.dims.local_of(coord, wx, wy, wz);
        let sky = self.sky_max.load(Ordering::Acquire);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return Err(EditError::NotLoaded(coord));
        };
        chunk.set_local(lx, ly, lz, kind);
        compute_sky_light(chunk, self.base_sky, &mut self.scratch);
        rescale_sky_light(chunk, sky);

        if let Some(c) = self.chunks.get(&coord) {
            self.mesh.on_chunk_modified(c, &self.chunks);
        }
        for dir in border_directions(&self.dims, lx, ly, lz) {
            if let Some(c) = self.chunks.get(&step(coord, dir)) {
                self.mesh.on_chunk_neighbors_changed(c, &self.chunks);
            }
        }
        Ok(())
    }

    /// Changes the global sky maximum (day/night) and rescales every loaded chunk.
    pub fn set_sky_brightness(&mut self, level: u8) {
        let level = level.clamp(1, MAX_SKY_LIGHT);
        if self.sky_max.swap(level, Ordering::AcqRel) == level {
            return;
        }
        self.chunks
            .par_values_mut()
            .for_each(|chunk| rescale_sky_light(chunk, level));
        for chunk in self.chunks.values() {
            self.mesh.on_chunk_neighbors_changed(chunk, &self.chunks);
        }
        log::info!("sky brightness set to {level}");
    }

    pub fn sky_brightness(&self) -> u8 {
        self.sky_max.load(Ordering::Acquire)
    }

    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        if self.chunks.contains_key(&coord) {
            return ChunkState::Loaded;
        }
        match self.worker.stage(coord) {
            Some(Stage::Queued) => ChunkState::Queued,
            Some(Stage::Generating) => ChunkState::Generating,
            Some(Stage::Ready) => ChunkState::Ready,
            None => ChunkState::Unloaded,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            loaded: self.chunks.len(),
            pending: self.worker.pending(),
            ..self.stats
        }
    }

    /// Every link points at the adjacent coordinate and is mirrored, and
    /// every pair of adjacent loaded chunks is linked.
    pub fn links_are_symmetric(&self) -> bool {
        self.chunks.values().all(|chunk| {
            let coord = chunk.coord();
            let slots_ok = chunk.linked().all(|(dir, n)| {
                n == step(coord, dir)
                    && self
                        .chunks
                        .get(&n)
                        .is_some_and(|o| o.neighbor(dir.opposite()) == Some(coord))
            });
            let complete = Direction::for_dims(&self.dims).iter().all(|&dir| {
                self.chunks.contains_key(&step(coord, dir)) == chunk.neighbor(dir).is_some()
            });
            slots_ok && complete
        })
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> &HashMap<ChunkCoord, Chunk> {
        &self.chunks
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Loaded coordinates in sorted order.
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut v: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        v.sort_unstable();
        v
    }

    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    pub fn save(&self) -> &Arc<WorldSave> {
        &self.save
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut M {
        &mut self.mesh
    }

    /// Stops the worker and writes all edits to disk.
    pub fn shutdown(&mut self) -> Result<(), SaveError> {
        self.worker.shutdown();
        self.save.flush()?;
        log::info!("world saved ({} overrides)", self.save.len());
        Ok(())
    }
}

#[inline]
fn step(coord: ChunkCoord, dir: Direction) -> ChunkCoord {
    let (dx, dy, dz) = dir.offset();
    coord.offset(dx, dy, dz)
}

/// Coordinates within render distance of `center`, nearest first. With
/// stacked layers, each column is ordered by vertical distance to the observer.
fn desired_coords(dims: &ChunkDims, center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
    let rings = rings_within(center.with_y(0), radius);
    if !dims.is_vertical() {
        return rings;
    }
    let layers = dims.layers();
    let mut out = Vec::with_capacity(rings.len() * layers as usize);
    for c in rings {
        out.extend((0..layers).map(|cy| c.with_y(cy)));
    }
    out.sort_by_key(|c| (chebyshev_xz(*c, center), (c.cy - center.cy).abs()));
    out
}

/// Chunks whose meshes can change when `coord` appears: the eight
/// surrounding columns in the flat layout, the six face neighbours otherwise.
fn mesh_neighbors(dims: &ChunkDims, coord: ChunkCoord) -> Vec<ChunkCoord> {
    if dims.is_vertical() {
        return Direction::ALL.iter().map(|&d| step(coord, d)).collect();
    }
    let mut out = Vec::with_capacity(8);
    for dz in -1..=1 {
        for dx in -1..=1 {
            if dx != 0 || dz != 0 {
                out.push(coord.offset(dx, 0, dz));
            }
        }
    }
    out
}

/// Directions whose neighbour shares a face with local voxel (x, y, z).
fn border_directions(dims: &ChunkDims, x: i32, y: i32, z: i32) -> Vec<Direction> {
    let (sx, sy, sz) = (dims.sx as i32, dims.sy as i32, dims.sz as i32);
    Direction::for_dims(dims)
        .iter()
        .copied()
        .filter(|dir| match dir {
            Direction::West => x == 0,
            Direction::East => x == sx - 1,
            Direction::North => z == 0,
            Direction::South => z == sz - 1,
            Direction::Down => y == 0,
            Direction::Up => y == sy - 1,
        })
        .collect()
}
