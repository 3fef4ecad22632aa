// src/streaming/manager/mod.rs
// ----------------------------
// Bootstrapping owner of the pipeline: worker pool + assembler + scene graph.
//
// Behavior:
// - request_tile() posts a job and returns at once.
// - pump() harvests finished builds on the calling thread and inserts them.
// - Tiles stay in the scene until remove_tile() is called for their key.

mod build;
mod stats;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TerrainConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::scene::{SceneGraph, SceneSink, TileMesh};
use crate::streaming::assembler::TileAssembler;
use crate::streaming::pool::WorkerPool;
use crate::streaming::raster::{self, RasterSource};
use crate::streaming::types::StreamStats;
use crate::tiles::{TileCoordinateSystem, TileJob};

pub struct TerrainStreamer {
    pub(crate) pool: WorkerPool,
    pub(crate) assembler: TileAssembler,
    pub(crate) scene: SceneGraph,

    pub(crate) in_flight: usize,
    pub(crate) requested: u64,

    // Most recent errors since the last take_faults(), capped at MAX_RETAINED_FAULTS.
    pub(crate) faults: VecDeque<TerrainError>,

    // Build timing window (drained on stats() print cadence)
    pub timing: StreamTimingWindow,
}

impl TerrainStreamer {
    pub fn new(config: TerrainConfig) -> TerrainResult<Self> {
        let source: Arc<dyn RasterSource> = Arc::from(raster::from_backend(&config.raster)?);
        Ok(Self::with_source(config, source))
    }

    /// Same as `new`, with a caller-provided raster source (config.raster is ignored).
    pub fn with_source(config: TerrainConfig, source: Arc<dyn RasterSource>) -> Self {
        let exaggeration = config.vertical_exaggeration;
        let pool = WorkerPool::new(config.resolved_pool_size(), source, exaggeration);
        let assembler = TileAssembler::new(
            TileCoordinateSystem::default(),
            config.material,
            config.vertical_exaggeration,
        );

        Self {
            pool,
            assembler,
            scene: SceneGraph::new(),
            in_flight: 0,
            requested: 0,
            faults: VecDeque::new(),
            timing: StreamTimingWindow::default(),
        }
    }

    /// Queue one tile build. Returns the worker it went to.
    pub fn request_tile(
        &mut self,
        z: u32,
        x: u32,
        y: u32,
        segments: u32,
        subdivision: u32,
        size: f32,
    ) -> usize {
        self.request_job(TileJob::new(z, x, y, segments, subdivision, size))
    }

    pub fn request_job(&mut self, job: TileJob) -> usize {
        self.in_flight += 1;
        self.requested += 1;
        self.pool.dispatch(job)
    }

    /// Cheap per-frame maintenance: assemble what finished, never wait.
    /// Returns how many tiles were inserted.
    pub fn pump(&mut self) -> usize {
        build::harvest_done_builds(self)
    }

    /// Block until every requested tile has come back or `timeout` runs out.
    /// Returns true when nothing is left in flight.
    pub fn pump_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while self.in_flight > 0 {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let Some(done) = self.pool.recv_timeout(deadline - now) else { break; };
            build::on_build_done(self, done);
            build::harvest_done_builds(self);
        }

        self.in_flight == 0
    }

    /// Drop a tile from the scene. Nothing is evicted any other way.
    pub fn remove_tile(&mut self, key: &str) -> Option<TileMesh> {
        self.scene.remove_node(key)
    }

    #[inline]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[inline]
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    #[inline]
    pub fn coords(&self) -> &TileCoordinateSystem {
        self.assembler.coords()
    }

    /// Worker faults and rejected payloads since the last call, oldest first.
    ///
    /// Only the latest `config::MAX_RETAINED_FAULTS` are kept between calls; every
    /// fault is still counted in `stats()`.
    pub fn take_faults(&mut self) -> Vec<TerrainError> {
        self.faults.drain(..).collect()
    }

    pub fn stats(&mut self) -> StreamStats {
        stats::stats(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StreamTimingWindow {
    pub builds_done: u32,
    pub builds_faulted: u32,
    pub builds_rejected: u32,

    pub queue_ms_sum: f64,
    pub queue_ms_max: f64,

    pub build_ms_sum: f64,
    pub build_ms_max: f64,

    pub bytes_sum: u64,
    pub bytes_max: usize,
}

impl StreamTimingWindow {
    #[inline]
    pub fn record_build(&mut self, queue_ms: f64, build_ms: f64, bytes: usize) {
        self.builds_done += 1;

        self.queue_ms_sum += queue_ms;
        self.queue_ms_max = self.queue_ms_max.max(queue_ms);

        self.build_ms_sum += build_ms;
        self.build_ms_max = self.build_ms_max.max(build_ms);

        self.bytes_sum += bytes as u64;
        self.bytes_max = self.bytes_max.max(bytes);
    }

    #[inline]
    pub fn record_fault(&mut self) {
        self.builds_faulted += 1;
    }

    #[inline]
    pub fn record_rejected(&mut self) {
        self.builds_rejected += 1;
    }

    #[inline]
    pub fn drain(&mut self) -> Self {
        std::mem::take(self)
    }
}
