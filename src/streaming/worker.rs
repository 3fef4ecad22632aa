// src/streaming/worker.rs
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::error::TerrainError;
use crate::streaming::dem;
use crate::streaming::mesh::build_tile;
use crate::streaming::raster::RasterSource;
use crate::streaming::types::{BuildDone, BuildJob, TileBuildResult};
use crate::tiles::{TileCoordinateSystem, TileJob, TileKey};

/// Meters -> world units, one factor per zoom and size (see
/// [`TileCoordinateSystem::vertical_scale`]).
#[inline]
pub fn vertical_scale(key: &TileKey, exaggeration: f32) -> f32 {
    TileCoordinateSystem::default().vertical_scale(key, exaggeration)
}

/// Fetch + build one tile. A failed fetch falls back to a zero-filled raster.
pub fn run_job(source: &dyn RasterSource, job: &TileJob, exaggeration: f32) -> TileBuildResult {
    let dem = match source.fetch(job.z, job.x, job.y) {
        Ok(dem) => dem,
        Err(e) => {
            log::warn!(
                "{} raster {}/{}/{} unavailable ({e}); building flat tile",
                source.name(),
                job.z,
                job.x,
                job.y
            );
            dem::zeroed_dem()
        }
    };

    build_tile(job, dem, vertical_scale(&job.key(), exaggeration))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One dedicated builder thread draining its own FIFO job channel. Exits when the
/// job channel closes, nobody listens for results anymore, or `shutdown` is raised
/// (jobs still queued at that point are dropped unbuilt).
pub fn spawn_worker(
    id: usize,
    rx_job: Receiver<BuildJob>,
    tx_done: Sender<BuildDone>,
    source: Arc<dyn RasterSource>,
    exaggeration: f32,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(format!("tile-build-{}", id))
        .spawn(move || {
            log::debug!("tile worker {id} started ({})", source.name());

            while let Ok(BuildJob { job, enqueued_at }) = rx_job.recv() {
                if shutdown.load(Ordering::Relaxed) {
                    let skipped = rx_job.len() + 1;
                    log::debug!("tile worker {id} shutting down, {skipped} jobs skipped");
                    break;
                }

                let t_start = Instant::now();
                let queue_ms = (t_start - enqueued_at).as_secs_f64() * 1000.0;

                let built = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_job(source.as_ref(), &job, exaggeration)
                }));

                let outcome = built.map_err(|payload| {
                    let message = panic_message(payload.as_ref());
                    log::error!("tile worker {id} faulted on {}: {message}", job.key());
                    TerrainError::WorkerFault {
                        worker: id,
                        key: job.key().wire(),
                        message,
                    }
                });

                let build_ms = t_start.elapsed().as_secs_f64() * 1000.0;
                let done = BuildDone { worker: id, outcome, queue_ms, build_ms };
                if tx_done.send(done).is_err() {
                    break;
                }
            }

            log::debug!("tile worker {id} stopped");
        })
        .expect("failed to spawn tile worker thread")
}
