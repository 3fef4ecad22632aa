// src/streaming/pool.rs
//
// Fixed set of tile workers, fed by static round-robin. Every worker reports on one
// shared done channel that only the orchestrator drains.
//
// Known limitations:
// - no load feedback: a slow worker still gets 1/N of new jobs
// - no per-job cancellation: a dispatched job runs to completion while the pool lives
//
// Dropping the pool only waits for the jobs already being built; queued ones are skipped.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::error::TerrainError;
use crate::streaming::raster::RasterSource;
use crate::streaming::types::{BuildDone, BuildJob};
use crate::streaming::worker::spawn_worker;
use crate::tiles::TileJob;

struct WorkerHandle {
    tx_job: Sender<BuildJob>,
    handle: Option<JoinHandle<()>>,
}

pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    cursor: usize,
    // kept so jobs posted to a dead worker can still be reported as faults
    tx_done: Sender<BuildDone>,
    rx_done: Receiver<BuildDone>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) sharing one raster source.
    pub fn new(size: usize, source: Arc<dyn RasterSource>, exaggeration: f32) -> Self {
        let size = size.max(1);
        let (tx_done, rx_done) = unbounded::<BuildDone>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let workers = (0..size)
            .map(|id| {
                let (tx_job, rx_job) = unbounded::<BuildJob>();
                let handle = spawn_worker(
                    id,
                    rx_job,
                    tx_done.clone(),
                    source.clone(),
                    exaggeration,
                    shutdown.clone(),
                );
                WorkerHandle { tx_job, handle: Some(handle) }
            })
            .collect();

        log::info!("tile worker pool: {size} workers, raster source '{}'", source.name());

        Self { workers, cursor: 0, tx_done, rx_done, shutdown }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Worker the next dispatch goes to.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Fire-and-forget: post to the worker under the cursor, advance the cursor, and
    /// return that worker's index. Never waits on the worker.
    pub fn dispatch(&mut self, job: TileJob) -> usize {
        let id = self.cursor;
        self.cursor = (self.cursor + 1) % self.workers.len();

        let msg = BuildJob { job, enqueued_at: Instant::now() };
        if self.workers[id].tx_job.send(msg).is_err() {
            log::error!("tile worker {id} is gone; {} reported as fault", job.key());
            let _ = self.tx_done.send(BuildDone {
                worker: id,
                outcome: Err(TerrainError::WorkerFault {
                    worker: id,
                    key: job.key().wire(),
                    message: "worker thread exited".to_string(),
                }),
                queue_ms: 0.0,
                build_ms: 0.0,
            });
        }

        id
    }

    /// Results waiting to be assembled.
    #[inline]
    pub fn backlog(&self) -> usize {
        self.rx_done.len()
    }

    #[inline]
    pub fn try_recv(&self) -> Option<BuildDone> {
        self.rx_done.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<BuildDone> {
        match self.rx_done.recv_timeout(timeout) {
            Ok(done) => Some(done),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Hand up to `max` waiting results to `handler`, one at a time, on the calling
    /// thread. Returns how many were handled.
    pub fn drain<F>(&self, max: usize, mut handler: F) -> usize
    where
        F: FnMut(BuildDone),
    {
        let mut n = 0usize;
        while n < max {
            let Ok(done) = self.rx_done.try_recv() else { break; };
            handler(done);
            n += 1;
        }
        n
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Closing each job channel ends that worker's loop at its next receive.
        let handles: Vec<_> = self
            .workers
            .drain(..)
            .filter_map(|WorkerHandle { tx_job, handle }| {
                drop(tx_job);
                handle
            })
            .collect();

        for h in handles {
            let _ = h.join();
        }
    }
}
