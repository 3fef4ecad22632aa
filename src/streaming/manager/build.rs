// src/streaming/manager/build.rs
use std::collections::VecDeque;

use crate::config;
use crate::error::TerrainError;
use crate::scene::SceneGraph;
use crate::streaming::assembler::TileAssembler;
use crate::streaming::pool::WorkerPool;
use crate::streaming::types::BuildDone;

use super::{StreamTimingWindow, TerrainStreamer};

/// Everything a finished build touches; borrowed apart from the pool so the pool
/// can drain into it.
struct Landing<'a> {
    assembler: &'a TileAssembler,
    scene: &'a mut SceneGraph,
    in_flight: &'a mut usize,
    faults: &'a mut VecDeque<TerrainError>,
    timing: &'a mut StreamTimingWindow,
}

fn split(mgr: &mut TerrainStreamer) -> (&WorkerPool, Landing<'_>) {
    let TerrainStreamer { pool, assembler, scene, in_flight, faults, timing, .. } = mgr;
    let landing = Landing { assembler: &*assembler, scene, in_flight, faults, timing };
    (&*pool, landing)
}

impl Landing<'_> {
    fn push_fault(&mut self, e: TerrainError) {
        if self.faults.len() >= config::MAX_RETAINED_FAULTS {
            self.faults.pop_front();
        }
        self.faults.push_back(e);
    }

    fn land(&mut self, done: BuildDone) -> bool {
        let BuildDone { worker, outcome, queue_ms, build_ms } = done;
        *self.in_flight = self.in_flight.saturating_sub(1);

        let result = match outcome {
            Ok(r) => r,
            Err(e) => {
                log::error!("tile worker {worker}: {e}");
                self.timing.record_fault();
                self.push_fault(e);
                return false;
            }
        };

        let bytes = result.byte_len();
        match self.assembler.assemble_into(result, &mut *self.scene) {
            Ok(key) => {
                log::debug!("tile {key} assembled (worker {worker}, {build_ms:.1} ms)");
                self.timing.record_build(queue_ms, build_ms, bytes);
                true
            }
            Err(e) => {
                log::error!("dropping result from worker {worker}: {e}");
                self.timing.record_rejected();
                self.push_fault(e);
                false
            }
        }
    }
}

/// Drain finished builds (non-blocking), bounded per call so a large backlog
/// spreads over several frames.
pub fn harvest_done_builds(mgr: &mut TerrainStreamer) -> usize {
    let (pool, mut landing) = split(mgr);
    let mut inserted = 0usize;

    pool.drain(config::MAX_ASSEMBLIES_PER_PUMP, |done| {
        if landing.land(done) {
            inserted += 1;
        }
    });

    inserted
}

/// Process one result to completion. Returns true when a tile was inserted.
pub fn on_build_done(mgr: &mut TerrainStreamer, done: BuildDone) -> bool {
    let (_, mut landing) = split(mgr);
    landing.land(done)
}
