// src/streaming/manager/stats.rs
use crate::streaming::types::StreamStats;
use super::TerrainStreamer;

pub fn stats(mgr: &mut TerrainStreamer) -> StreamStats {
    let mut s = StreamStats {
        workers: mgr.pool.size() as u32,
        cursor: mgr.pool.cursor() as u32,
        requested: mgr.requested,
        in_flight: mgr.in_flight as u32,
        done_backlog: mgr.pool.backlog() as u32,
        resident: mgr.scene.len() as u32,
        ..StreamStats::default()
    };

    // Drain timing window (only called on stats cadence)
    let w = mgr.timing.drain();

    s.built = w.builds_done;
    s.faulted = w.builds_faulted;
    s.rejected = w.builds_rejected;

    if w.builds_done > 0 {
        let n = w.builds_done as f64;

        s.queue_ms_avg = w.queue_ms_sum / n;
        s.queue_ms_max = w.queue_ms_max;

        s.build_ms_avg = w.build_ms_sum / n;
        s.build_ms_max = w.build_ms_max;

        s.bytes_avg = w.bytes_sum as f64 / n;
        s.bytes_max = w.bytes_max;
    }

    s
}
