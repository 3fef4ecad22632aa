// src/main.rs
// Streams the tiles around the anchor, logging pipeline stats until they are all in.

use std::time::{Duration, Instant};

use terrain_tiles::config::{self, MaterialVariant, RasterBackend, TerrainConfig};
use terrain_tiles::streaming::StreamStats;
use terrain_tiles::{TerrainResult, TerrainStreamer};

// Tiles requested on each side of the anchor tile.
const RING_RADIUS: i64 = 2;
const RUN_TIMEOUT: Duration = Duration::from_secs(120);

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("yes") | Ok("on")
    )
}

fn config_from_env() -> TerrainConfig {
    let mut cfg = TerrainConfig::default();

    if let Ok(v) = std::env::var("TERRAIN_WORKERS") {
        match v.parse::<usize>() {
            Ok(n) => cfg.pool_size = Some(n),
            Err(e) => log::warn!("ignoring TERRAIN_WORKERS={v:?}: {e}"),
        }
    }
    if env_flag("TERRAIN_OFFLINE") {
        cfg.raster = RasterBackend::Procedural { seed: 1337 };
    }
    if env_flag("TERRAIN_WIREFRAME") {
        cfg.material = MaterialVariant::Wireframe;
    }

    cfg
}

fn log_stats(s: &StreamStats) {
    log::info!(
        "tiles: resident={} in_flight={} backlog={} | window: built={} faulted={} rejected={} | \
         queue avg/max {:.1}/{:.1} ms | build avg/max {:.1}/{:.1} ms | payload avg/max {:.0}/{} B",
        s.resident,
        s.in_flight,
        s.done_backlog,
        s.built,
        s.faulted,
        s.rejected,
        s.queue_ms_avg,
        s.queue_ms_max,
        s.build_ms_avg,
        s.build_ms_max,
        s.bytes_avg,
        s.bytes_max,
    );
}

fn main() -> TerrainResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = config_from_env();
    log::info!("config: {cfg:?}");
    let mut streamer = TerrainStreamer::new(cfg)?;

    let zoom = config::REFERENCE_ZOOM;
    let (ax, ay) = streamer.coords().anchor_tile(zoom);
    for dy in -RING_RADIUS..=RING_RADIUS {
        for dx in -RING_RADIUS..=RING_RADIUS {
            let (x, y) = (ax + dx, ay + dy);
            if x < 0 || y < 0 {
                continue;
            }
            streamer.request_tile(
                zoom,
                x as u32,
                y as u32,
                config::DEFAULT_SEGMENTS,
                0,
                config::DEFAULT_TILE_SIZE,
            );
        }
    }

    let start = Instant::now();
    let mut last_print = Instant::now();
    while streamer.in_flight() > 0 && start.elapsed() < RUN_TIMEOUT {
        if streamer.pump() == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }
        if last_print.elapsed() >= config::STATS_PRINT_EVERY {
            log_stats(&streamer.stats());
            last_print = Instant::now();
        }
    }

    log_stats(&streamer.stats());
    for e in streamer.take_faults() {
        log::warn!("{e}");
    }
    if streamer.in_flight() > 0 {
        log::warn!("{} tiles still in flight after {:?}", streamer.in_flight(), RUN_TIMEOUT);
    }

    log::info!(
        "{} tiles in scene around anchor tile {zoom}/{ax}/{ay} ({:.2}s)",
        streamer.scene().len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
