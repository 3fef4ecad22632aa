use std::sync::Arc;
use std::time::Duration;

use terrain_tiles::config::{MaterialVariant, TerrainConfig};
use terrain_tiles::error::{TerrainError, TerrainResult};
use terrain_tiles::streaming::{FlatRasterSource, RasterSource, TerrainStreamer};
use terrain_tiles::TileKey;

const WAIT: Duration = Duration::from_secs(30);

fn config(workers: usize) -> TerrainConfig {
    TerrainConfig {
        pool_size: Some(workers),
        material: MaterialVariant::Biome,
        ..TerrainConfig::default()
    }
}

fn flat_streamer(workers: usize) -> TerrainStreamer {
    TerrainStreamer::with_source(config(workers), Arc::new(FlatRasterSource::new(1200.0)))
}

#[test]
fn flat_tile_lands_at_its_placement() {
    let mut s = flat_streamer(3);
    s.request_tile(10, 546, 390, 64, 0, 800.0);
    assert!(s.pump_until_idle(WAIT));

    let key = TileKey::new(10, 546, 390, 0, 0, 800.0);
    let mesh = s.scene().get(&key.wire()).expect("tile in scene");

    let z0 = mesh.geometry.positions[0][2];
    assert!(mesh.geometry.positions.iter().all(|p| p[2] == z0));
    assert_eq!(mesh.translation, s.coords().placement_for(&key));
    assert_eq!(mesh.geometry.vertex_count(), 64 * 64);
    assert_eq!(mesh.geometry.indices.format(), wgpu::IndexFormat::Uint16);
}

#[test]
fn neighbours_are_one_tile_apart() {
    let mut s = flat_streamer(3);
    for (x, y) in [(546, 390), (547, 390), (546, 391)] {
        s.request_tile(10, x, y, 8, 0, 800.0);
    }
    assert!(s.pump_until_idle(WAIT));

    let at = |x: u32, y: u32| s.scene().get(&format!("10,{x},{y},0,0,800")).unwrap().translation;
    let here = at(546, 390);
    assert_eq!(at(547, 390) - here, glam::Vec3::new(800.0, 0.0, 0.0));
    assert_eq!(at(546, 391) - here, glam::Vec3::new(0.0, -800.0, 0.0));
}

#[test]
fn jobs_spread_round_robin() {
    let n = 4;
    let mut s = flat_streamer(n);
    assert_eq!(s.pool_size(), n);

    let workers: Vec<usize> = (0..(3 * n) as u32)
        .map(|i| s.request_tile(10, 540 + i, 390, 4, 0, 800.0))
        .collect();
    for (i, w) in workers.iter().enumerate() {
        assert_eq!(*w, i % n);
    }

    assert!(s.pump_until_idle(WAIT));
    assert_eq!(s.scene().len(), 3 * n);
}

struct FlakySource;

impl RasterSource for FlakySource {
    fn fetch(&self, _z: u32, x: u32, _y: u32) -> TerrainResult<Vec<u8>> {
        if x % 2 == 0 {
            panic!("corrupt tile {x}");
        }
        Err(TerrainError::fetch("offline"))
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[test]
fn faults_are_reported_and_workers_survive() {
    let mut s = TerrainStreamer::with_source(config(1), Arc::new(FlakySource));
    for x in 0..4 {
        s.request_tile(10, x, 0, 4, 0, 800.0);
    }
    assert!(s.pump_until_idle(WAIT));

    // odd tiles fall back to a flat raster, even tiles fault
    assert_eq!(s.scene().len(), 2);
    assert!(s.scene().contains("10,1,0,0,0,800"));

    let faults = s.take_faults();
    assert_eq!(faults.len(), 2);
    assert!(faults
        .iter()
        .all(|e| matches!(e, TerrainError::WorkerFault { worker: 0, .. })));

    let stats = s.stats();
    assert_eq!(stats.built, 2);
    assert_eq!(stats.faulted, 2);
}

#[test]
fn duplicate_requests_replace_the_node() {
    let mut s = flat_streamer(2);
    s.request_tile(10, 546, 390, 4, 0, 800.0);
    s.request_tile(10, 546, 390, 4, 0, 800.0);
    assert!(s.pump_until_idle(WAIT));

    assert_eq!(s.scene().len(), 1);
    assert_eq!(s.stats().built, 2);
}
