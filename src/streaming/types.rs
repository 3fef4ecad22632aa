// src/streaming/types.rs
use std::time::Instant;

use crate::config;
use crate::error::{TerrainError, TerrainResult};
use crate::tiles::TileJob;

/// Job as queued on one worker's channel.
#[derive(Clone, Debug)]
pub struct BuildJob {
    pub job: TileJob,
    pub enqueued_at: Instant,
}

/// Binary payload a worker hands back. Every buffer is owned and moves with the
/// message; the worker keeps nothing.
#[derive(Clone, Debug)]
pub struct TileBuildResult {
    /// Wire form of the tile key.
    pub key: String,
    /// f32 xyz triples, native endian.
    pub positions: Vec<u8>,
    /// f32 xyz triples, native endian.
    pub normals: Vec<u8>,
    /// u16 or u32 triangle list, see `bytes_per_index`.
    pub indices: Vec<u8>,
    pub bytes_per_index: u8,
    /// DEM_RES x DEM_RES RGBA8 Terrarium raster.
    pub dem: Vec<u8>,
}

impl TileBuildResult {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / (3 * std::mem::size_of::<f32>())
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.positions.len() + self.normals.len() + self.indices.len() + self.dem.len()
    }
}

/// What comes back on the shared done channel.
pub struct BuildDone {
    pub worker: usize,
    pub outcome: TerrainResult<TileBuildResult>,
    pub queue_ms: f64,
    pub build_ms: f64,
}

/// Snapshot printed on the stats cadence. Timing fields cover the window since the
/// previous snapshot.
#[derive(Clone, Debug, Default)]
pub struct StreamStats {
    pub workers: u32,
    pub cursor: u32,

    pub requested: u64,
    pub in_flight: u32,
    pub done_backlog: u32,
    pub resident: u32,

    pub built: u32,
    pub faulted: u32,
    pub rejected: u32,

    pub queue_ms_avg: f64,
    pub queue_ms_max: f64,
    pub build_ms_avg: f64,
    pub build_ms_max: f64,

    pub bytes_avg: f64,
    pub bytes_max: usize,
}

/// 32-bit indices only when 16 bits can't address every vertex.
#[inline]
pub fn index_format_for(vertex_count: usize) -> wgpu::IndexFormat {
    if vertex_count > config::MAX_U16_VERTICES {
        wgpu::IndexFormat::Uint32
    } else {
        wgpu::IndexFormat::Uint16
    }
}

#[inline]
pub fn bytes_per_index(format: wgpu::IndexFormat) -> u8 {
    match format {
        wgpu::IndexFormat::Uint16 => 2,
        wgpu::IndexFormat::Uint32 => 4,
    }
}

pub fn index_format_from_bytes(bytes: u8) -> TerrainResult<wgpu::IndexFormat> {
    match bytes {
        2 => Ok(wgpu::IndexFormat::Uint16),
        4 => Ok(wgpu::IndexFormat::Uint32),
        other => Err(TerrainError::protocol(format!(
            "unsupported bytes_per_index {other}"
        ))),
    }
}
