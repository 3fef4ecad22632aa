// src/streaming/mod.rs
// Tile build workers + orchestrator-side assembly.

pub mod assembler;
pub mod dem;
pub mod manager;
pub mod mesh;
pub mod pool;
pub mod raster;
pub mod types;
pub mod worker;

pub use assembler::TileAssembler;
pub use manager::TerrainStreamer;
pub use pool::WorkerPool;
pub use raster::{FlatRasterSource, HttpRasterSource, ProceduralRasterSource, RasterSource};
pub use types::{StreamStats, TileBuildResult};
