// src/lib.rs
// Terrain tile pipeline: slippy-map elevation tiles built on worker threads,
// assembled into scene meshes on the orchestrator thread.

pub mod config;
pub mod error;
pub mod render;
pub mod scene;
pub mod streaming;
pub mod tiles;

pub use config::{MaterialVariant, RasterBackend, TerrainConfig};
pub use error::{TerrainError, TerrainResult};
pub use scene::{SceneGraph, SceneSink, TileMesh};
pub use streaming::TerrainStreamer;
pub use tiles::{TileCoordinateSystem, TileJob, TileKey};
