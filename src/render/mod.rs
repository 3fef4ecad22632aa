pub mod gpu_types;
pub mod materials;
pub mod shaders;
pub mod texture;

pub use gpu_types::*;
pub use materials::{MaterialFactory, TerrainMaterial};
