// Slippy-map tile addressing + world placement.

pub mod coords;
pub mod key;

pub use coords::TileCoordinateSystem;
pub use key::{TileJob, TileKey};
