// src/config.rs
// -------------
// Global config knobs for tile streaming + assembly.

use std::time::Duration;

// Anchor point every tile placement is aligned to (Chamonix).
pub const ANCHOR_LON_DEG: f64 = 7.3087;
pub const ANCHOR_LAT_DEG: f64 = 45.8671;

// Zoom at which the anchor is converted to tile coordinates.
pub const REFERENCE_ZOOM: u32 = 10;

// Elevation rasters are always square at this resolution.
pub const DEM_RES: u32 = 256;
pub const DEM_RES_USIZE: usize = DEM_RES as usize;

// dem is stored RGBA8 so it uploads as-is.
pub const DEM_BYTES_PER_PIXEL: usize = 4;
pub const DEM_BYTES: usize = DEM_RES_USIZE * DEM_RES_USIZE * DEM_BYTES_PER_PIXEL;

// Largest vertex count still addressable with 16-bit indices.
pub const MAX_U16_VERTICES: usize = 65_536;

// Worker pool sizing: max(cores - 1, MIN_WORKERS).
pub const MIN_WORKERS: usize = 3;

// Terrarium encoding offset (meters).
pub const TERRARIUM_OFFSET_M: f32 = 32768.0;

pub const ELEVATION_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";
pub const NORMAL_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/normal";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Equatorial circumference (meters), used for ground tile widths.
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

// Default edge length of a tile in world units.
pub const DEFAULT_TILE_SIZE: f32 = 800.0;
pub const DEFAULT_SEGMENTS: u32 = 64;

// Shared biome texture resolution (square, wrap-repeat).
pub const BIOME_TEX_RES: u32 = 64;
pub const COLOR_RAMP_RES: u32 = 256;

// Upper bound of results assembled per pump() so a backlog can't stall a frame.
pub const MAX_ASSEMBLIES_PER_PUMP: usize = 32;

// Most recent faults kept for take_faults(); older ones only survive as counters.
pub const MAX_RETAINED_FAULTS: usize = 256;

pub const STATS_PRINT_EVERY: Duration = Duration::from_millis(2000);

/// Which raster backend workers fetch elevation from.
#[derive(Clone, Debug, PartialEq)]
pub enum RasterBackend {
    /// Terrarium PNG tiles over HTTP.
    Http { base_url: String },
    /// Offline fractal noise, encoded as Terrarium.
    Procedural { seed: u32 },
    /// Uniform elevation everywhere (meters).
    Flat { elevation_m: f32 },
}

/// Material variant chosen once, when the factory is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialVariant {
    /// Diagnostic: raw elevation texture + color ramp, drawn as wireframe.
    Wireframe,
    /// Production: biome textures blended by elevation/slope + color ramp.
    Biome,
}

/// Runtime configuration for the streamer.
#[derive(Clone, Debug)]
pub struct TerrainConfig {
    /// Number of workers (None = derive from available parallelism).
    pub pool_size: Option<usize>,
    pub raster: RasterBackend,
    pub material: MaterialVariant,
    /// Multiplier applied on top of the true meters -> world units scale.
    pub vertical_exaggeration: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            pool_size: None,
            raster: RasterBackend::Http { base_url: ELEVATION_URL.to_string() },
            material: MaterialVariant::Biome,
            vertical_exaggeration: 1.0,
        }
    }
}

impl TerrainConfig {
    /// Resolve the worker count, never below 1.
    pub fn resolved_pool_size(&self) -> usize {
        match self.pool_size {
            Some(n) => n.max(1),
            None => {
                let hw = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(0);
                pool_size_for(hw)
            }
        }
    }
}

/// max(hardware_threads - 1, MIN_WORKERS); also covers platforms reporting 0 or 1 cores.
#[inline]
pub fn pool_size_for(hardware_threads: usize) -> usize {
    hardware_threads.saturating_sub(1).max(MIN_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_leaves_one_core_for_the_orchestrator() {
        assert_eq!(pool_size_for(8), 7);
        assert_eq!(pool_size_for(16), 15);
    }

    #[test]
    fn pool_size_has_a_floor() {
        assert_eq!(pool_size_for(0), MIN_WORKERS);
        assert_eq!(pool_size_for(1), MIN_WORKERS);
        assert_eq!(pool_size_for(4), MIN_WORKERS);
    }

    #[test]
    fn explicit_pool_size_is_clamped() {
        let cfg = TerrainConfig { pool_size: Some(0), ..Default::default() };
        assert_eq!(cfg.resolved_pool_size(), 1);

        let cfg = TerrainConfig { pool_size: Some(5), ..Default::default() };
        assert_eq!(cfg.resolved_pool_size(), 5);
    }

    #[test]
    fn dem_byte_size_matches_raster() {
        assert_eq!(DEM_BYTES, 256 * 256 * 4);
    }
}
