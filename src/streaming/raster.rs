// src/streaming/raster.rs
//
// Elevation raster sources, addressed by {z}/{x}/{y}. Every source hands back a decoded
// DEM_RES x DEM_RES RGBA8 Terrarium raster.

use std::io::Read;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::config::{self, RasterBackend};
use crate::error::{TerrainError, TerrainResult};
use crate::streaming::dem;
use crate::tiles::coords::{tile_x_to_lon, tile_y_to_lat};

pub trait RasterSource: Send + Sync {
    fn fetch(&self, z: u32, x: u32, y: u32) -> TerrainResult<Vec<u8>>;

    fn name(&self) -> &'static str;
}

/// Build the source selected in config.
pub fn from_backend(backend: &RasterBackend) -> TerrainResult<Box<dyn RasterSource>> {
    Ok(match backend {
        RasterBackend::Http { base_url } => {
            Box::new(HttpRasterSource::new(base_url.clone(), config::NORMAL_URL.to_string())?)
        }
        RasterBackend::Procedural { seed } => Box::new(ProceduralRasterSource::new(*seed)),
        RasterBackend::Flat { elevation_m } => Box::new(FlatRasterSource::new(*elevation_m)),
    })
}

/// Decode an encoded image (PNG) into a full-size RGBA8 raster.
pub fn decode_raster(bytes: &[u8]) -> TerrainResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    if img.width() != config::DEM_RES || img.height() != config::DEM_RES {
        return Err(TerrainError::decode(format!(
            "raster is {}x{}, expected {}x{}",
            img.width(),
            img.height(),
            config::DEM_RES,
            config::DEM_RES
        )));
    }
    Ok(img.into_raw())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterKind {
    Elevation,
    /// Precomputed normal map from the parallel service. Not used by the mesh path.
    Normal,
}

pub struct HttpRasterSource {
    client: reqwest::blocking::Client,
    elevation_url: String,
    normal_url: String,
}

impl HttpRasterSource {
    pub fn new(elevation_url: String, normal_url: String) -> TerrainResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config::FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client, elevation_url, normal_url })
    }

    pub fn url(&self, kind: RasterKind, z: u32, x: u32, y: u32) -> String {
        let base = match kind {
            RasterKind::Elevation => &self.elevation_url,
            RasterKind::Normal => &self.normal_url,
        };
        format!("{}/{}/{}/{}.png", base.trim_end_matches('/'), z, x, y)
    }

    fn get(&self, url: &str) -> TerrainResult<Vec<u8>> {
        let mut response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(TerrainError::fetch(format!("{url}: status {}", response.status())));
        }
        let mut body = Vec::new();
        response.read_to_end(&mut body)?;
        Ok(body)
    }

    /// Decoded normal map for the tile (RGBA8).
    pub fn fetch_normal_map(&self, z: u32, x: u32, y: u32) -> TerrainResult<Vec<u8>> {
        let body = self.get(&self.url(RasterKind::Normal, z, x, y))?;
        decode_raster(&body)
    }
}

impl RasterSource for HttpRasterSource {
    fn fetch(&self, z: u32, x: u32, y: u32) -> TerrainResult<Vec<u8>> {
        let body = self.get(&self.url(RasterKind::Elevation, z, x, y))?;
        decode_raster(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Offline elevation from fractal noise over geographic coordinates, so neighbouring
/// tiles (and zoom levels) agree on shared edges.
pub struct ProceduralRasterSource {
    height: Fbm<Perlin>,
    detail: Fbm<Perlin>,
}

impl ProceduralRasterSource {
    pub fn new(seed: u32) -> Self {
        let height = Fbm::<Perlin>::new(seed).set_octaves(6).set_frequency(0.8);
        let detail = Fbm::<Perlin>::new(seed ^ 0xA5A5_A5A5).set_octaves(3).set_frequency(6.0);
        Self { height, detail }
    }

    #[inline]
    pub fn elevation_m(&self, lon_deg: f64, lat_deg: f64) -> f32 {
        let h0 = self.height.get([lon_deg, lat_deg]) as f32;
        let h1 = self.detail.get([lon_deg, lat_deg]) as f32;

        let base_m = 1800.0;
        let amp_m = 1600.0;
        (base_m + h0 * amp_m + h1 * 150.0).max(0.0)
    }
}

impl RasterSource for ProceduralRasterSource {
    fn fetch(&self, z: u32, x: u32, y: u32) -> TerrainResult<Vec<u8>> {
        let res = config::DEM_RES_USIZE;
        let mut out = Vec::with_capacity(config::DEM_BYTES);
        // Edge-inclusive: the last column/row lands on the neighbour's first one.
        let step = 1.0 / (res - 1) as f64;

        for py in 0..res {
            let lat = tile_y_to_lat(y as f64 + py as f64 * step, z);
            for px in 0..res {
                let lon = tile_x_to_lon(x as f64 + px as f64 * step, z);
                out.extend_from_slice(&dem::encode_terrarium(self.elevation_m(lon, lat)));
            }
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "procedural"
    }
}

pub struct FlatRasterSource {
    raster: Vec<u8>,
}

impl FlatRasterSource {
    pub fn new(elevation_m: f32) -> Self {
        Self { raster: dem::flat_dem(elevation_m) }
    }
}

impl RasterSource for FlatRasterSource {
    fn fetch(&self, _z: u32, _x: u32, _y: u32) -> TerrainResult<Vec<u8>> {
        Ok(self.raster.clone())
    }

    fn name(&self) -> &'static str {
        "flat"
    }
}
