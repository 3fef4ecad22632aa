// src/streaming/dem.rs
//
// Terrarium-encoded elevation rasters (DEM_RES x DEM_RES, RGBA8, row-major, row 0 = north).
// elevation_m = R * 256 + G + B / 256 - 32768

use crate::config;

/// Zero-filled raster; decodes to a flat tile at -32768 m.
pub fn zeroed_dem() -> Vec<u8> {
    vec![0u8; config::DEM_BYTES]
}

#[inline]
pub fn decode_terrarium(r: u8, g: u8, b: u8) -> f32 {
    r as f32 * 256.0 + g as f32 + b as f32 / 256.0 - config::TERRARIUM_OFFSET_M
}

/// Inverse of [`decode_terrarium`]; alpha is always opaque.
#[inline]
pub fn encode_terrarium(elevation_m: f32) -> [u8; 4] {
    let v = (elevation_m + config::TERRARIUM_OFFSET_M).clamp(0.0, 65535.996);
    let whole = v.floor();
    let r = (whole / 256.0).floor();
    let g = whole - r * 256.0;
    let b = ((v - whole) * 256.0).floor();
    [r as u8, g as u8, b as u8, 255]
}

/// Raster filled with one elevation.
pub fn flat_dem(elevation_m: f32) -> Vec<u8> {
    let px = encode_terrarium(elevation_m);
    let mut out = Vec::with_capacity(config::DEM_BYTES);
    for _ in 0..(config::DEM_RES_USIZE * config::DEM_RES_USIZE) {
        out.extend_from_slice(&px);
    }
    out
}

/// Decoded elevation grid (meters) with bilinear lookup.
pub struct ElevationGrid {
    res: usize,
    data: Vec<f32>,
}

impl ElevationGrid {
    /// `dem` shorter than a full raster decodes its missing pixels as zero bytes.
    pub fn from_dem(dem: &[u8]) -> Self {
        let res = config::DEM_RES_USIZE;
        let bpp = config::DEM_BYTES_PER_PIXEL;
        let mut data = vec![0.0f32; res * res];

        for (i, h) in data.iter_mut().enumerate() {
            let o = i * bpp;
            let px = |c: usize| dem.get(o + c).copied().unwrap_or(0);
            *h = decode_terrarium(px(0), px(1), px(2));
        }

        Self { res, data }
    }

    #[inline]
    pub fn res(&self) -> usize {
        self.res
    }

    #[inline]
    pub fn get(&self, px: usize, py: usize) -> f32 {
        let px = px.min(self.res - 1);
        let py = py.min(self.res - 1);
        self.data[py * self.res + px]
    }

    /// Bilinear sample at normalized (u, v) in [0, 1]; (0, 0) is the north-west pixel
    /// center and (1, 1) the south-east one.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let max = (self.res - 1) as f32;
        let fx = (u.clamp(0.0, 1.0)) * max;
        let fy = (v.clamp(0.0, 1.0)) * max;

        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let h00 = self.get(x0, y0);
        let h10 = self.get(x0 + 1, y0);
        let h01 = self.get(x0, y0 + 1);
        let h11 = self.get(x0 + 1, y0 + 1);

        let top = h00 + (h10 - h00) * tx;
        let bot = h01 + (h11 - h01) * tx;
        top + (bot - top) * ty
    }
}
