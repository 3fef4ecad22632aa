// src/render/materials.rs
//
// Two tiers of shading resources:
// - shared: color ramp + biome textures, built once per process, read-only afterwards
// - per tile: the elevation texture, injected into each material

use std::f64::consts::TAU;
use std::sync::Arc;

use noise::{NoiseFn, Perlin};
use once_cell::sync::Lazy;

use crate::config::{self, MaterialVariant};
use crate::render::gpu_types::MaterialParamsGpu;
use crate::render::shaders;
use crate::render::texture::{SamplerDesc, TextureData};

// d3 "Spectral" scheme, red -> blue.
const SPECTRAL: [[u8; 3]; 11] = [
    [0x9e, 0x01, 0x42],
    [0xd5, 0x3e, 0x4f],
    [0xf4, 0x6d, 0x43],
    [0xfd, 0xae, 0x61],
    [0xfe, 0xe0, 0x8b],
    [0xff, 0xff, 0xbf],
    [0xe6, 0xf5, 0x98],
    [0xab, 0xdd, 0xa4],
    [0x66, 0xc2, 0xa5],
    [0x32, 0x88, 0xbd],
    [0x5e, 0x4f, 0xa2],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Biome {
    Rock,
    Grass,
    Ice,
    Snow,
}

impl Biome {
    pub const ALL: [Biome; 4] = [Biome::Rock, Biome::Grass, Biome::Ice, Biome::Snow];

    fn label(self) -> &'static str {
        match self {
            Biome::Rock => "biome_rock",
            Biome::Grass => "biome_grass",
            Biome::Ice => "biome_ice",
            Biome::Snow => "biome_snow",
        }
    }

    fn base_color(self) -> [f32; 3] {
        match self {
            Biome::Rock => [112.0, 102.0, 94.0],
            Biome::Grass => [78.0, 114.0, 52.0],
            Biome::Ice => [188.0, 212.0, 228.0],
            Biome::Snow => [244.0, 247.0, 250.0],
        }
    }

    // how much the noise is allowed to darken/brighten the base color
    fn grain(self) -> f32 {
        match self {
            Biome::Rock => 48.0,
            Biome::Grass => 36.0,
            Biome::Ice => 18.0,
            Biome::Snow => 8.0,
        }
    }

    fn seed(self) -> u32 {
        match self {
            Biome::Rock => 0x0B0C_0001,
            Biome::Grass => 0x0B0C_0002,
            Biome::Ice => 0x0B0C_0003,
            Biome::Snow => 0x0B0C_0004,
        }
    }
}

pub struct SharedShading {
    pub color_ramp: TextureData,
    pub rock: TextureData,
    pub grass: TextureData,
    pub ice: TextureData,
    pub snow: TextureData,
}

impl SharedShading {
    pub fn biome(&self, biome: Biome) -> &TextureData {
        match biome {
            Biome::Rock => &self.rock,
            Biome::Grass => &self.grass,
            Biome::Ice => &self.ice,
            Biome::Snow => &self.snow,
        }
    }
}

fn color_ramp_texture() -> TextureData {
    let res = config::COLOR_RAMP_RES as usize;
    let segs = (SPECTRAL.len() - 1) as f32;
    let mut data = Vec::with_capacity(res * 4);

    for i in 0..res {
        let t = i as f32 / (res - 1) as f32 * segs;
        let s = (t.floor() as usize).min(SPECTRAL.len() - 2);
        let f = t - s as f32;
        let (a, b) = (SPECTRAL[s], SPECTRAL[s + 1]);
        for c in 0..3 {
            let v = a[c] as f32 + (b[c] as f32 - a[c] as f32) * f;
            data.push(v.round() as u8);
        }
        data.push(255);
    }

    TextureData {
        label: "spectral_ramp".to_string(),
        width: config::COLOR_RAMP_RES,
        height: 1,
        format: wgpu::TextureFormat::Rgba8Unorm,
        data: data.into(),
        sampler: SamplerDesc::LINEAR_CLAMP,
    }
}

/// Seamless noise texture: the (u, v) square is wrapped onto a torus in 4D noise space,
/// so opposite edges match and Repeat addressing shows no seams.
fn biome_texture(biome: Biome) -> TextureData {
    let res = config::BIOME_TEX_RES as usize;
    let perlin = Perlin::new(biome.seed());
    let radius = 1.5;
    let base = biome.base_color();
    let mut data = Vec::with_capacity(res * res * 4);

    for y in 0..res {
        let a = y as f64 / res as f64 * TAU;
        for x in 0..res {
            let b = x as f64 / res as f64 * TAU;
            let n = perlin.get([
                radius * b.cos(),
                radius * b.sin(),
                radius * a.cos(),
                radius * a.sin(),
            ]) as f32;
            for c in base {
                data.push((c + n * biome.grain()).clamp(0.0, 255.0) as u8);
            }
            data.push(255);
        }
    }

    TextureData {
        label: biome.label().to_string(),
        width: config::BIOME_TEX_RES,
        height: config::BIOME_TEX_RES,
        format: wgpu::TextureFormat::Rgba8Unorm,
        data: data.into(),
        sampler: SamplerDesc::LINEAR_REPEAT,
    }
}

static SHARED: Lazy<Arc<SharedShading>> = Lazy::new(|| {
    log::debug!("building shared terrain shading resources");
    Arc::new(SharedShading {
        color_ramp: color_ramp_texture(),
        rock: biome_texture(Biome::Rock),
        grass: biome_texture(Biome::Grass),
        ice: biome_texture(Biome::Ice),
        snow: biome_texture(Biome::Snow),
    })
});

/// Process-wide shading resources.
#[inline]
pub fn shared_shading() -> Arc<SharedShading> {
    SHARED.clone()
}

#[inline]
fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Biome blend weights `[rock, grass, ice, snow]` for an elevation and a slope
/// (0 = flat, 1 = vertical). Same formula as `fs_biome`; weights sum to 1.
pub fn biome_weights(params: &MaterialParamsGpu, elevation_m: f32, slope: f32) -> [f32; 4] {
    let snow_line = params.snow_line_m;
    let mut snow = smoothstep(snow_line - 150.0, snow_line + 150.0, elevation_m);
    let mut ice = smoothstep(snow_line - params.ice_band_m, snow_line, elevation_m) * (1.0 - snow);
    let rock = smoothstep(params.rock_slope * 0.5, params.rock_slope, slope);
    snow *= 1.0 - rock;
    ice *= 1.0 - rock;
    let grass = (1.0 - rock - snow - ice).max(0.0);

    let total = (rock + grass + ice + snow).max(1e-4);
    [rock / total, grass / total, ice / total, snow / total]
}

pub struct TerrainMaterial {
    pub variant: MaterialVariant,
    pub wireframe: bool,
    pub shared: Arc<SharedShading>,
    pub heightmap: Arc<TextureData>,
    pub params: MaterialParamsGpu,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
}

impl TerrainMaterial {
    #[inline]
    pub fn shader_source(&self) -> &'static str {
        shaders::terrain_wgsl()
    }

    #[inline]
    pub fn polygon_mode(&self) -> wgpu::PolygonMode {
        if self.wireframe {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        }
    }
}

pub struct MaterialFactory {
    variant: MaterialVariant,
    shared: Arc<SharedShading>,
}

impl MaterialFactory {
    pub fn new(variant: MaterialVariant) -> Self {
        Self { variant, shared: shared_shading() }
    }

    #[inline]
    pub fn variant(&self) -> MaterialVariant {
        self.variant
    }

    #[inline]
    pub fn shared(&self) -> &Arc<SharedShading> {
        &self.shared
    }

    pub fn default_params(&self, meters_per_unit: f32) -> MaterialParamsGpu {
        MaterialParamsGpu {
            snow_line_m: 2800.0,
            rock_slope: 0.45,
            ice_band_m: 400.0,
            ramp_min_m: 0.0,
            ramp_max_m: 4800.0,
            meters_per_unit,
            wireframe: (self.variant == MaterialVariant::Wireframe) as u32,
            _pad0: 0,
        }
    }

    /// Material for one tile around its own elevation texture.
    pub fn material(&self, heightmap: TextureData, meters_per_unit: f32) -> TerrainMaterial {
        let (wireframe, fragment_entry) = match self.variant {
            MaterialVariant::Wireframe => (true, shaders::FS_WIREFRAME_ENTRY),
            MaterialVariant::Biome => (false, shaders::FS_BIOME_ENTRY),
        };

        TerrainMaterial {
            variant: self.variant,
            wireframe,
            shared: self.shared.clone(),
            heightmap: Arc::new(heightmap),
            params: self.default_params(meters_per_unit),
            vertex_entry: shaders::VS_ENTRY,
            fragment_entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::dem::flat_dem;

    fn heightmap() -> TextureData {
        TextureData::elevation("k", flat_dem(0.0)).unwrap()
    }

    #[test]
    fn shared_resources_are_built_once() {
        let a = MaterialFactory::new(MaterialVariant::Biome);
        let b = MaterialFactory::new(MaterialVariant::Wireframe);
        assert!(Arc::ptr_eq(a.shared(), b.shared()));

        let m1 = a.material(heightmap(), 30.0);
        let m2 = a.material(heightmap(), 30.0);
        assert!(Arc::ptr_eq(&m1.shared, &m2.shared));
        assert!(!Arc::ptr_eq(&m1.heightmap, &m2.heightmap));
    }

    #[test]
    fn biome_textures_repeat() {
        let shared = shared_shading();
        for biome in Biome::ALL {
            let t = shared.biome(biome);
            assert_eq!(t.sampler.address_mode, wgpu::AddressMode::Repeat);
            assert_eq!(t.byte_len(), (config::BIOME_TEX_RES * config::BIOME_TEX_RES * 4) as usize);
        }
    }

    #[test]
    fn color_ramp_endpoints_match_scheme() {
        let ramp = &shared_shading().color_ramp;
        assert_eq!(ramp.width, config::COLOR_RAMP_RES);
        assert_eq!(&ramp.data[0..3], &SPECTRAL[0]);
        let last = ramp.data.len() - 4;
        assert_eq!(&ramp.data[last..last + 3], &SPECTRAL[10]);
    }

    #[test]
    fn variant_selects_entry_point_and_fill() {
        let w = MaterialFactory::new(MaterialVariant::Wireframe).material(heightmap(), 1.0);
        assert!(w.wireframe);
        assert_eq!(w.fragment_entry, shaders::FS_WIREFRAME_ENTRY);
        assert_eq!(w.polygon_mode(), wgpu::PolygonMode::Line);
        assert_eq!(w.params.wireframe, 1);

        let b = MaterialFactory::new(MaterialVariant::Biome).material(heightmap(), 1.0);
        assert!(!b.wireframe);
        assert_eq!(b.fragment_entry, shaders::FS_BIOME_ENTRY);
        assert_eq!(b.polygon_mode(), wgpu::PolygonMode::Fill);
    }

    #[test]
    fn biome_weights_follow_elevation_and_slope() {
        let params = MaterialFactory::new(MaterialVariant::Biome).default_params(1.0);

        let valley = biome_weights(&params, 900.0, 0.0);
        assert!(valley[1] > 0.99, "{valley:?}");

        let summit = biome_weights(&params, 4200.0, 0.0);
        assert!(summit[3] > 0.99, "{summit:?}");

        let cliff = biome_weights(&params, 1500.0, 0.9);
        assert!(cliff[0] > 0.99, "{cliff:?}");

        for w in [valley, summit, cliff, biome_weights(&params, 2650.0, 0.3)] {
            assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }
}
