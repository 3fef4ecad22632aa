// src/render/texture.rs
//
// CPU-side texture payloads + the wgpu descriptors a renderer needs to upload them.
// Device/queue ownership lives outside this crate.

use std::sync::Arc;

use crate::config;
use crate::error::{TerrainError, TerrainResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerDesc {
    pub address_mode: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub generate_mipmaps: bool,
}

impl SamplerDesc {
    pub const LINEAR_CLAMP: SamplerDesc = SamplerDesc {
        address_mode: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        generate_mipmaps: false,
    };

    pub const LINEAR_REPEAT: SamplerDesc = SamplerDesc {
        address_mode: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        generate_mipmaps: true,
    };
}

#[derive(Clone, Debug)]
pub struct TextureData {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub data: Arc<[u8]>,
    pub sampler: SamplerDesc,
}

impl TextureData {
    pub fn rgba8(
        label: impl Into<String>,
        width: u32,
        height: u32,
        data: Vec<u8>,
        sampler: SamplerDesc,
    ) -> TerrainResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TerrainError::protocol(format!(
                "texture needs {expected} bytes for {width}x{height} RGBA8, got {}",
                data.len()
            )));
        }

        Ok(Self {
            label: label.into(),
            width,
            height,
            format: wgpu::TextureFormat::Rgba8Unorm,
            data: data.into(),
            sampler,
        })
    }

    /// Per-tile elevation texture straight from the worker's `dem` bytes:
    /// DEM_RES x DEM_RES, linear filtering, no mipmaps.
    pub fn elevation(key: &str, dem: Vec<u8>) -> TerrainResult<Self> {
        Self::rgba8(
            format!("heightmap_{key}"),
            config::DEM_RES,
            config::DEM_RES,
            dem,
            SamplerDesc::LINEAR_CLAMP,
        )
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn mip_level_count(&self) -> u32 {
        if self.sampler.generate_mipmaps {
            32 - self.width.max(self.height).max(1).leading_zeros()
        } else {
            1
        }
    }

    pub fn descriptor(&self) -> wgpu::TextureDescriptor<'_> {
        wgpu::TextureDescriptor {
            label: Some(&self.label),
            size: wgpu::Extent3d {
                width: self.width.max(1),
                height: self.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: self.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }
    }

    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'_> {
        let s = self.sampler;
        wgpu::SamplerDescriptor {
            label: Some(&self.label),
            address_mode_u: s.address_mode,
            address_mode_v: s.address_mode,
            address_mode_w: s.address_mode,
            mag_filter: s.mag_filter,
            min_filter: s.min_filter,
            mipmap_filter: if s.generate_mipmaps {
                wgpu::FilterMode::Linear
            } else {
                wgpu::FilterMode::Nearest
            },
            ..Default::default()
        }
    }
}
