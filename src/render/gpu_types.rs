// src/render/gpu_types.rs
use bytemuck::{Pod, Zeroable};

/// Mirrors `MaterialParams` in `shaders/terrain.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MaterialParamsGpu {
    pub snow_line_m: f32,
    pub rock_slope: f32,
    pub ice_band_m: f32,
    pub ramp_min_m: f32,
    pub ramp_max_m: f32,
    pub meters_per_unit: f32,
    pub wireframe: u32,
    pub _pad0: u32,
}

/// Mirrors `Tile` in `shaders/terrain.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct TileGpu {
    pub offset: [f32; 4],
}

/// Interleaved vertex matching `VsIn`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct VertexGpu {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexGpu {
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexGpu>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MaterialParamsGpu>() % 16, 0);
        assert_eq!(std::mem::size_of::<TileGpu>(), 16);
    }

    #[test]
    fn vertex_layout_stride() {
        assert_eq!(VertexGpu::layout().array_stride, 32);
        assert_eq!(VertexGpu::ATTRIBS[2].offset, 24);
    }
}
