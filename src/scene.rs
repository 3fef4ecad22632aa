// src/scene.rs
// ------------
// Scene-side tile nodes and the sink the assembler inserts them into.

use glam::Vec3;
use rustc_hash::FxHashMap as HashMap;

use crate::render::gpu_types::{TileGpu, VertexGpu};
use crate::render::materials::TerrainMaterial;

#[derive(Clone, Debug, PartialEq)]
pub enum TileIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl TileIndices {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            TileIndices::U16(v) => v.len(),
            TileIndices::U32(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            TileIndices::U16(_) => wgpu::IndexFormat::Uint16,
            TileIndices::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            TileIndices::U16(v) => v.get(i).map(|&x| x as u32),
            TileIndices::U32(v) => v.get(i).copied(),
        }
    }

    /// Raw bytes ready for an index buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TileIndices::U16(v) => bytemuck::cast_slice(v),
            TileIndices::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: TileIndices,
}

impl Geometry {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn interleaved(&self) -> Vec<VertexGpu> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((&position, &normal), &uv)| VertexGpu { position, normal, uv })
            .collect()
    }
}

pub struct TileMesh {
    pub key: String,
    pub geometry: Geometry,
    pub material: TerrainMaterial,
    pub translation: Vec3,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl TileMesh {
    #[inline]
    pub fn tile_uniform(&self) -> TileGpu {
        TileGpu { offset: self.translation.extend(0.0).to_array() }
    }
}

/// Where assembled tiles end up. Only ever touched from the orchestrator thread.
pub trait SceneSink {
    /// Insert under `mesh.key`; returns the node it replaced, if any.
    fn add_node(&mut self, mesh: TileMesh) -> Option<TileMesh>;
    fn remove_node(&mut self, key: &str) -> Option<TileMesh>;
}

#[derive(Default)]
pub struct SceneGraph {
    nodes: HashMap<String, TileMesh>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&TileMesh> {
        self.nodes.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileMesh> {
        self.nodes.values()
    }
}

impl SceneSink for SceneGraph {
    fn add_node(&mut self, mesh: TileMesh) -> Option<TileMesh> {
        let prev = self.nodes.insert(mesh.key.clone(), mesh);
        if let Some(p) = &prev {
            log::warn!("tile {} assembled twice; replacing scene node", p.key);
        }
        prev
    }

    fn remove_node(&mut self, key: &str) -> Option<TileMesh> {
        self.nodes.remove(key)
    }
}
