// src/streaming/assembler.rs
// --------------------------
// Orchestrator-side assembly: worker payload -> TileMesh -> scene.
//
// Runs on the thread that owns the scene, one result at a time, to completion.

use bytemuck::allocation::pod_collect_to_vec;

use crate::config::MaterialVariant;
use crate::error::{TerrainError, TerrainResult};
use crate::render::materials::MaterialFactory;
use crate::render::texture::TextureData;
use crate::scene::{Geometry, SceneSink, TileIndices, TileMesh};
use crate::streaming::types::{index_format_from_bytes, TileBuildResult};
use crate::tiles::{TileCoordinateSystem, TileKey};

/// Grid UV for vertex `k` of an `n x n` grid.
#[inline]
pub fn grid_uv(k: usize, n: usize) -> [f32; 2] {
    let inv = 1.0 / n as f32;
    [(k % n) as f32 * inv, (k / n) as f32 * inv]
}

pub fn grid_uvs(vertex_count: usize) -> TerrainResult<Vec<[f32; 2]>> {
    let n = (vertex_count as f64).sqrt().round() as usize;
    if n * n != vertex_count {
        return Err(TerrainError::protocol(format!(
            "{vertex_count} vertices do not form a square grid"
        )));
    }
    Ok((0..vertex_count).map(|k| grid_uv(k, n)).collect())
}

fn vec3_view(bytes: &[u8], what: &str) -> TerrainResult<Vec<[f32; 3]>> {
    if bytes.len() % 12 != 0 {
        return Err(TerrainError::protocol(format!(
            "{what} buffer is {} bytes, not a whole number of f32 triples",
            bytes.len()
        )));
    }
    Ok(pod_collect_to_vec(bytes))
}

fn index_view(
    bytes: &[u8],
    bytes_per_index: u8,
    vertex_count: usize,
) -> TerrainResult<TileIndices> {
    let format = index_format_from_bytes(bytes_per_index)?;
    if bytes.len() % bytes_per_index as usize != 0 {
        return Err(TerrainError::protocol(format!(
            "index buffer is {} bytes, not a multiple of {bytes_per_index}",
            bytes.len()
        )));
    }

    let indices = match format {
        wgpu::IndexFormat::Uint16 => TileIndices::U16(pod_collect_to_vec(bytes)),
        wgpu::IndexFormat::Uint32 => TileIndices::U32(pod_collect_to_vec(bytes)),
    };

    if indices.len() % 3 != 0 {
        return Err(TerrainError::protocol(format!(
            "{} indices is not a triangle list",
            indices.len()
        )));
    }
    let out_of_range = (0..indices.len()).find_map(|i| {
        indices.get(i).filter(|&v| v as usize >= vertex_count)
    });
    if let Some(v) = out_of_range {
        return Err(TerrainError::protocol(format!(
            "index {v} out of range for {vertex_count} vertices"
        )));
    }

    Ok(indices)
}

pub struct TileAssembler {
    coords: TileCoordinateSystem,
    factory: MaterialFactory,
    exaggeration: f32,
}

impl TileAssembler {
    pub fn new(coords: TileCoordinateSystem, variant: MaterialVariant, exaggeration: f32) -> Self {
        Self { coords, factory: MaterialFactory::new(variant), exaggeration }
    }

    #[inline]
    pub fn coords(&self) -> &TileCoordinateSystem {
        &self.coords
    }

    #[inline]
    pub fn factory(&self) -> &MaterialFactory {
        &self.factory
    }

    /// Turn one worker result into a scene-ready mesh. Consumes the payload.
    pub fn assemble(&self, result: TileBuildResult) -> TerrainResult<TileMesh> {
        let TileBuildResult { key, positions, normals, indices, bytes_per_index, dem } = result;
        let tile: TileKey = key.parse()?;

        let positions = vec3_view(&positions, "positions")?;
        let normals = vec3_view(&normals, "normals")?;
        if normals.len() != positions.len() {
            return Err(TerrainError::protocol(format!(
                "{key}: {} normals for {} positions",
                normals.len(),
                positions.len()
            )));
        }

        let vertex_count = positions.len();
        let indices = index_view(&indices, bytes_per_index, vertex_count)?;
        let uvs = grid_uvs(vertex_count)?;

        let heightmap = TextureData::elevation(&key, dem)?;
        let scale = self.coords.vertical_scale(&tile, self.exaggeration);
        let meters_per_unit = if scale != 0.0 { 1.0 / scale } else { 0.0 };
        let material = self.factory.material(heightmap, meters_per_unit);

        Ok(TileMesh {
            translation: self.coords.placement_for(&tile),
            key,
            geometry: Geometry { positions, normals, uvs, indices },
            material,
            cast_shadow: true,
            receive_shadow: true,
        })
    }

    /// Assemble and insert under the tile's key. Returns the key.
    pub fn assemble_into(
        &self,
        result: TileBuildResult,
        scene: &mut dyn SceneSink,
    ) -> TerrainResult<String> {
        let mesh = self.assemble(result)?;
        let key = mesh.key.clone();
        scene.add_node(mesh);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use crate::streaming::dem::flat_dem;
    use crate::streaming::mesh::build_tile;
    use crate::streaming::raster::ProceduralRasterSource;
    use crate::streaming::worker::run_job;
    use crate::tiles::TileJob;
    use glam::Vec3;

    fn assembler() -> TileAssembler {
        TileAssembler::new(TileCoordinateSystem::default(), MaterialVariant::Biome, 1.0)
    }

    #[test]
    fn uv_for_four_by_four_grid() {
        assert_eq!(grid_uv(5, 4), [0.25, 0.25]);
        assert_eq!(grid_uv(0, 4), [0.0, 0.0]);
        assert_eq!(grid_uv(15, 4), [0.75, 0.75]);

        let uvs = grid_uvs(16).unwrap();
        assert_eq!(uvs[5], [0.25, 0.25]);
        assert!(matches!(grid_uvs(15), Err(TerrainError::Protocol(_))));
    }

    #[test]
    fn flat_tile_end_to_end() {
        let job = TileJob::new(10, 546, 390, 64, 0, 800.0);
        let result = build_tile(&job, flat_dem(1000.0), 0.05);

        let mut scene = SceneGraph::new();
        let a = assembler();
        let key = a.assemble_into(result, &mut scene).unwrap();
        assert_eq!(key, "10,546,390,0,0,800");

        let mesh = scene.get(&key).unwrap();
        let z0 = mesh.geometry.positions[0][2];
        assert!(mesh.geometry.positions.iter().all(|p| p[2] == z0));
        assert_eq!(mesh.translation, a.coords().placement_for(&job.key()));
        assert_eq!(mesh.geometry.indices.format(), wgpu::IndexFormat::Uint16);
        assert_eq!(mesh.geometry.uvs.len(), 64 * 64);
        assert!(mesh.cast_shadow && mesh.receive_shadow);
        assert_eq!(mesh.material.heightmap.width, 256);
    }

    #[test]
    fn declared_index_width_is_honoured() {
        let job = TileJob::new(10, 546, 390, 257, 0, 800.0);
        let mesh = assembler().assemble(build_tile(&job, flat_dem(0.0), 1.0)).unwrap();
        assert_eq!(mesh.geometry.indices.format(), wgpu::IndexFormat::Uint32);
        assert_eq!(mesh.geometry.triangle_count(), 256 * 256 * 2);
    }

    #[test]
    fn bad_payloads_are_protocol_errors() {
        let job = TileJob::new(10, 546, 390, 4, 0, 800.0);

        let mut r = build_tile(&job, flat_dem(0.0), 1.0);
        r.bytes_per_index = 3;
        assert!(matches!(assembler().assemble(r), Err(TerrainError::Protocol(_))));

        let mut r = build_tile(&job, flat_dem(0.0), 1.0);
        r.positions.pop();
        assert!(matches!(assembler().assemble(r), Err(TerrainError::Protocol(_))));

        let mut r = build_tile(&job, flat_dem(0.0), 1.0);
        r.key = "10,546,x,0,0,800".to_string();
        assert!(matches!(assembler().assemble(r), Err(TerrainError::MalformedKey { .. })));
    }

    fn world_vertices(
        a: &TileAssembler,
        source: &ProceduralRasterSource,
        x: u32,
        y: u32,
    ) -> Vec<Vec3> {
        let job = TileJob::new(10, x, y, 17, 0, 800.0);
        let mesh = a.assemble(run_job(source, &job, 1.0)).unwrap();
        mesh.geometry
            .positions
            .iter()
            .map(|&p| Vec3::from(p) + mesh.translation)
            .collect()
    }

    fn assert_edges_meet(a: &[Vec3], b: &[Vec3]) {
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(b) {
            assert!((*p - *q).abs().max_element() < 1e-3, "{p} vs {q}");
        }
    }

    #[test]
    fn neighbours_share_edge_vertices_in_world_space() {
        let a = assembler();
        let source = ProceduralRasterSource::new(1337);
        let n = 17;

        let here = world_vertices(&a, &source, 532, 364);
        let east = world_vertices(&a, &source, 533, 364);
        let south = world_vertices(&a, &source, 532, 365);

        let column = |v: &[Vec3], col: usize| -> Vec<Vec3> {
            (0..n).map(|row| v[row * n + col]).collect()
        };
        assert_edges_meet(&column(&here, n - 1), &column(&east, 0));
        assert_edges_meet(&here[(n - 1) * n..], &south[..n]);

        // the relief is not trivially flat
        assert!(here.iter().any(|p| (p.z - here[0].z).abs() > 1e-3));
    }
}
