// src/streaming/mesh.rs
//
// Worker-side grid mesh: segments x segments vertices over the tile square, centered on
// the tile's local origin. Row 0 is the northern edge (+y), column 0 the western edge (-x).

use glam::Vec3;
use rayon::prelude::*;

use crate::streaming::dem::ElevationGrid;
use crate::streaming::types::{bytes_per_index, index_format_for, TileBuildResult};
use crate::tiles::TileJob;

/// Heights (world units) for every grid vertex, row-major.
pub fn sample_heights(grid: &ElevationGrid, n: usize, vertical_scale: f32) -> Vec<f32> {
    let mut heights = vec![0.0f32; n * n];
    let inv = 1.0 / (n - 1) as f32;

    heights.par_chunks_mut(n).enumerate().for_each(|(row, out)| {
        let v = row as f32 * inv;
        for (col, h) in out.iter_mut().enumerate() {
            *h = grid.sample(col as f32 * inv, v) * vertical_scale;
        }
    });

    heights
}

pub fn grid_positions(heights: &[f32], n: usize, size: f32) -> Vec<[f32; 3]> {
    let inv = 1.0 / (n - 1) as f32;
    heights
        .iter()
        .enumerate()
        .map(|(k, &h)| {
            let col = (k % n) as f32;
            let row = (k / n) as f32;
            [(col * inv - 0.5) * size, (0.5 - row * inv) * size, h]
        })
        .collect()
}

/// Central differences inside the grid, one-sided on the border.
pub fn grid_normals(heights: &[f32], n: usize, size: f32) -> Vec<[f32; 3]> {
    let step = size / (n - 1) as f32;
    let mut normals = vec![[0.0f32; 3]; n * n];

    normals.par_chunks_mut(n).enumerate().for_each(|(row, out)| {
        let r0 = row.saturating_sub(1);
        let r1 = (row + 1).min(n - 1);
        for (col, nrm) in out.iter_mut().enumerate() {
            let c0 = col.saturating_sub(1);
            let c1 = (col + 1).min(n - 1);

            let dx = (c1 - c0) as f32 * step;
            let dy = (r1 - r0) as f32 * step;

            let dhdx = (heights[row * n + c1] - heights[row * n + c0]) / dx;
            // rows run south, world y runs north
            let dhdy = -(heights[r1 * n + col] - heights[r0 * n + col]) / dy;

            *nrm = Vec3::new(-dhdx, -dhdy, 1.0).normalize().to_array();
        }
    });

    normals
}

/// Two counter-clockwise (seen from +z) triangles per cell.
pub fn grid_indices(n: usize) -> Vec<u32> {
    let cells = n - 1;
    let mut idx = Vec::with_capacity(cells * cells * 6);
    for row in 0..cells {
        for col in 0..cells {
            let nw = (row * n + col) as u32;
            let ne = nw + 1;
            let sw = nw + n as u32;
            let se = sw + 1;
            idx.extend_from_slice(&[nw, sw, ne, ne, sw, se]);
        }
    }
    idx
}

/// Encode indices at the width the vertex count calls for.
pub fn encode_indices(indices: &[u32], vertex_count: usize) -> (Vec<u8>, u8) {
    let format = index_format_for(vertex_count);
    let bytes = match format {
        wgpu::IndexFormat::Uint16 => {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            bytemuck::cast_slice(&narrow).to_vec()
        }
        wgpu::IndexFormat::Uint32 => bytemuck::cast_slice(indices).to_vec(),
    };
    (bytes, bytes_per_index(format))
}

/// Full worker-side build for one job. `dem` is consumed and shipped back with the result.
pub fn build_tile(job: &TileJob, dem: Vec<u8>, vertical_scale: f32) -> TileBuildResult {
    let n = job.segments.max(2) as usize;
    let grid = ElevationGrid::from_dem(&dem);

    let heights = sample_heights(&grid, n, vertical_scale);
    let positions = grid_positions(&heights, n, job.size);
    let normals = grid_normals(&heights, n, job.size);
    let (indices, bpi) = encode_indices(&grid_indices(n), n * n);

    TileBuildResult {
        key: job.key().wire(),
        positions: bytemuck::cast_slice(&positions).to_vec(),
        normals: bytemuck::cast_slice(&normals).to_vec(),
        indices,
        bytes_per_index: bpi,
        dem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::dem::{encode_terrarium, flat_dem};

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytemuck::allocation::pod_collect_to_vec(bytes)
    }

    #[test]
    fn segments_256_uses_u16_indices() {
        let job = TileJob::new(10, 546, 390, 256, 0, 800.0);
        let out = build_tile(&job, flat_dem(0.0), 1.0);
        assert_eq!(out.bytes_per_index, 2);
        assert_eq!(out.vertex_count(), 65_536);
        assert_eq!(out.indices.len(), 255 * 255 * 6 * 2);
    }

    #[test]
    fn segments_257_uses_u32_indices() {
        let job = TileJob::new(10, 546, 390, 257, 0, 800.0);
        let out = build_tile(&job, flat_dem(0.0), 1.0);
        assert_eq!(out.bytes_per_index, 4);
        assert_eq!(out.vertex_count(), 66_049);
        assert_eq!(out.indices.len(), 256 * 256 * 6 * 4);
    }

    #[test]
    fn grid_spans_tile_square() {
        let job = TileJob::new(10, 0, 0, 5, 0, 100.0);
        let out = build_tile(&job, flat_dem(0.0), 1.0);
        let p = floats(&out.positions);

        // first vertex north-west, last south-east
        assert_eq!(&p[0..3], &[-50.0, 50.0, 0.0]);
        let last = p.len() - 3;
        assert_eq!(&p[last..], &[50.0, -50.0, 0.0]);
    }

    #[test]
    fn flat_dem_gives_flat_mesh_with_up_normals() {
        let job = TileJob::new(10, 546, 390, 16, 0, 800.0);
        let out = build_tile(&job, flat_dem(1200.0), 0.5);

        let p = floats(&out.positions);
        assert!(p.chunks(3).all(|v| v[2] == 600.0));

        let nrm = floats(&out.normals);
        assert!(nrm.chunks(3).all(|v| v == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn triangles_face_up() {
        let n = 3;
        let heights = vec![0.0; n * n];
        let pos = grid_positions(&heights, n, 10.0);
        for tri in grid_indices(n).chunks(3) {
            let a = Vec3::from(pos[tri[0] as usize]);
            let b = Vec3::from(pos[tri[1] as usize]);
            let c = Vec3::from(pos[tri[2] as usize]);
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }

    #[test]
    fn indices_stay_in_range() {
        let n = 9;
        let idx = grid_indices(n);
        assert_eq!(idx.len(), (n - 1) * (n - 1) * 6);
        assert!(idx.iter().all(|&i| (i as usize) < n * n));
    }

    #[test]
    fn slope_tilts_normals_downhill() {
        // elevation rises eastwards
        let mut dem = flat_dem(0.0);
        for py in 0..256usize {
            for px in 0..256usize {
                let o = (py * 256 + px) * 4;
                dem[o..o + 4].copy_from_slice(&encode_terrarium(px as f32));
            }
        }
        let job = TileJob::new(10, 0, 0, 8, 0, 255.0);
        let out = build_tile(&job, dem, 1.0);
        let nrm = floats(&out.normals);
        for v in nrm.chunks(3) {
            assert!(v[0] < 0.0);
            assert!(v[1].abs() < 1e-5);
        }
    }

    #[test]
    fn result_key_is_job_wire_key() {
        let job = TileJob::new(10, 546, 390, 4, 2, 800.0);
        let out = build_tile(&job, flat_dem(0.0), 1.0);
        assert_eq!(out.key, "10,546,390,0,2,800");
        assert_eq!(out.dem.len(), crate::config::DEM_BYTES);
    }
}
