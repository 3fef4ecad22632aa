// src/tiles/key.rs
use std::fmt;
use std::str::FromStr;

use crate::error::{TerrainError, TerrainResult};

/// Identifies one terrain patch: zoom/x/y cell, intra-cell subdivision (i, j) and
/// edge length in world units.
///
/// The wire/scene form is `"zoom,x,y,i,j,size"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileKey {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
    pub i: u32,
    pub j: u32,
    pub size: f32,
}

impl TileKey {
    pub fn new(zoom: u32, x: u32, y: u32, i: u32, j: u32, size: f32) -> Self {
        Self { zoom, x, y, i, j, size }
    }

    /// Scene-graph lookup key.
    #[inline]
    pub fn wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.zoom, self.x, self.y, self.i, self.j, self.size
        )
    }
}

impl FromStr for TileKey {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() != 6 {
            return Err(TerrainError::malformed_key(
                s,
                format!("expected 6 fields, got {}", fields.len()),
            ));
        }

        let int = |idx: usize, name: &str| -> TerrainResult<u32> {
            fields[idx]
                .parse::<u32>()
                .map_err(|e| TerrainError::malformed_key(s, format!("{name}: {e}")))
        };

        let size = fields[5]
            .parse::<f32>()
            .map_err(|e| TerrainError::malformed_key(s, format!("size: {e}")))?;

        Ok(TileKey {
            zoom: int(0, "zoom")?,
            x: int(1, "x")?,
            y: int(2, "y")?,
            i: int(3, "i")?,
            j: int(4, "j")?,
            size,
        })
    }
}

/// A build request sent to one worker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileJob {
    pub z: u32,
    pub x: u32,
    pub y: u32,
    /// Vertices per axis; the grid has segments * segments vertices.
    pub segments: u32,
    pub subdivision: u32,
    pub size: f32,
}

impl TileJob {
    pub fn new(z: u32, x: u32, y: u32, segments: u32, subdivision: u32, size: f32) -> Self {
        Self { z, x, y, segments, subdivision, size }
    }

    pub fn key(&self) -> TileKey {
        TileKey::new(self.z, self.x, self.y, 0, self.subdivision, self.size)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        let n = self.segments as usize;
        n * n
    }

    /// Ordered wire fields: `[zoom, x, y, segments, subdivision, size]`.
    pub fn to_message(&self) -> [f64; 6] {
        [
            self.z as f64,
            self.x as f64,
            self.y as f64,
            self.segments as f64,
            self.subdivision as f64,
            self.size as f64,
        ]
    }

    /// Inverse of [`TileJob::to_message`]. Grid fields must be non-negative integers;
    /// `size` is taken as-is (a NaN size builds a NaN tile).
    pub fn from_message(msg: [f64; 6]) -> TerrainResult<Self> {
        let field = |idx: usize, name: &str| -> TerrainResult<u32> {
            let v = msg[idx];
            if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
                return Err(TerrainError::protocol(format!(
                    "job field {name} is not a tile integer: {v}"
                )));
            }
            Ok(v as u32)
        };

        let segments = field(3, "segments")?;
        if segments < 2 {
            return Err(TerrainError::protocol(format!(
                "job needs at least 2 segments, got {segments}"
            )));
        }

        Ok(TileJob {
            z: field(0, "zoom")?,
            x: field(1, "x")?,
            y: field(2, "y")?,
            segments,
            subdivision: field(4, "subdivision")?,
            size: msg[5] as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_wire_format_is_comma_joined() {
        let k = TileKey::new(10, 546, 390, 0, 2, 800.0);
        assert_eq!(k.wire(), "10,546,390,0,2,800");

        let k = TileKey::new(3, 1, 2, 0, 0, 12.5);
        assert_eq!(k.wire(), "3,1,2,0,0,12.5");
    }

    #[test]
    fn key_parses_back_from_wire() {
        let k = TileKey::new(12, 2131, 1459, 1, 3, 400.0);
        let parsed: TileKey = k.wire().parse().unwrap();
        assert_eq!(parsed, k);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(
            "10,546,390".parse::<TileKey>(),
            Err(TerrainError::MalformedKey { .. })
        ));
        assert!(matches!(
            "10,abc,390,0,0,800".parse::<TileKey>(),
            Err(TerrainError::MalformedKey { .. })
        ));
        assert!(matches!(
            "10,546,390,0,0,big".parse::<TileKey>(),
            Err(TerrainError::MalformedKey { .. })
        ));
    }

    #[test]
    fn job_key_carries_subdivision_as_j() {
        let job = TileJob::new(10, 546, 390, 64, 3, 800.0);
        let k = job.key();
        assert_eq!((k.zoom, k.x, k.y, k.i, k.j), (10, 546, 390, 0, 3));
        assert_eq!(k.size, 800.0);
    }

    #[test]
    fn job_message_field_order() {
        let job = TileJob::new(10, 546, 390, 64, 1, 800.0);
        assert_eq!(job.to_message(), [10.0, 546.0, 390.0, 64.0, 1.0, 800.0]);
        assert_eq!(TileJob::from_message(job.to_message()).unwrap(), job);
    }

    #[test]
    fn job_message_rejects_non_integer_grid_fields() {
        assert!(TileJob::from_message([10.5, 1.0, 1.0, 64.0, 0.0, 800.0]).is_err());
        assert!(TileJob::from_message([10.0, f64::NAN, 1.0, 64.0, 0.0, 800.0]).is_err());
        assert!(TileJob::from_message([10.0, 1.0, -1.0, 64.0, 0.0, 800.0]).is_err());
        assert!(TileJob::from_message([10.0, 1.0, 1.0, 1.0, 0.0, 800.0]).is_err());
    }

    #[test]
    fn job_message_passes_nan_size_through() {
        let job = TileJob::from_message([10.0, 1.0, 1.0, 8.0, 0.0, f64::NAN]).unwrap();
        assert!(job.size.is_nan());
    }
}
