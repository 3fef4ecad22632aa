// src/tiles/coords.rs
//
// Web-Mercator slippy tile math + world placement.
//
// World axes: x east, y north, z up. Placement only moves tiles on x/y; elevation
// lives in the mesh vertices.
//
// cf. https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames

use std::f64::consts::PI;

use glam::{DVec2, Vec3};
use once_cell::sync::Lazy;

use crate::config;
use crate::tiles::key::TileKey;

#[inline]
fn tiles_at(zoom: u32) -> f64 {
    2f64.powi(zoom as i32)
}

/// Longitude (degrees) -> fractional tile x.
#[inline]
pub fn lon_to_tile_x(lon_deg: f64, zoom: u32) -> f64 {
    (lon_deg + 180.0) / 360.0 * tiles_at(zoom)
}

/// Latitude (degrees) -> fractional tile y (inverse Mercator).
#[inline]
pub fn lat_to_tile_y(lat_deg: f64, zoom: u32) -> f64 {
    let lat = lat_deg.to_radians();
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * tiles_at(zoom)
}

#[inline]
pub fn tile_x_to_lon(x: f64, zoom: u32) -> f64 {
    x / tiles_at(zoom) * 360.0 - 180.0
}

#[inline]
pub fn tile_y_to_lat(y: f64, zoom: u32) -> f64 {
    let n = PI * (1.0 - 2.0 * y / tiles_at(zoom));
    n.sinh().atan().to_degrees()
}

/// Ground width (meters) of one tile at `zoom`, measured at `lat_deg`.
#[inline]
pub fn tile_width_m(zoom: u32, lat_deg: f64) -> f64 {
    config::EARTH_CIRCUMFERENCE_M * lat_deg.to_radians().cos() / tiles_at(zoom)
}

static ANCHOR: Lazy<DVec2> = Lazy::new(|| {
    DVec2::new(
        lon_to_tile_x(config::ANCHOR_LON_DEG, config::REFERENCE_ZOOM),
        lat_to_tile_y(config::ANCHOR_LAT_DEG, config::REFERENCE_ZOOM),
    )
});

/// Maps tile keys into one continuous world space around a fixed anchor.
#[derive(Clone, Copy, Debug)]
pub struct TileCoordinateSystem {
    /// Anchor in tile coordinates at `reference_zoom`.
    anchor: DVec2,
    reference_zoom: u32,
}

impl Default for TileCoordinateSystem {
    fn default() -> Self {
        Self { anchor: *ANCHOR, reference_zoom: config::REFERENCE_ZOOM }
    }
}

impl TileCoordinateSystem {
    pub fn with_anchor(lon_deg: f64, lat_deg: f64, reference_zoom: u32) -> Self {
        Self {
            anchor: DVec2::new(
                lon_to_tile_x(lon_deg, reference_zoom),
                lat_to_tile_y(lat_deg, reference_zoom),
            ),
            reference_zoom,
        }
    }

    #[inline]
    pub fn anchor(&self) -> DVec2 {
        self.anchor
    }

    #[inline]
    pub fn reference_zoom(&self) -> u32 {
        self.reference_zoom
    }

    /// Anchor's fractional tile position at `zoom`.
    #[inline]
    pub fn offset_at_zoom(&self, zoom: u32) -> DVec2 {
        let scale = 2f64.powi(self.reference_zoom as i32 - zoom as i32);
        self.anchor / scale
    }

    /// Integer cell containing the anchor at `zoom`.
    #[inline]
    pub fn anchor_tile(&self, zoom: u32) -> (i64, i64) {
        let off = self.offset_at_zoom(zoom);
        (off.x.floor() as i64, off.y.floor() as i64)
    }

    /// World-space center of the tile.
    ///
    /// The anchor tile sits at the origin; each step in x moves `size` east and
    /// each step in y moves `size` south, so neighbours share edges exactly.
    pub fn placement_for(&self, key: &TileKey) -> Vec3 {
        let (ax, ay) = self.anchor_tile(key.zoom);
        let size = key.size as f64;

        let dx = key.x as i64 - ax;
        let dy = key.y as i64 - ay;

        Vec3::new((dx as f64 * size) as f32, (-(dy as f64) * size) as f32, 0.0)
    }

    #[inline]
    pub fn anchor_lat_deg(&self) -> f64 {
        tile_y_to_lat(self.anchor.y, self.reference_zoom)
    }

    /// Meters -> world units for tiles of `key.zoom` and `key.size`.
    ///
    /// Ground width is taken at the anchor latitude, so every tile of one zoom and
    /// size shares the factor and heights on shared edges agree.
    #[inline]
    pub fn vertical_scale(&self, key: &TileKey, exaggeration: f32) -> f32 {
        let width_m = tile_width_m(key.zoom, self.anchor_lat_deg());
        (key.size as f64 / width_m) as f32 * exaggeration
    }
}
