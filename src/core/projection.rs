//! Web Mercator (EPSG:3857) projection into a zoom-scaled global pixel space.
//!
//! The global pixel space at zoom `z` is a square of `2^z * TILE_SIZE` pixels with
//! the origin at the north-west corner of the world. Every piece of pan, zoom,
//! tile, clustering and heatmap math in the crate goes through the four functions
//! in this module.

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, Point};
use crate::core::viewport::MapState;
use std::f64::consts::PI;

/// Side length of the global pixel space at `zoom`.
#[inline]
pub fn world_size(zoom: f64) -> f64 {
    2_f64.powf(zoom) * TILE_SIZE as f64
}

/// Projects a coordinate to global pixels at `zoom`.
///
/// Undefined at the poles; callers filter those out with
/// [`LatLng::is_projectable`].
pub fn project(lat: f64, lng: f64, zoom: f64) -> Point {
    let size = world_size(zoom);
    let phi = lat.to_radians();
    let x = (lng + 180.0) / 360.0 * size;
    let y = (1.0 - (phi.tan() + 1.0 / phi.cos()).ln() / PI) / 2.0 * size;
    Point::new(x, y)
}

/// Exact inverse of [`project`].
pub fn unproject(px: f64, py: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = px / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * py / size)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Projects a coordinate into the pixel space of a `width` x `height` canvas
/// centred on `state`.
pub fn to_viewport(lat: f64, lng: f64, state: &MapState, width: f64, height: f64) -> Point {
    let center = project(state.lat, state.lng, state.zoom);
    let p = project(lat, lng, state.zoom);
    Point::new(p.x - center.x + width / 2.0, p.y - center.y + height / 2.0)
}

/// Inverse of [`to_viewport`].
pub fn from_viewport(x: f64, y: f64, state: &MapState, width: f64, height: f64) -> LatLng {
    let center = project(state.lat, state.lng, state.zoom);
    unproject(
        x - width / 2.0 + center.x,
        y - height / 2.0 + center.y,
        state.zoom,
    )
}

/// Column of the tile containing `lng` at integer zoom `z`, wrapped into the world.
pub fn tile_x(lng: f64, z: u8) -> u32 {
    let px = project(0.0, lng, z as f64).x;
    let n = 1_i64 << z;
    ((px / TILE_SIZE as f64).floor() as i64).rem_euclid(n) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_project_origin_and_corners() {
        let p = project(0.0, 0.0, 0.0);
        assert!((p.x - 128.0).abs() < EPS);
        assert!((p.y - 128.0).abs() < EPS);

        let west = project(0.0, -180.0, 1.0);
        assert!(west.x.abs() < EPS);

        let north = project(crate::core::constants::MAX_LATITUDE, 0.0, 0.0);
        assert!(north.y.abs() < 1e-3);
    }

    #[test]
    fn test_round_trip_across_zooms() {
        let samples = [
            (51.505, -0.09),
            (-33.8688, 151.2093),
            (84.9, 179.9),
            (-84.9, -179.9),
            (0.0, 0.0),
        ];
        for z in 0..=18 {
            for &(lat, lng) in &samples {
                let p = project(lat, lng, z as f64);
                let back = unproject(p.x, p.y, z as f64);
                assert!((back.lat - lat).abs() < EPS, "lat at z{}: {:?}", z, back);
                assert!((back.lng - lng).abs() < EPS, "lng at z{}: {:?}", z, back);
            }
        }
    }

    #[test]
    fn test_viewport_round_trip() {
        let state = MapState::new(40.7128, -74.006, 12.4);
        let (w, h) = (800.0, 600.0);

        let center = to_viewport(state.lat, state.lng, &state, w, h);
        assert!((center.x - 400.0).abs() < EPS);
        assert!((center.y - 300.0).abs() < EPS);

        for &(x, y) in &[(0.0, 0.0), (800.0, 600.0), (123.4, 567.8)] {
            let ll = from_viewport(x, y, &state, w, h);
            let p = to_viewport(ll.lat, ll.lng, &state, w, h);
            assert!((p.x - x).abs() < 1e-6);
            assert!((p.y - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tile_x_wraps() {
        for z in 0..=17u8 {
            for &lng in &[-179.5, -0.09, 0.0, 45.3, 179.9] {
                assert_eq!(tile_x(lng + 360.0, z), tile_x(lng, z));
                assert!(tile_x(lng, z) < (1u32 << z));
            }
        }
    }
}
