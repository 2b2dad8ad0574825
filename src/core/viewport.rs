use crate::core::bounds::Bounds;
use crate::core::config::ZoomLimits;
use crate::core::geo::{LatLng, Point};
use crate::core::projection::{from_viewport, to_viewport};
use serde::{Deserialize, Serialize};

/// The camera: centre of the view and a continuous zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapState {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl MapState {
    /// Creates a camera clamped to the default zoom limits.
    pub fn new(lat: f64, lng: f64, zoom: f64) -> Self {
        Self { lat, lng, zoom }.normalized(&ZoomLimits::default())
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Clamps zoom into `limits`, latitude into the Mercator range and wraps
    /// longitude. Non-finite components fall back to the origin / min zoom.
    pub fn normalized(self, limits: &ZoomLimits) -> Self {
        let lat = if self.lat.is_finite() { LatLng::clamp_lat(self.lat) } else { 0.0 };
        let lng = if self.lng.is_finite() { LatLng::wrap_lng(self.lng) } else { 0.0 };
        let zoom = if self.zoom.is_finite() { limits.clamp(self.zoom) } else { limits.min };
        Self { lat, lng, zoom }
    }

    /// Copy rounded to 5 decimals of lat/lng and 1 decimal of zoom, for hosts
    /// that persist the camera.
    pub fn rounded(&self) -> Self {
        fn round_to(v: f64, places: i32) -> f64 {
            let f = 10_f64.powi(places);
            (v * f).round() / f
        }
        Self {
            lat: round_to(self.lat, 5),
            lng: round_to(self.lng, 5),
            zoom: round_to(self.zoom, 1),
        }
    }
}

impl Default for MapState {
    fn default() -> Self {
        Self::new(0.0, 0.0, ZoomLimits::default().min)
    }
}

/// Base map colour scheme, chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Display toggles owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayMode {
    pub theme: Theme,
    pub satellite: bool,
    pub heatmap: bool,
}

/// A camera together with the canvas it is rendered into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub state: MapState,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(state: MapState, width: f64, height: f64) -> Self {
        Self { state, width, height }
    }

    /// True when the canvas has no drawable area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center_pixel(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Converts a geographical coordinate to canvas pixels
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        to_viewport(lat_lng.lat, lat_lng.lng, &self.state, self.width, self.height)
    }

    /// Converts canvas pixels back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        from_viewport(pixel.x, pixel.y, &self.state, self.width, self.height)
    }

    /// Checks whether a canvas pixel lies inside the canvas grown by `margin`.
    pub fn contains_pixel(&self, pixel: &Point, margin: f64) -> bool {
        self.pixel_bounds(margin).contains(pixel)
    }

    /// The canvas rectangle grown by `margin` on every side.
    pub fn pixel_bounds(&self, margin: f64) -> Bounds {
        Bounds::from_coords(-margin, -margin, self.width + margin, self.height + margin)
    }

    /// Camera after dragging the map content by `delta` pixels.
    pub fn panned(&self, delta: Point, limits: &ZoomLimits) -> MapState {
        let target = self.center_pixel().subtract(&delta);
        let center = self.pixel_to_lat_lng(&target);
        MapState {
            lat: center.lat,
            lng: center.lng,
            zoom: self.state.zoom,
        }
        .normalized(limits)
    }

    /// Camera after zooming to `zoom`, keeping the coordinate under `focus`
    /// fixed on screen when given.
    pub fn zoomed(&self, zoom: f64, focus: Option<Point>, limits: &ZoomLimits) -> MapState {
        let zoom = limits.clamp(zoom);
        let Some(focus) = focus else {
            return MapState { zoom, ..self.state }.normalized(limits);
        };

        let anchor = self.pixel_to_lat_lng(&focus);
        let zoomed = Viewport::new(MapState { zoom, ..self.state }, self.width, self.height);
        let drift = zoomed.lat_lng_to_pixel(&anchor).subtract(&focus);
        zoomed.panned(drift.multiply(-1.0), limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        assert_eq!(MapState::new(0.0, 0.0, 30.0).zoom, 17.0);
        assert_eq!(MapState::new(0.0, 0.0, 1.0).zoom, 5.0);
        assert_eq!(MapState::new(0.0, 0.0, f64::NAN).zoom, 5.0);
    }

    #[test]
    fn test_rounded_for_persistence() {
        let s = MapState::new(51.5051234, -0.0912345, 11.46).rounded();
        assert_eq!(s.lat, 51.50512);
        assert_eq!(s.lng, -0.09123);
        assert_eq!(s.zoom, 11.5);
    }

    #[test]
    fn test_pan_moves_center_opposite_to_drag() {
        let limits = ZoomLimits::default();
        let vp = Viewport::new(MapState::new(51.505, -0.09, 11.0), 800.0, 600.0);
        // dragging the content right reveals what lies to the west
        let moved = vp.panned(Point::new(100.0, 0.0), &limits);
        assert!(moved.lng < vp.state.lng);
        assert!((moved.lat - vp.state.lat).abs() < 1e-9);
        assert_eq!(moved.zoom, 11.0);
    }

    #[test]
    fn test_zoom_around_focus_keeps_anchor() {
        let limits = ZoomLimits::default();
        let vp = Viewport::new(MapState::new(51.505, -0.09, 11.0), 800.0, 600.0);
        let focus = Point::new(600.0, 150.0);
        let anchor = vp.pixel_to_lat_lng(&focus);

        let state = vp.zoomed(12.0, Some(focus), &limits);
        let after = Viewport::new(state, 800.0, 600.0).lat_lng_to_pixel(&anchor);
        assert!((after.x - focus.x).abs() < 1e-6);
        assert!((after.y - focus.y).abs() < 1e-6);
    }

    #[test]
    fn test_empty_viewport() {
        assert!(Viewport::new(MapState::default(), 0.0, 600.0).is_empty());
        assert!(!Viewport::new(MapState::default(), 1.0, 1.0).is_empty());
    }
}
