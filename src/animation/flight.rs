//! Fly-to transitions and the fit-bounds zoom search.

use crate::animation::easing::{lerp, EasingFunction};
use crate::core::bounds::Bounds;
use crate::core::config::ZoomLimits;
use crate::core::geo::IncidentPoint;
use crate::core::projection::project;
use crate::core::viewport::MapState;
use instant::Instant;
use std::time::Duration;

/// An in-progress camera interpolation.
///
/// Latitude and longitude move linearly; zoom follows `zoom_easing`.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub from: MapState,
    pub to: MapState,
    pub start: Instant,
    pub duration: Duration,
    pub zoom_easing: EasingFunction,
}

impl Animation {
    pub fn new(from: MapState, to: MapState, start: Instant, duration: Duration) -> Self {
        // take the short way round the antimeridian
        let mut to = to;
        let delta = to.lng - from.lng;
        if delta > 180.0 {
            to.lng -= 360.0;
        } else if delta < -180.0 {
            to.lng += 360.0;
        }
        Self {
            from,
            to,
            start,
            duration,
            zoom_easing: EasingFunction::EaseInOutCubic,
        }
    }

    /// Elapsed fraction of the transition in [0, 1].
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Camera at a given progress value.
    pub fn state_at_progress(&self, t: f64) -> MapState {
        let t = t.clamp(0.0, 1.0);
        MapState {
            lat: lerp(self.from.lat, self.to.lat, t),
            lng: lerp(self.from.lng, self.to.lng, t),
            zoom: lerp(self.from.zoom, self.to.zoom, self.zoom_easing.apply(t)),
        }
    }

    /// Camera at `now`, not yet normalised.
    pub fn sample(&self, now: Instant) -> MapState {
        self.state_at_progress(self.progress(now))
    }
}

/// Camera that frames every renderable point inside a `width` x `height`
/// canvas less `padding` on each side.
///
/// Centres on the centroid and picks the highest integer zoom at which the
/// projected bounding box still fits; a single point lands on the maximum
/// zoom. Returns `None` when there is no renderable point.
pub fn fit_bounds(
    points: &[IncidentPoint],
    width: f64,
    height: f64,
    padding: f64,
    limits: &ZoomLimits,
) -> Option<MapState> {
    let valid: Vec<&IncidentPoint> = points.iter().filter(|p| p.is_renderable()).collect();
    if valid.is_empty() {
        return None;
    }

    let n = valid.len() as f64;
    let lat = valid.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = valid.iter().map(|p| p.lng).sum::<f64>() / n;

    let avail_w = width - 2.0 * padding;
    let avail_h = height - 2.0 * padding;
    let min_z = limits.min.ceil() as i32;
    let max_z = limits.max.floor() as i32;

    let mut best = limits.min;
    for z in min_z..=max_z {
        let zoom = z as f64;
        let bounds = Bounds::from_points(valid.iter().map(|p| project(p.lat, p.lng, zoom)));
        match bounds {
            Some(b) if b.fits_within(avail_w, avail_h) => best = zoom,
            _ => break,
        }
    }

    Some(MapState::new(lat, lng, best).normalized(limits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fly_to_eases_zoom() {
        let t0 = Instant::now();
        let anim = Animation::new(
            MapState::new(51.505, -0.09, 11.0),
            MapState::new(51.5, -0.1, 14.0),
            t0,
            Duration::from_millis(1000),
        );

        let mid = anim.sample(t0 + Duration::from_millis(500));
        assert!(mid.zoom > 11.0 && mid.zoom < 14.0);
        assert!((mid.zoom - (11.0 + 3.0 * EasingFunction::EaseInOutCubic.apply(0.5))).abs() < 1e-9);
        assert!((mid.lat - 51.5025).abs() < 1e-9);

        // the eased curve lags the linear one early on
        let quarter = anim.sample(t0 + Duration::from_millis(250));
        assert!(quarter.zoom < 11.75);
        assert!((quarter.zoom - 11.1875).abs() < 1e-9);
        assert!((quarter.lng - (-0.0925)).abs() < 1e-9);

        assert!(anim.is_finished(t0 + Duration::from_millis(1000)));
        assert_eq!(anim.sample(t0 + Duration::from_secs(5)).zoom, 14.0);
    }

    #[test]
    fn test_fly_across_antimeridian_takes_short_path() {
        let t0 = Instant::now();
        let anim = Animation::new(
            MapState::new(0.0, 170.0, 6.0),
            MapState::new(0.0, -170.0, 6.0),
            t0,
            Duration::from_millis(1000),
        );
        let mid = anim.state_at_progress(0.5);
        assert!((mid.lng - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_bounds_empty_is_none() {
        assert!(fit_bounds(&[], 800.0, 600.0, 50.0, &ZoomLimits::default()).is_none());
        let bad = [IncidentPoint::new("x", f64::NAN, 0.0)];
        assert!(fit_bounds(&bad, 800.0, 600.0, 50.0, &ZoomLimits::default()).is_none());
    }

    #[test]
    fn test_fit_bounds_single_point_is_max_zoom() {
        let pts = [IncidentPoint::new("a", 51.5, -0.1)];
        let s = fit_bounds(&pts, 800.0, 600.0, 50.0, &ZoomLimits::default()).unwrap();
        assert_eq!(s.zoom, 17.0);
        assert!((s.lat - 51.5).abs() < 1e-9);
    }

    #[test]
    fn test_fit_bounds_is_maximal() {
        let limits = ZoomLimits::default();
        let pts = [
            IncidentPoint::new("a", 51.45, -0.25),
            IncidentPoint::new("b", 51.56, 0.05),
            IncidentPoint::new("c", 51.50, -0.10),
        ];
        let s = fit_bounds(&pts, 800.0, 600.0, 50.0, &limits).unwrap();

        let bbox = |zoom: f64| {
            Bounds::from_points(pts.iter().map(|p| project(p.lat, p.lng, zoom))).unwrap()
        };
        assert!(bbox(s.zoom).fits_within(700.0, 500.0));
        assert!(s.zoom == limits.max || !bbox(s.zoom + 1.0).fits_within(700.0, 500.0));
        assert!((s.lat - (51.45 + 51.56 + 51.50) / 3.0).abs() < 1e-9);
    }
}
