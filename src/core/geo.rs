use crate::core::constants::MAX_LATITUDE;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// True when the coordinate can be pushed through the Mercator projection.
    /// The poles themselves project to infinity.
    pub fn is_projectable(&self) -> bool {
        self.is_valid() && self.lat.abs() < 90.0
    }

    /// Wraps longitude to [-180, 180) range
    pub fn wrap_lng(lng: f64) -> f64 {
        if (-180.0..180.0).contains(&lng) {
            return lng;
        }
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }

    /// Clamps latitude to the Mercator range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Number of tiles along one axis at zoom `z`.
    pub fn world_tiles(z: u8) -> i64 {
        1_i64 << z
    }

    /// Builds a coordinate from unbounded tile indices: x wraps around the
    /// world, y outside the world has no tile.
    pub fn wrapped(x: i64, y: i64, z: u8) -> Option<Self> {
        let n = Self::world_tiles(z);
        if y < 0 || y >= n {
            return None;
        }
        Some(Self::new(x.rem_euclid(n) as u32, y as u32, z))
    }

    /// Checks if the tile is valid for the given zoom level
    pub fn is_valid(&self) -> bool {
        let n = Self::world_tiles(self.z);
        (self.x as i64) < n && (self.y as i64) < n
    }
}

/// Workflow status of an incident, as reported by the host's incident store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    #[default]
    Reported,
    Investigating,
    Resolved,
}

impl IncidentStatus {
    /// Precedence when several incidents share one cluster; higher wins.
    pub fn precedence(self) -> u8 {
        match self {
            IncidentStatus::Reported => 3,
            IncidentStatus::Investigating => 2,
            IncidentStatus::Resolved => 1,
        }
    }

    /// Most urgent status among `statuses`, or `None` when empty.
    pub fn most_urgent<I: IntoIterator<Item = IncidentStatus>>(statuses: I) -> Option<Self> {
        statuses.into_iter().max_by_key(|s| s.precedence())
    }
}

/// The slice of an incident record the map needs to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPoint {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub status: IncidentStatus,
}

impl IncidentPoint {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            status: IncidentStatus::default(),
        }
    }

    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Malformed records (NaN, out of range, poles) are skipped by every
    /// drawing pass instead of failing the frame.
    pub fn is_renderable(&self) -> bool {
        self.lat_lng().is_projectable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_validity() {
        assert!(LatLng::new(40.7128, -74.0060).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
        assert!(!LatLng::new(0.0, 181.0).is_valid());
        assert!(LatLng::new(90.0, 0.0).is_valid());
        assert!(!LatLng::new(90.0, 0.0).is_projectable());
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(190.0), -170.0);
        assert_eq!(LatLng::wrap_lng(-190.0), 170.0);
        assert_eq!(LatLng::wrap_lng(45.0), 45.0);
        assert_eq!(LatLng::wrap_lng(180.0), -180.0);
    }

    #[test]
    fn test_tile_coord_wrapping() {
        assert_eq!(TileCoord::wrapped(-1, 0, 2), Some(TileCoord::new(3, 0, 2)));
        assert_eq!(TileCoord::wrapped(5, 1, 2), Some(TileCoord::new(1, 1, 2)));
        assert_eq!(TileCoord::wrapped(0, -1, 2), None);
        assert_eq!(TileCoord::wrapped(0, 4, 2), None);
        assert!(TileCoord::new(3, 3, 2).is_valid());
        assert!(!TileCoord::new(4, 0, 2).is_valid());
    }

    #[test]
    fn test_status_precedence() {
        let worst = IncidentStatus::most_urgent([
            IncidentStatus::Resolved,
            IncidentStatus::Reported,
            IncidentStatus::Investigating,
        ]);
        assert_eq!(worst, Some(IncidentStatus::Reported));
        assert_eq!(IncidentStatus::most_urgent(Vec::new()), None);
    }

    #[test]
    fn test_incident_renderable() {
        assert!(IncidentPoint::new("a", 51.5, -0.1).is_renderable());
        assert!(!IncidentPoint::new("b", f64::NAN, -0.1).is_renderable());
        assert!(!IncidentPoint::new("c", 51.5, f64::INFINITY).is_renderable());
    }
}
