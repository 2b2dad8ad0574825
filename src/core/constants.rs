//! Core constants derived from common web-map conventions and the incident map's defaults.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude limit of the Web Mercator square world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Lowest zoom the camera may reach.
pub const MIN_ZOOM: f64 = 5.0;

/// Highest zoom the camera may reach.
pub const MAX_ZOOM: f64 = 17.0;

/// Maximum number of tile entries kept in the cache.
pub const TILE_CACHE_LIMIT: usize = 400;

/// Pixel radius within which incidents are grouped into a cluster.
pub const CLUSTER_RADIUS_PX: f64 = 60.0;

/// Clustering applies strictly below this zoom.
pub const CLUSTER_MAX_ZOOM: f64 = 12.0;

/// Radius of a single heatmap splat in pixels.
pub const HEATMAP_RADIUS_PX: f64 = 25.0;

/// Tolerance around a marker for click hit-testing.
pub const HIT_TOLERANCE_PX: f64 = 10.0;

/// Inter-frame interval while the user is interacting.
pub const ACTIVE_FRAME_INTERVAL_MS: u64 = 16;

/// Inter-frame interval on desktop when nothing is happening.
pub const IDLE_FRAME_INTERVAL_DESKTOP_MS: u64 = 500;

/// Inter-frame interval on mobile when nothing is happening.
pub const IDLE_FRAME_INTERVAL_MOBILE_MS: u64 = 1000;

/// Time without interaction before the scheduler drops back to idle.
pub const INTERACTION_QUIET_MS: u64 = 500;

/// Duration of fly-to and fit-bounds transitions.
pub const FLY_DURATION_MS: u64 = 1000;

/// Padding kept free around the points when fitting bounds.
pub const FIT_PADDING_PX: f64 = 50.0;

/// Pixels panned by one arrow key press.
pub const KEY_PAN_PX: f64 = 100.0;

/// Pointer movement before a press turns into a drag.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// User agent sent with tile requests unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("incimap/", env!("CARGO_PKG_VERSION"));
