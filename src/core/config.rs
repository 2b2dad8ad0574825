//! Configuration system for engine behaviour and performance tuning
//!
//! Every tunable number of the engine lives in one of the sub-configs below.
//! Hosts start from a device preset and override individual fields, either in
//! code or from JSON:
//!
//! ```
//! use incimap::core::config::{DeviceClass, EngineConfig};
//!
//! let config = EngineConfig::from_json_str(r#"{ "clustering": { "radius_px": 80.0 } }"#)
//!     .unwrap();
//! assert_eq!(config.clustering.radius_px, 80.0);
//! assert_eq!(EngineConfig::for_device(DeviceClass::Mobile).scheduler.idle_interval_ms, 1000);
//! ```

use crate::core::constants::*;
use crate::core::viewport::MapState;
use crate::rendering::surface::Color;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Device class, which decides how lazily the map redraws when idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub zoom: ZoomLimits,
    pub tiles: TileLoadingConfig,
    pub clustering: ClusteringConfig,
    pub heatmap: HeatmapConfig,
    pub scheduler: SchedulerConfig,
    pub interaction: InteractionConfig,
    /// Camera used when there is nothing to fit.
    pub default_camera: MapState,
}

impl EngineConfig {
    pub fn for_device(device: DeviceClass) -> Self {
        Self {
            scheduler: SchedulerConfig::for_device(device),
            ..Self::default()
        }
    }

    /// Parses a (possibly partial) JSON document on top of the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            tiles: TileLoadingConfig::default(),
            clustering: ClusteringConfig::default(),
            heatmap: HeatmapConfig::default(),
            scheduler: SchedulerConfig::default(),
            interaction: InteractionConfig::default(),
            default_camera: MapState::new(51.505, -0.09, 11.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    pub cache_size: usize,
    /// Extra ring of tiles requested around the visible area.
    pub margin_tiles: i64,
    /// Base map template; `{s}`, `{theme}`, `{z}`, `{x}`, `{y}` are substituted.
    pub base_url: String,
    pub subdomains: Vec<String>,
    pub light_theme: String,
    pub dark_theme: String,
    /// Satellite template, note the `{y}/{x}` order of the provider.
    pub satellite_url: String,
    /// Source tried once when the primary tile fails.
    pub fallback_url: String,
    pub user_agent: String,
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            cache_size: TILE_CACHE_LIMIT,
            margin_tiles: 1,
            base_url: "https://{s}.basemaps.cartocdn.com/{theme}/{z}/{x}/{y}.png".to_string(),
            subdomains: ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect(),
            light_theme: "light_all".to_string(),
            dark_theme: "dark_all".to_string(),
            satellite_url:
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
                    .to_string(),
            fallback_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub radius_px: f64,
    /// Clustering applies strictly below this zoom.
    pub max_zoom: f64,
    /// Marker radius is `base_radius_px + growth_px * ln(count)`.
    pub base_radius_px: f64,
    pub growth_px: f64,
    pub pin_radius_px: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            radius_px: CLUSTER_RADIUS_PX,
            max_zoom: CLUSTER_MAX_ZOOM,
            base_radius_px: 14.0,
            growth_px: 5.0,
            pin_radius_px: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub radius_px: f64,
    /// Above this many visible points the density grid replaces per-point gradients.
    pub grid_threshold: usize,
    pub grid_cell_px: f64,
    pub opacity: f32,
    /// Colour stops from low to high density, used by the grid path.
    pub gradient: Vec<(f64, Color)>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius_px: HEATMAP_RADIUS_PX,
            grid_threshold: 2000,
            grid_cell_px: 4.0,
            opacity: 0.6,
            gradient: vec![
                (0.0, Color::rgba(0, 0, 255, 0)),
                (0.2, Color::rgba(0, 0, 255, 128)),
                (0.4, Color::rgba(0, 255, 255, 160)),
                (0.6, Color::rgba(0, 255, 0, 192)),
                (0.8, Color::rgba(255, 255, 0, 224)),
                (1.0, Color::rgba(255, 0, 0, 255)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub active_interval_ms: u64,
    pub idle_interval_ms: u64,
    pub quiet_period_ms: u64,
    pub fly_duration_ms: u64,
    pub fit_padding_px: f64,
}

impl SchedulerConfig {
    pub fn for_device(device: DeviceClass) -> Self {
        let idle_interval_ms = match device {
            DeviceClass::Desktop => IDLE_FRAME_INTERVAL_DESKTOP_MS,
            DeviceClass::Mobile => IDLE_FRAME_INTERVAL_MOBILE_MS,
        };
        Self {
            idle_interval_ms,
            ..Self::default()
        }
    }

    pub fn active_interval(&self) -> Duration {
        Duration::from_millis(self.active_interval_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn fly_duration(&self) -> Duration {
        Duration::from_millis(self.fly_duration_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            active_interval_ms: ACTIVE_FRAME_INTERVAL_MS,
            idle_interval_ms: IDLE_FRAME_INTERVAL_DESKTOP_MS,
            quiet_period_ms: INTERACTION_QUIET_MS,
            fly_duration_ms: FLY_DURATION_MS,
            fit_padding_px: FIT_PADDING_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub drag_threshold_px: f64,
    pub hit_tolerance_px: f64,
    pub key_pan_px: f64,
    pub wheel_zoom_step: f64,
    pub key_zoom_step: f64,
    /// Keep the coordinate under the cursor fixed while wheel-zooming.
    pub zoom_to_cursor: bool,
    /// Zoom levels added when a cluster is clicked.
    pub cluster_zoom_step: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DRAG_THRESHOLD_PX,
            hit_tolerance_px: HIT_TOLERANCE_PX,
            key_pan_px: KEY_PAN_PX,
            wheel_zoom_step: 1.0,
            key_zoom_step: 1.0,
            zoom_to_cursor: false,
            cluster_zoom_step: 2.0,
        }
    }
}
