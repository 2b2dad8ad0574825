//! # incimap
//!
//! A self-contained slippy-map rendering engine for incident maps.
//!
//! The engine projects incident points with Web Mercator, resolves and caches
//! raster tiles for the current viewport, clusters nearby incidents at low zoom,
//! composites a heatmap overlay and drives an adaptive render schedule with
//! pan, zoom, pinch and fly-to interaction. Drawing goes through the
//! [`Surface`](rendering::surface::Surface) trait so the host decides what a
//! canvas is.

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod spatial;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{DeviceClass, EngineConfig},
    geo::{IncidentPoint, IncidentStatus, LatLng, Point, TileCoord},
    map::{FrameOutcome, FrameStats, MapEngine},
    viewport::{DisplayMode, MapState, Theme, Viewport},
};

pub use input::{
    events::{ChannelListener, InputEvent, MapEvent, MapListener},
    handler::InteractionController,
};

pub use rendering::{
    raster::RasterSurface,
    scheduler::{RenderScheduler, ScheduleDecision},
    surface::{Color, Surface},
};

pub use spatial::clustering::{Cluster, Marker};

pub use tiles::{cache::TileCache, loader::TileLoader, resolver::TileResolver};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Network tile loading needs a tokio runtime and none is running.
    #[error("No async runtime: {0}")]
    NoRuntime(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
