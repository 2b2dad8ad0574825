//! Prelude module for common incimap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use incimap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{
        ClusteringConfig, DeviceClass, EngineConfig, HeatmapConfig, InteractionConfig,
        SchedulerConfig, TileLoadingConfig, ZoomLimits,
    },
    geo::{IncidentPoint, IncidentStatus, LatLng, Point, TileCoord},
    map::{FrameOutcome, FrameStats, MapEngine},
    projection::{from_viewport, project, to_viewport, unproject},
    viewport::{DisplayMode, MapState, Theme, Viewport},
};

pub use crate::input::{
    events::{ChannelListener, InputEvent, Key, MapEvent, MapListener, TouchPoint},
    handler::InteractionController,
};

pub use crate::animation::{easing::EasingFunction, flight::Animation};

pub use crate::spatial::clustering::{Cluster, Marker};

pub use crate::rendering::{
    raster::RasterSurface,
    scheduler::{RenderScheduler, ScheduleDecision},
    surface::{Color, Surface},
};

pub use crate::runtime::{AsyncSpawner, InlineSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::tiles::{
    cache::{CachedTile, TileCache},
    loader::{HttpFetcher, TileFetcher, TileLoader},
    resolver::{TileResolver, TileSlot},
    source::TileSources,
};

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
