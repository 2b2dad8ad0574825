pub mod heatmap;
pub mod markers;

pub use heatmap::{HeatmapCompositor, HeatmapPath};
pub use markers::{draw_markers, status_color};
