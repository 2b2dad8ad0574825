pub mod raster;
pub mod scheduler;
pub mod surface;

// Re-export main types
pub use raster::RasterSurface;
pub use scheduler::{RenderMode, RenderScheduler, ScheduleDecision};
pub use surface::{Color, Surface};
