pub mod easing;
pub mod flight;

// Re-export commonly used types and functions for convenience
pub use easing::{lerp, EasingFunction};
pub use flight::{fit_bounds, Animation};
