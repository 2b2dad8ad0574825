pub mod cache;
pub mod loader;
pub mod resolver;
pub mod source;

// Re-exports for convenience
pub use cache::{CachedTile, TileCache};
pub use loader::{HttpFetcher, TileFetcher, TileLoadResult, TileLoader};
pub use resolver::{TileRange, TileResolver, TileSlot};
pub use source::{TemplateSource, TileSource, TileSources};
