use fxhash::FxHashSet as HashSet;
use image::RgbaImage;
use lru::LruCache;
use std::sync::Arc;

/// State of one tile URL in the cache.
#[derive(Debug, Clone)]
pub enum CachedTile {
    /// A load has been issued and not yet reported back.
    Pending,
    /// Decoded tile ready to draw.
    Ready(Arc<RgbaImage>),
    /// Both the primary and the fallback source failed; drawn as background.
    Missing,
}

impl CachedTile {
    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            CachedTile::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CachedTile::Pending)
    }
}

/// Bounded tile store keyed by URL with viewport-aware eviction.
///
/// Entries are kept in insertion order; reads never promote. Once the size
/// exceeds the limit, the oldest entries outside the last declared viewport
/// set go first, and only then the oldest viewport entries.
#[derive(Debug)]
pub struct TileCache {
    entries: LruCache<String, CachedTile>,
    viewport: HashSet<String>,
    max_size: usize,
}

impl TileCache {
    /// Create a new tile cache holding at most `max_size` entries
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            viewport: HashSet::default(),
            max_size: max_size.max(1),
        }
    }

    /// Get a tile from the cache without touching its position
    pub fn get(&self, url: &str) -> Option<&CachedTile> {
        self.entries.peek(url)
    }

    /// Check if a tile is in the cache
    pub fn has(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    /// Insert or update a tile. Updating keeps the original insertion slot.
    pub fn set(&mut self, url: impl Into<String>, tile: CachedTile) {
        let url = url.into();
        if let Some(existing) = self.entries.peek_mut(&url) {
            *existing = tile;
            return;
        }
        self.entries.put(url, tile);
        self.evict();
    }

    /// Declares the tiles of the frame being drawn. Called once per frame.
    pub fn set_viewport_tiles<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.viewport.clear();
        self.viewport.extend(urls.into_iter().map(Into::into));
    }

    pub fn is_in_viewport(&self, url: &str) -> bool {
        self.viewport.contains(url)
    }

    fn evict(&mut self) {
        while self.entries.len() > self.max_size {
            let victim = self
                .entries
                .iter()
                .rev()
                .map(|(url, _)| url)
                .find(|url| !self.viewport.contains(url.as_str()))
                .cloned();
            match victim {
                Some(url) => {
                    log::trace!("evicting off-screen tile {}", url);
                    self.entries.pop(&url);
                }
                None => {
                    if let Some((url, _)) = self.entries.pop_lru() {
                        log::debug!("cache full of visible tiles, evicting {}", url);
                    }
                }
            }
        }
    }

    /// Remove a tile from the cache
    pub fn remove(&mut self, url: &str) -> Option<CachedTile> {
        self.entries.pop(url)
    }

    /// Clear all tiles from the cache
    pub fn clear(&mut self) {
        self.entries.clear();
        self.viewport.clear();
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(crate::core::constants::TILE_CACHE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(i: usize) -> String {
        format!("https://tiles/{}.png", i)
    }

    fn ready() -> CachedTile {
        CachedTile::Ready(Arc::new(RgbaImage::new(1, 1)))
    }

    #[test]
    fn test_tile_cache_basic_operations() {
        let mut cache = TileCache::new(4);
        assert!(cache.is_empty());

        cache.set(url(1), CachedTile::Pending);
        assert!(cache.has(&url(1)));
        assert!(cache.get(&url(1)).unwrap().is_pending());

        cache.set(url(1), ready());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&url(1)).unwrap().image().is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_size_never_exceeds_limit() {
        let mut cache = TileCache::new(400);
        for i in 0..1000 {
            cache.set(url(i), CachedTile::Missing);
            assert!(cache.len() <= 400);
        }
        assert_eq!(cache.len(), 400);
        // plain insertion order once there is no viewport
        assert!(!cache.has(&url(599)));
        assert!(cache.has(&url(600)));
    }

    #[test]
    fn test_viewport_tiles_survive_eviction() {
        let mut cache = TileCache::new(3);
        cache.set(url(0), ready());
        cache.set(url(1), ready());
        cache.set_viewport_tiles(vec![url(0), url(1)]);
        cache.set(url(2), ready());
        cache.set(url(3), ready());

        // url(2) was the oldest entry outside the viewport
        assert!(cache.has(&url(0)));
        assert!(cache.has(&url(1)));
        assert!(!cache.has(&url(2)));
        assert!(cache.has(&url(3)));
    }

    #[test]
    fn test_viewport_tiles_go_last_in_insertion_order() {
        let mut cache = TileCache::new(2);
        cache.set_viewport_tiles(vec![url(0), url(1), url(2)]);
        cache.set(url(0), ready());
        cache.set(url(1), ready());
        cache.set(url(2), ready());
        assert!(!cache.has(&url(0)));
        assert!(cache.has(&url(1)));
        assert!(cache.has(&url(2)));
    }

    #[test]
    fn test_update_keeps_insertion_slot() {
        let mut cache = TileCache::new(2);
        cache.set(url(0), CachedTile::Pending);
        cache.set(url(1), CachedTile::Pending);
        cache.set(url(0), ready());
        cache.set(url(2), ready());
        assert!(!cache.has(&url(0)));
        assert!(cache.has(&url(1)));
    }

    #[test]
    fn test_reads_do_not_promote() {
        let mut cache = TileCache::new(2);
        cache.set(url(0), ready());
        cache.set(url(1), ready());
        let _ = cache.get(&url(0));
        cache.set(url(2), ready());
        assert!(!cache.has(&url(0)));
    }
}
