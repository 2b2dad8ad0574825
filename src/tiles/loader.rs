use crossbeam_channel::{unbounded, Receiver, Sender};
use fxhash::FxHashSet as HashSet;
use image::RgbaImage;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::core::constants::DEFAULT_USER_AGENT;
use crate::runtime::AsyncSpawner;
use crate::{MapError, Result};

/// Client shared by every engine using the default user agent, so map
/// instances in one process reuse the same connection pool.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .pool_max_idle_per_host(8)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Fetches raw tile bytes for a URL.
#[async_trait::async_trait]
pub trait TileFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed fetcher. Needs a tokio runtime to be polled on.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetcher sending `user_agent`. The default agent reuses the shared
    /// client; any other gets a client of its own.
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        if user_agent == DEFAULT_USER_AGENT {
            return Ok(Self::default());
        }
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }
}

#[async_trait::async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(MapError::HttpStatus {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Outcome of one tile load, reported back to the engine.
#[derive(Debug, Clone)]
pub struct TileLoadResult {
    /// Cache key: the primary URL the load was issued for.
    pub url: String,
    /// `None` when both the primary and the fallback source failed.
    pub image: Option<Arc<RgbaImage>>,
}

/// Issues tile loads on a spawner and collects their results over a channel.
///
/// Loads are never cancelled; a result that arrives after the viewport moved
/// on still lands in the cache. A URL is loaded at most once at a time.
pub struct TileLoader {
    fetcher: Arc<dyn TileFetcher>,
    spawner: Arc<dyn AsyncSpawner>,
    tx: Sender<TileLoadResult>,
    rx: Receiver<TileLoadResult>,
    loading: HashSet<String>,
}

impl TileLoader {
    pub fn new(fetcher: Arc<dyn TileFetcher>, spawner: Arc<dyn AsyncSpawner>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            fetcher,
            spawner,
            tx,
            rx,
            loading: HashSet::default(),
        }
    }

    /// Starts loading `url`, trying `fallback_url` once if it fails.
    /// Returns false without fetching when `url` is already loading.
    pub fn request(&mut self, url: String, fallback_url: String) -> bool {
        if !self.loading.insert(url.clone()) {
            log::trace!("tile {} already loading", url);
            return false;
        }
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        log::debug!("requesting tile {}", url);

        self.spawner.spawn_boxed(Box::pin(async move {
            let image = load_with_fallback(fetcher.as_ref(), &url, &fallback_url).await;
            // receiver gone means the engine was dropped
            let _ = tx.send(TileLoadResult { url, image });
        }));
        true
    }

    /// Takes every result that has arrived since the last call.
    pub fn drain(&mut self) -> Vec<TileLoadResult> {
        let results: Vec<TileLoadResult> = self.rx.try_iter().collect();
        for result in &results {
            self.loading.remove(&result.url);
        }
        results
    }

    /// Loads issued and not yet drained.
    pub fn in_flight(&self) -> usize {
        self.loading.len()
    }

    pub fn is_loading(&self, url: &str) -> bool {
        self.loading.contains(url)
    }
}

async fn load_with_fallback(
    fetcher: &dyn TileFetcher,
    url: &str,
    fallback_url: &str,
) -> Option<Arc<RgbaImage>> {
    match fetch_and_decode(fetcher, url).await {
        Ok(image) => return Some(Arc::new(image)),
        Err(e) => log::warn!("tile {} failed: {}, trying {}", url, e, fallback_url),
    }
    match fetch_and_decode(fetcher, fallback_url).await {
        Ok(image) => Some(Arc::new(image)),
        Err(e) => {
            log::warn!("fallback tile {} failed: {}", fallback_url, e);
            None
        }
    }
}

async fn fetch_and_decode(fetcher: &dyn TileFetcher, url: &str) -> Result<RgbaImage> {
    let bytes = fetcher.fetch(url).await?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}
