//! Runtime abstraction layer for async operations
//!
//! Tile loads are the only asynchronous work in the engine. They are handed to
//! an [`AsyncSpawner`], so the engine itself never depends on a particular
//! executor: tokio in applications, an inline executor in tests and headless
//! tools with non-network fetchers.

use futures::future::BoxFuture;
use std::sync::Arc;

use crate::{MapError, Result};

/// A trait for spawning fire-and-forget async tasks (object-safe)
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>);
}

/// Runs each future to completion on the calling thread.
///
/// Only suitable for fetchers that do not need a reactor; `reqwest` requires
/// the tokio spawner.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSpawner;

impl AsyncSpawner for InlineSpawner {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
        futures::executor::block_on(future);
    }
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioSpawner;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::*;
    use ::tokio::runtime::Handle;

    /// Tokio-based async spawner
    #[derive(Debug, Clone)]
    pub struct TokioSpawner {
        handle: Handle,
    }

    impl TokioSpawner {
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Spawner for the runtime the caller is running in, if any.
        pub fn current() -> Option<Self> {
            Handle::try_current().ok().map(Self::new)
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
            self.handle.spawn(future);
        }
    }
}

/// Spawner for network tile loads: the tokio runtime the caller is running in.
///
/// Network fetchers are never paired with [`InlineSpawner`], which would block
/// the render path on I/O.
pub fn network_spawner() -> Result<Arc<dyn AsyncSpawner>> {
    match ambient_spawner() {
        Some(spawner) => Ok(spawner),
        None => Err(MapError::NoRuntime(
            "HTTP tile loading must start inside a tokio runtime".to_string(),
        )),
    }
}

#[cfg(feature = "tokio-runtime")]
fn ambient_spawner() -> Option<Arc<dyn AsyncSpawner>> {
    TokioSpawner::current().map(|s| Arc::new(s) as Arc<dyn AsyncSpawner>)
}

#[cfg(not(feature = "tokio-runtime"))]
fn ambient_spawner() -> Option<Arc<dyn AsyncSpawner>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inline_spawner_runs_to_completion() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        InlineSpawner.spawn_boxed(Box::pin(async move {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_network_spawner_needs_a_runtime() {
        assert!(matches!(network_spawner(), Err(MapError::NoRuntime(_))));
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_tokio_spawner_is_picked_inside_runtime() {
        assert!(TokioSpawner::current().is_some());
        let (tx, rx) = ::tokio::sync::oneshot::channel();
        let spawner = network_spawner().unwrap();
        spawner.spawn_boxed(Box::pin(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }
}
