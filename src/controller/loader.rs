//! Origin loaders: the authoritative source consulted after every peer misses.

use std::collections::HashMap;
use std::future::Future;

use anyhow::anyhow;
use futures::future::BoxFuture;

/// Future returned by [`OriginLoader::load`].
pub type LoaderFuture = BoxFuture<'static, anyhow::Result<Vec<u8>>>;

/// Application-supplied origin for a controller.
///
/// Any `Fn(String) -> impl Future<Output = anyhow::Result<Vec<u8>>>` closure
/// is a loader.
pub trait OriginLoader: Send + Sync {
    fn load(&self, key: &str) -> LoaderFuture;
}

impl<F, Fut> OriginLoader for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send + 'static,
{
    fn load(&self, key: &str) -> LoaderFuture {
        Box::pin(self(key.to_string()))
    }
}

/// Loader backed by a fixed in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    table: HashMap<String, Vec<u8>>,
}

impl MapLoader {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self {
            table: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl OriginLoader for MapLoader {
    fn load(&self, key: &str) -> LoaderFuture {
        let found = self.table.get(key).cloned();
        let key = key.to_string();
        Box::pin(async move { found.ok_or_else(|| anyhow!("{key} not exist")) })
    }
}

/// Loader that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrigin;

impl OriginLoader for NoOrigin {
    fn load(&self, key: &str) -> LoaderFuture {
        let key = key.to_string();
        Box::pin(async move { Err(anyhow!("no origin configured for {key}")) })
    }
}
