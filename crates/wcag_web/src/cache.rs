use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use wcag_core::{Result, Revalidator};

#[derive(Debug, Default)]
struct Pages {
    bodies: HashMap<String, Value>,
    /// Bumped on every eviction of the path.
    generations: HashMap<String, u64>,
}

impl Pages {
    fn generation(&self, path: &str) -> u64 {
        self.generations.get(path).copied().unwrap_or(0)
    }
}

/// Rendered blog responses keyed by site path (`/blog`, `/blog/<slug>`).
/// Entries live until the path is revalidated.
///
/// A render is only stored if the path was not revalidated while it was
/// being built: callers take `generation` before reading the store and pass
/// it back to `insert_if_fresh`.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: RwLock<Pages>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Value> {
        self.pages.read().await.bodies.get(path).cloned()
    }

    pub async fn generation(&self, path: &str) -> u64 {
        self.pages.read().await.generation(path)
    }

    /// Stores `body` unless `path` was evicted after `generation` was read.
    pub async fn insert_if_fresh(&self, path: &str, generation: u64, body: Value) -> bool {
        let mut pages = self.pages.write().await;
        if pages.generation(path) != generation {
            return false;
        }
        pages.bodies.insert(path.to_string(), body);
        true
    }

    /// Drops the cached rendering of `path`. Returns whether one existed.
    pub async fn evict(&self, path: &str) -> bool {
        let mut pages = self.pages.write().await;
        *pages.generations.entry(path.to_string()).or_insert(0) += 1;
        pages.bodies.remove(path).is_some()
    }
}

#[async_trait]
impl Revalidator for PageCache {
    async fn revalidate(&self, path: &str) -> Result<()> {
        if self.evict(path).await {
            tracing::info!("Revalidated path: {}", path);
        } else {
            tracing::debug!("Revalidated uncached path: {}", path);
        }
        Ok(())
    }
}
