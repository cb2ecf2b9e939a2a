use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

/// In-memory embedding cache backed by moka.
///
/// Keyed by embedder name plus text so switching embedders never returns
/// vectors of the wrong dimension. Entries expire after the TTL.
pub struct EmbeddingCache {
    inner: Cache<String, Arc<Vec<f32>>>,
}

fn cache_key(embedder: &str, text: &str) -> String {
    format!("{embedder}\u{1f}{text}")
}

impl EmbeddingCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, embedder: &str, text: &str) -> Option<Arc<Vec<f32>>> {
        self.inner.get(&cache_key(embedder, text)).await
    }

    pub async fn insert(&self, embedder: &str, text: &str, vector: Vec<f32>) {
        self.inner
            .insert(cache_key(embedder, text), Arc::new(vector))
            .await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
