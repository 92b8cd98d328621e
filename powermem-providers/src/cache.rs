//! Embedding cache: a `moka` in-memory tier in front of any `Embedder`,
//! keyed by a blake3 hash of `(action, text)` so repeated ingest/retrieval
//! of the same content skips the provider call entirely.

use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;

use powermem_core::errors::PowerMemResult;
use powermem_core::traits::{EmbedAction, Embedder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitTier {
    Hit,
    Miss,
}

fn cache_key(text: &str, action: EmbedAction) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(format!("{action:?}").as_bytes());
    hasher.update(b"\0");
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Wraps an `Embedder`, serving repeat `(action, text)` pairs from an
/// in-memory LRU/TTL cache. `capacity` bounds the number of cached vectors;
/// `ttl` bounds how long an entry stays fresh.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache<String, Vec<f32>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: u64, ttl: std::time::Duration) -> Self {
        let cache = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self { inner, cache }
    }

    /// Looks up the cache without going to the provider; used by tests and
    /// by metrics code that wants to report hit/miss without side effects.
    pub fn peek(&self, text: &str, action: EmbedAction) -> (Option<Vec<f32>>, CacheHitTier) {
        match self.cache.get(&cache_key(text, action)) {
            Some(vec) => (Some(vec), CacheHitTier::Hit),
            None => (None, CacheHitTier::Miss),
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str, action: EmbedAction) -> PowerMemResult<Vec<f32>> {
        let key = cache_key(text, action);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let embedding = self.inner.embed(text, action).await?;
        self.cache.insert(key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String], action: EmbedAction) -> PowerMemResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();
        let mut miss_indices = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let key = cache_key(text, action);
            match self.cache.get(&key) {
                Some(vec) => out.push(Some(vec)),
                None => {
                    out.push(None);
                    misses.push(text.clone());
                    miss_indices.push(i);
                }
            }
        }
        if !misses.is_empty() {
            let fetched = self.inner.embed_batch(&misses, action).await?;
            for (idx, vec) in miss_indices.into_iter().zip(fetched) {
                self.cache.insert(cache_key(&texts[idx], action), vec.clone());
                out[idx] = Some(vec);
            }
        }
        Ok(out.into_iter().map(|v| v.expect("every slot filled above")).collect())
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
