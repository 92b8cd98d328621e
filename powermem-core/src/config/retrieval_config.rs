//! Hybrid-search fusion and reranking knobs (§4.5, §6.5 `vector_store.{vector_weight,fts_weight,sparse_weight}`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Reciprocal-rank-fusion constant `k` (§4.5 step 5).
    pub rrf_k: f64,
    pub default_limit: usize,
    /// Fetch `rerank_fanout_multiple * limit` candidates before handing them to the reranker.
    pub rerank_fanout_multiple: usize,
    /// Per-store fan-out timeout before that channel's hits are dropped with a warning.
    pub channel_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            default_limit: 10,
            rerank_fanout_multiple: 3,
            channel_timeout_ms: 2_000,
        }
    }
}
