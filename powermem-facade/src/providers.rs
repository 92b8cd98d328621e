//! Builds concrete provider/store instances from `PowerMemConfig` (§6.5).
//! The provider registry in `powermem-providers` stays a plain named-lookup
//! table for tests that want to swap instances by hand; the facade is the
//! one place that turns a config's `provider` string into a live object.

use std::sync::Arc;

use powermem_core::config::{EmbedderConfig, LlmConfig, RerankerConfig, SparseEmbedderConfig, StorageConfig};
use powermem_core::errors::{PowerMemError, PowerMemResult, ProviderError};
use powermem_core::traits::{Embedder, Llm, Reranker, SparseEmbedder, VectorStore};
use powermem_providers::{BagOfWordsSparseEmbedder, DeterministicEmbedder, HttpProvider, IdentityReranker, MockLlm};
use powermem_storage::rrf::ChannelWeights;
use powermem_storage::{InMemoryStore, SqliteStore};

pub fn build_llm(config: &LlmConfig) -> PowerMemResult<Arc<dyn Llm>> {
    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockLlm::new("{}"))),
        "http" | "openai" | "openai_compatible" => {
            let base_url = config
                .base_url
                .clone()
                .ok_or_else(|| PowerMemError::Config("llm.base_url is required for an http provider".to_string()))?;
            Ok(Arc::new(HttpProvider::new(base_url, config.api_key.clone(), config.model.clone(), String::new(), 0)))
        }
        other => Err(PowerMemError::Provider(ProviderError::UnknownProvider(format!("llm:{other}")))),
    }
}

pub fn build_embedder(config: &EmbedderConfig) -> PowerMemResult<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "deterministic" => Ok(Arc::new(DeterministicEmbedder::new(config.dims))),
        "http" | "openai" | "openai_compatible" => {
            let base_url = config.base_url.clone().ok_or_else(|| {
                PowerMemError::Config("embedder.base_url is required for an http provider".to_string())
            })?;
            Ok(Arc::new(HttpProvider::new(
                base_url,
                config.api_key.clone(),
                String::new(),
                config.model.clone(),
                config.dims,
            )))
        }
        other => Err(PowerMemError::Provider(ProviderError::UnknownProvider(format!("embedder:{other}")))),
    }
}

pub fn build_sparse_embedder(config: &Option<SparseEmbedderConfig>) -> Option<Arc<dyn SparseEmbedder>> {
    match config.as_ref().map(|c| c.provider.as_str()) {
        Some("bag_of_words") => Some(Arc::new(BagOfWordsSparseEmbedder)),
        _ => None,
    }
}

pub fn build_reranker(config: &RerankerConfig) -> Option<Arc<dyn Reranker>> {
    if !config.enabled {
        return None;
    }
    match config.provider.as_str() {
        "identity" => Some(Arc::new(IdentityReranker)),
        _ => None,
    }
}

/// Opens the physical `VectorStore` backing either the main collection or a
/// sub-store. `collection` overrides `config.collection_name` when a
/// sub-store declares its own (§6.5 `sub_stores[].collection_name`).
pub fn build_vector_store(config: &StorageConfig, collection: &str) -> PowerMemResult<Arc<dyn VectorStore>> {
    let weights = ChannelWeights {
        dense: config.vector_weight,
        fulltext: config.fts_weight,
        sparse: config.sparse_weight,
    };
    match config.provider.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "sqlite" => {
            let path = config
                .connection_args
                .get("path")
                .cloned()
                .unwrap_or_else(|| ":memory:".to_string());
            Ok(Arc::new(SqliteStore::open(&path, collection, weights)?))
        }
        other => Err(PowerMemError::Config(format!("unknown vector_store.provider: {other}"))),
    }
}
