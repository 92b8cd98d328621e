//! A string-keyed factory registry so providers are hot-pluggable by short
//! name (config says `llm.provider = "openai"`, the facade resolves it here)
//! instead of being wired up by hand at every call site.

use std::sync::Arc;

use dashmap::DashMap;

use powermem_core::errors::{PowerMemError, PowerMemResult, ProviderError};
use powermem_core::traits::{Embedder, Llm, Reranker, SparseEmbedder};

/// Holds one named instance per provider kind. Registration is typically
/// done once at startup from config; lookups happen on every ingest/search
/// call, so `DashMap` keeps reads lock-free under concurrent access.
#[derive(Default)]
pub struct ProviderRegistry {
    llms: DashMap<String, Arc<dyn Llm>>,
    embedders: DashMap<String, Arc<dyn Embedder>>,
    sparse_embedders: DashMap<String, Arc<dyn SparseEmbedder>>,
    rerankers: DashMap<String, Arc<dyn Reranker>>,
}

fn not_found(kind: &str, name: &str) -> PowerMemError {
    PowerMemError::Provider(ProviderError::UnknownProvider(format!("{kind}:{name}")))
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_llm(&self, name: impl Into<String>, llm: Arc<dyn Llm>) {
        self.llms.insert(name.into(), llm);
    }

    pub fn register_embedder(&self, name: impl Into<String>, embedder: Arc<dyn Embedder>) {
        self.embedders.insert(name.into(), embedder);
    }

    pub fn register_sparse_embedder(&self, name: impl Into<String>, embedder: Arc<dyn SparseEmbedder>) {
        self.sparse_embedders.insert(name.into(), embedder);
    }

    pub fn register_reranker(&self, name: impl Into<String>, reranker: Arc<dyn Reranker>) {
        self.rerankers.insert(name.into(), reranker);
    }

    pub fn llm(&self, name: &str) -> PowerMemResult<Arc<dyn Llm>> {
        self.llms.get(name).map(|e| e.clone()).ok_or_else(|| not_found("llm", name))
    }

    pub fn embedder(&self, name: &str) -> PowerMemResult<Arc<dyn Embedder>> {
        self.embedders
            .get(name)
            .map(|e| e.clone())
            .ok_or_else(|| not_found("embedder", name))
    }

    pub fn sparse_embedder(&self, name: &str) -> PowerMemResult<Arc<dyn SparseEmbedder>> {
        self.sparse_embedders
            .get(name)
            .map(|e| e.clone())
            .ok_or_else(|| not_found("sparse_embedder", name))
    }

    pub fn reranker(&self, name: &str) -> PowerMemResult<Arc<dyn Reranker>> {
        self.rerankers
            .get(name)
            .map(|e| e.clone())
            .ok_or_else(|| not_found("reranker", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{DeterministicEmbedder, MockLlm};

    #[test]
    fn registers_and_resolves_by_name() {
        let registry = ProviderRegistry::new();
        registry.register_llm("mock", Arc::new(MockLlm::new("hi")));
        registry.register_embedder("deterministic", Arc::new(DeterministicEmbedder::new(8)));

        assert!(registry.llm("mock").is_ok());
        assert!(registry.embedder("deterministic").is_ok());
    }

    #[test]
    fn unknown_name_is_a_provider_error() {
        let registry = ProviderRegistry::new();
        let err = registry.llm("nonexistent").unwrap_err();
        assert!(matches!(err, PowerMemError::Provider(ProviderError::UnknownProvider(_))));
    }
}
