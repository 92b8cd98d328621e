//! Hybrid search orchestration (§4.8): router fanout, cross-store RRF
//! fusion, thresholding, optional rerank, best-effort reinforcement
//! write-back, and `_fusion_info` annotation for observability.

pub mod fusion;
pub mod writeback;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::warn;

use powermem_core::config::RetrievalConfig;
use powermem_core::errors::{PowerMemError, PowerMemResult, RetrievalError};
use powermem_core::filter::FilterExpr;
use powermem_core::memory::{MemoryId, ScopeKeys};
use powermem_core::traits::{Embedder, ProfileLookup, Reranker, SearchQuery, SparseEmbedder, VectorStore};
use powermem_retention::{reinforce, DecayContext};
use powermem_router::{ReadTarget, Router};

pub use fusion::{FusedHit, FusionInfo, StoreContribution};
pub use writeback::RetentionWriteBack;

pub struct RetrievalRequest {
    pub query: String,
    pub scope_keys: ScopeKeys,
    pub filters: Option<FilterExpr>,
    pub limit: usize,
    pub threshold: Option<f64>,
    pub add_profile: bool,
}

#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub id: MemoryId,
    pub payload: Map<String, Value>,
    pub score: f64,
    pub fusion_info: FusionInfo,
}

pub struct RetrievalResponse {
    pub hits: Vec<RetrievalHit>,
    pub profile: Option<Value>,
    /// One entry per store that errored during fan-out, when at least one
    /// other store still succeeded (§10.6 degraded retrieval). Empty on a
    /// fully healthy search.
    pub warnings: Vec<String>,
}

/// Merges a request's explicit filter with its scope keys: every search is
/// implicitly scoped to the caller's identity (§3.4 I-scope) regardless of
/// what filter the caller passed.
fn scoped_filter(scope_keys: &ScopeKeys, filters: Option<FilterExpr>) -> Option<FilterExpr> {
    match (scope_keys.as_filter(), filters) {
        (None, other) => other,
        (Some(scope), None) => Some(scope),
        (Some(scope), Some(explicit)) => Some(FilterExpr::And(vec![scope, explicit])),
    }
}

pub struct RetrievalEngine {
    router: Arc<Router>,
    embedder: Arc<dyn Embedder>,
    sparse_embedder: Option<Arc<dyn SparseEmbedder>>,
    reranker: Option<Arc<dyn Reranker>>,
    profile_lookup: Option<Arc<dyn ProfileLookup>>,
    write_back: RetentionWriteBack,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        router: Arc<Router>,
        embedder: Arc<dyn Embedder>,
        sparse_embedder: Option<Arc<dyn SparseEmbedder>>,
        reranker: Option<Arc<dyn Reranker>>,
        profile_lookup: Option<Arc<dyn ProfileLookup>>,
        write_back: RetentionWriteBack,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            router,
            embedder,
            sparse_embedder,
            reranker,
            profile_lookup,
            write_back,
            config,
        }
    }

    pub async fn search(&self, request: RetrievalRequest) -> PowerMemResult<RetrievalResponse> {
        let filter = scoped_filter(&request.scope_keys, request.filters.clone());

        let dense_vector = Some(
            self.embedder
                .embed(&request.query, powermem_core::traits::EmbedAction::Search)
                .await?,
        );
        let sparse_vector = match &self.sparse_embedder {
            Some(embedder) => Some(embedder.embed_sparse(&request.query).await?),
            None => None,
        };

        let targets: Vec<Arc<dyn VectorStore>> = match self.router.route_for_read(filter.as_ref()) {
            ReadTarget::Single(store) => vec![store],
            ReadTarget::Fanout(stores) => stores,
        };
        let target_names = self.router.read_target_names(filter.as_ref());

        let per_store_limit = (2 * request.limit).max(10);
        let mut tasks = tokio::task::JoinSet::new();
        for (index, store) in targets.iter().cloned().enumerate() {
            let query = SearchQuery {
                dense_vector: dense_vector.clone(),
                text: Some(request.query.clone()),
                sparse_vector: sparse_vector.clone(),
                limit: per_store_limit,
                filter: filter.clone(),
            };
            tasks.spawn(async move { (index, store.search(query).await) });
        }

        // Results can complete out of order; keep each store's list at its
        // original index so `fusion_info.store_index` maps back to `targets`.
        let mut lists: Vec<Vec<powermem_core::traits::Hit>> = vec![Vec::new(); targets.len()];
        let mut warnings = Vec::new();
        let mut failed = 0usize;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok((index, Ok(hits))) => lists[index] = hits,
                Ok((_, Err(err))) => {
                    warn!(error = %err, "store search failed, degrading gracefully");
                    warnings.push(err.to_string());
                    failed += 1;
                }
                Err(err) => {
                    warn!(error = %err, "search task panicked");
                    warnings.push(err.to_string());
                    failed += 1;
                }
            }
        }

        if !targets.is_empty() && failed == targets.len() {
            return Err(PowerMemError::Retrieval(RetrievalError::AllStoresUnavailable(failed)));
        }

        let weights = vec![1.0; lists.len()];
        let mut fused = fusion::fuse_cross_store(&lists, &weights, self.config.rrf_k);

        if let Some(threshold) = request.threshold {
            fused.retain(|hit| hit.score >= threshold);
        }

        if let Some(reranker) = &self.reranker {
            if fused.len() > request.limit {
                let fanout = (self.config.rerank_fanout_multiple * request.limit).min(fused.len());
                let docs: Vec<String> = fused[..fanout]
                    .iter()
                    .map(|h| {
                        h.payload
                            .get("fulltext_content")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string()
                    })
                    .collect();
                if let Ok(reranked) = reranker.rerank(&request.query, &docs, Some(request.limit)).await {
                    let mut reordered = Vec::with_capacity(reranked.len());
                    for hit in reranked {
                        if let Some(found) = fused.get(hit.doc_index) {
                            let mut found = found.clone();
                            found.score = hit.score;
                            reordered.push(found);
                        }
                    }
                    fused = reordered;
                }
            }
        }

        fused.truncate(request.limit);

        let ctx = DecayContext::at(Utc::now());
        let mut hits = Vec::with_capacity(fused.len());
        for mut hit in fused {
            if let Some(mut block) = hit
                .payload
                .get("metadata")
                .and_then(|m| m.get("retention"))
                .and_then(|v| serde_json::from_value(v.clone()).ok())
            {
                reinforce(&mut block, ctx.now);
                if let Some(store_index) = hit.fusion_info.contributions.first().map(|c| c.store_index) {
                    if let Some(store) = targets.get(store_index) {
                        self.write_back.enqueue(store.clone(), hit.id, block);
                    }
                }
            }

            if let Some(store_index) = hit.fusion_info.contributions.first().map(|c| c.store_index) {
                if let Some(name) = target_names.get(store_index) {
                    hit.payload.insert("_source_store".to_string(), Value::String(name.clone()));
                }
            }

            hits.push(RetrievalHit {
                id: hit.id,
                payload: hit.payload,
                score: hit.score,
                fusion_info: hit.fusion_info,
            });
        }

        let profile = if request.add_profile {
            match (&self.profile_lookup, request.scope_keys.user_id.as_deref()) {
                (Some(lookup), Some(user_id)) => lookup.profile_blob(user_id).await.unwrap_or(None),
                _ => None,
            }
        } else {
            None
        };

        Ok(RetrievalResponse { hits, profile, warnings })
    }
}
