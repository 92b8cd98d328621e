use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use powermem_core::config::{DistanceMetric, RetrievalConfig};
use powermem_core::errors::{PowerMemError, PowerMemResult, StorageError};
use powermem_core::filter::FilterExpr;
use powermem_core::memory::{MemoryId, ScopeKeys};
use powermem_core::traits::{
    ColInfo, Embedder, Hit, InsertItem, Record, SearchQuery, UpdatePatch, VectorStore,
};
use powermem_providers::DeterministicEmbedder;
use powermem_retrieval::{RetrievalEngine, RetrievalRequest, RetentionWriteBack};
use powermem_router::{Router, SubStore};
use powermem_storage::InMemoryStore;

/// A store that always errors, for exercising degraded-retrieval fan-out.
struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn create_col(&self, _name: &str, _dims: usize, _distance: DistanceMetric) -> PowerMemResult<()> {
        Ok(())
    }

    async fn insert(&self, _items: Vec<InsertItem>) -> PowerMemResult<Vec<MemoryId>> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn search(&self, _query: SearchQuery) -> PowerMemResult<Vec<Hit>> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn get(&self, _id: MemoryId) -> PowerMemResult<Option<Record>> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn update(&self, _id: MemoryId, _patch: UpdatePatch) -> PowerMemResult<bool> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn delete(&self, _id: MemoryId) -> PowerMemResult<bool> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn list(&self, _filter: Option<FilterExpr>, _limit: usize, _offset: usize) -> PowerMemResult<Vec<Record>> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn count(&self, _filter: Option<FilterExpr>) -> PowerMemResult<usize> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn delete_col(&self) -> PowerMemResult<()> {
        Ok(())
    }

    async fn col_info(&self) -> PowerMemResult<ColInfo> {
        Err(StorageError::Unavailable("failing store".to_string()).into())
    }

    async fn reset(&self) -> PowerMemResult<()> {
        Ok(())
    }
}

fn make_engine(router: Arc<Router>) -> RetrievalEngine {
    let embedder: Arc<dyn Embedder> = Arc::new(DeterministicEmbedder::new(16));
    let (write_back, _handle) = RetentionWriteBack::spawn(32);
    RetrievalEngine::new(router, embedder, None, None, None, write_back, RetrievalConfig::default())
}

async fn seed(store: &InMemoryStore, embedder: &dyn Embedder, content: &str) {
    let dense = embedder
        .embed(content, powermem_core::traits::EmbedAction::Add)
        .await
        .unwrap();
    store
        .insert(vec![InsertItem {
            id: None,
            dense_embedding: dense,
            sparse_embedding: None,
            payload: json!({
                "content": content,
                "fulltext_content": content,
                "scope_keys": {"user_id": "u1"},
            })
            .as_object()
            .cloned()
            .unwrap(),
        }])
        .await
        .unwrap();
}

#[tokio::test]
async fn search_returns_hits_from_single_store() {
    let embedder = DeterministicEmbedder::new(16);
    let store = InMemoryStore::new();
    seed(&store, &embedder, "the cat sat on the mat").await;
    seed(&store, &embedder, "quarterly revenue report").await;

    let router = Arc::new(Router::new(Arc::new(store), Vec::new()));
    let engine = make_engine(router);

    let response = engine
        .search(RetrievalRequest {
            query: "cat sat mat".to_string(),
            scope_keys: ScopeKeys::default(),
            filters: None,
            limit: 5,
            threshold: None,
            add_profile: false,
        })
        .await
        .unwrap();

    assert_eq!(response.hits.len(), 2);
    assert!(response.profile.is_none());
}

#[tokio::test]
async fn threshold_filters_out_low_scoring_hits() {
    let embedder = DeterministicEmbedder::new(16);
    let store = InMemoryStore::new();
    seed(&store, &embedder, "alpha").await;

    let router = Arc::new(Router::new(Arc::new(store), Vec::new()));
    let engine = make_engine(router);

    let response = engine
        .search(RetrievalRequest {
            query: "alpha".to_string(),
            scope_keys: ScopeKeys::default(),
            filters: None,
            limit: 5,
            threshold: Some(10.0),
            add_profile: false,
        })
        .await
        .unwrap();

    assert!(response.hits.is_empty());
}

#[tokio::test]
async fn explicit_filter_is_anded_with_scope_and_narrows_results() {
    let embedder = DeterministicEmbedder::new(16);
    let store = InMemoryStore::new();
    seed(&store, &embedder, "alpha record").await;
    seed(&store, &embedder, "beta record").await;

    let router = Arc::new(Router::new(Arc::new(store), Vec::new()));
    let engine = make_engine(router);

    let response = engine
        .search(RetrievalRequest {
            query: "record".to_string(),
            scope_keys: ScopeKeys::default(),
            filters: Some(FilterExpr::Eq("content".to_string(), json!("alpha record"))),
            limit: 5,
            threshold: None,
            add_profile: false,
        })
        .await
        .unwrap();

    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].payload.get("content").unwrap(), "alpha record");
}

#[tokio::test]
async fn fused_hits_carry_fusion_info_pointing_at_contributing_store() {
    let embedder = DeterministicEmbedder::new(16);
    let store = InMemoryStore::new();
    seed(&store, &embedder, "only memory in the main store").await;

    let router = Arc::new(Router::new(Arc::new(store), Vec::new()));
    let engine = make_engine(router);

    let response = engine
        .search(RetrievalRequest {
            query: "only memory".to_string(),
            scope_keys: ScopeKeys::default(),
            filters: None,
            limit: 5,
            threshold: None,
            add_profile: false,
        })
        .await
        .unwrap();

    assert_eq!(response.hits.len(), 1);
    let contributions = &response.hits[0].fusion_info.contributions;
    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0].store_index, 0);
    assert_eq!(response.hits[0].fusion_info.method, "rrf");
}

#[tokio::test]
async fn one_failing_fanout_store_degrades_instead_of_failing_the_call() {
    use powermem_core::config::SubStoreConfig;
    use powermem_router::SubStoreStatus;

    let embedder = DeterministicEmbedder::new(16);
    let main = InMemoryStore::new();
    seed(&main, &embedder, "healthy store record").await;

    let failing_sub = SubStore::new(SubStoreConfig::default(), Arc::new(FailingStore), None);
    failing_sub.state.set(SubStoreStatus::Active);

    let router = Arc::new(Router::new(Arc::new(main), vec![failing_sub]));
    let engine = make_engine(router);

    let response = engine
        .search(RetrievalRequest {
            query: "healthy store record".to_string(),
            scope_keys: ScopeKeys::default(),
            filters: None,
            limit: 5,
            threshold: None,
            add_profile: false,
        })
        .await
        .unwrap();

    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.warnings.len(), 1);
}

#[tokio::test]
async fn all_fanout_stores_failing_is_a_typed_error() {
    let router = Arc::new(Router::new(Arc::new(FailingStore), Vec::new()));
    let engine = make_engine(router);

    let err = engine
        .search(RetrievalRequest {
            query: "anything".to_string(),
            scope_keys: ScopeKeys::default(),
            filters: None,
            limit: 5,
            threshold: None,
            add_profile: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PowerMemError::Retrieval(powermem_core::errors::RetrievalError::AllStoresUnavailable(1))
    ));
}
