//! Vector Store Interface (C3, §4.3): CRUD + hybrid search, implemented by
//! `powermem-storage`'s SQLite and in-memory backends.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::DistanceMetric;
use crate::errors::PowerMemResult;
use crate::filter::FilterExpr;
use crate::memory::MemoryId;
use crate::traits::llm::SparseVector;

/// One row as stored, independent of the `MemoryRecord` wire shape above it —
/// this is what a backend persists and returns from `get`/`list`.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: MemoryId,
    pub dense_embedding: Vec<f32>,
    pub sparse_embedding: Option<SparseVector>,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct InsertItem {
    pub id: Option<MemoryId>,
    pub dense_embedding: Vec<f32>,
    pub sparse_embedding: Option<SparseVector>,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePatch {
    pub dense_embedding: Option<Vec<f32>>,
    pub sparse_embedding: Option<SparseVector>,
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub dense_vector: Option<Vec<f32>>,
    pub text: Option<String>,
    pub sparse_vector: Option<SparseVector>,
    pub limit: usize,
    pub filter: Option<FilterExpr>,
}

/// Per-channel rank recorded alongside a hit so the caller can build the
/// `_fusion_info` annotation (§4.5 step 8) without re-deriving ranks.
#[derive(Debug, Clone, Default)]
pub struct DebugRanks {
    pub dense_rank: Option<usize>,
    pub fulltext_rank: Option<usize>,
    pub sparse_rank: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Hit {
    pub id: MemoryId,
    pub payload: Map<String, Value>,
    pub score: f64,
    pub debug_ranks: DebugRanks,
}

#[derive(Debug, Clone)]
pub struct ColInfo {
    pub name: String,
    pub dims: usize,
    pub distance: DistanceMetric,
    pub count: usize,
    pub include_sparse: bool,
}

/// Required operations (§4.3). Every method is `dyn`-dispatched: the router
/// holds one `Arc<dyn VectorStore>` per physical collection (main store plus
/// zero or more sub-stores) in a single heterogeneous table.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn create_col(&self, name: &str, dims: usize, distance: DistanceMetric) -> PowerMemResult<()>;

    /// Atomic per call: either every item is inserted and every id returned,
    /// or none are.
    async fn insert(&self, items: Vec<InsertItem>) -> PowerMemResult<Vec<MemoryId>>;

    /// Hybrid search per the fusion contract in §4.3: dense + optional
    /// full-text + optional sparse channels, RRF-fused, `filter` applied as
    /// a post-filter with stable order preserved.
    async fn search(&self, query: SearchQuery) -> PowerMemResult<Vec<Hit>>;

    async fn get(&self, id: MemoryId) -> PowerMemResult<Option<Record>>;

    async fn update(&self, id: MemoryId, patch: UpdatePatch) -> PowerMemResult<bool>;

    async fn delete(&self, id: MemoryId) -> PowerMemResult<bool>;

    async fn list(
        &self,
        filter: Option<FilterExpr>,
        limit: usize,
        offset: usize,
    ) -> PowerMemResult<Vec<Record>>;

    async fn count(&self, filter: Option<FilterExpr>) -> PowerMemResult<usize>;

    async fn delete_col(&self) -> PowerMemResult<()>;

    async fn col_info(&self) -> PowerMemResult<ColInfo>;

    async fn reset(&self) -> PowerMemResult<()>;
}
