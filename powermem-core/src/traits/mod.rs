//! Provider Interfaces (C2, §4.2) and the Vector Store Interface (C3, §4.3).
//!
//! These are `dyn`-compatible (`async-trait`), not native `async fn in
//! trait`: the factory registries in `powermem-providers` and the router in
//! `powermem-router` hold heterogeneous, swappable implementations behind
//! `Arc<dyn Trait>`, which native async-fn traits can't do.

mod llm;
mod profile;
mod store;

pub use llm::{
    ChatMessage, ChatOptions, ChatResponse, ChatRole, EmbedAction, Embedder, Llm, Reranker,
    RerankedHit, ResponseFormat, SparseEmbedder, SparseVector,
};
pub use profile::ProfileLookup;
pub use store::{ColInfo, DebugRanks, Hit, InsertItem, Record, SearchQuery, UpdatePatch, VectorStore};
