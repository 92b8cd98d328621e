//! `sub_stores: [...]` (§6.5).

use serde::{Deserialize, Serialize};

use crate::filter::FilterExpr;

/// One entry of `sub_stores: [{routing_filter, collection_name?, dims?, embedding?, vector_store?}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubStoreConfig {
    pub name: String,
    pub routing_filter: FilterExpr,
    pub collection_name: Option<String>,
    pub dims: Option<usize>,
    pub embedding: Option<String>,
    pub vector_store: Option<String>,
    /// Page size used while migrating main-store rows into this sub-store (§4.6).
    pub migration_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    pub sub_stores: Vec<SubStoreConfig>,
}

impl Default for SubStoreConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            routing_filter: FilterExpr::And(Vec::new()),
            collection_name: None,
            dims: None,
            embedding: None,
            vector_store: None,
            migration_batch_size: 256,
        }
    }
}
