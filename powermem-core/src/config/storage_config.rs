//! `vector_store.*` (§6.5).

use serde::{Deserialize, Serialize};

/// Distance metric a collection is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    Cosine,
    DotProduct,
    Euclidean,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::Cosine
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub provider: String,
    pub collection_name: String,
    pub dims: usize,
    pub include_sparse: bool,
    pub index_type: String,
    pub distance: DistanceMetric,
    /// Reciprocal-rank-fusion weight for the dense-vector channel.
    pub vector_weight: f64,
    /// RRF weight for the full-text channel.
    pub fts_weight: f64,
    /// RRF weight for the sparse-vector channel.
    pub sparse_weight: f64,
    /// Backend-specific connection arguments (DSN, file path, pool size, ...).
    pub connection_args: std::collections::BTreeMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            collection_name: "memories".to_string(),
            dims: 256,
            include_sparse: false,
            index_type: "flat".to_string(),
            distance: DistanceMetric::Cosine,
            vector_weight: 1.0,
            fts_weight: 1.0,
            sparse_weight: 1.0,
            connection_args: std::collections::BTreeMap::new(),
        }
    }
}
