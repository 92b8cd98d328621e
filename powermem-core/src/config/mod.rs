pub mod ingest_config;
pub mod observability_config;
pub mod profile_config;
pub mod provider_config;
pub mod reclassification_config;
pub mod retention_config;
pub mod retrieval_config;
pub mod router_config;
pub mod storage_config;

use serde::{Deserialize, Serialize};

pub use ingest_config::IngestConfig;
pub use observability_config::ObservabilityConfig;
pub use profile_config::ProfileConfig;
pub use provider_config::{EmbedderConfig, LlmConfig, RerankerConfig, SparseEmbedderConfig};
pub use reclassification_config::ReclassificationConfig;
pub use retention_config::RetentionConfig;
pub use retrieval_config::RetrievalConfig;
pub use router_config::{RouterConfig, SubStoreConfig};
pub use storage_config::{DistanceMetric, StorageConfig};

/// Top-level configuration aggregating all subsystem configs (§6.5).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PowerMemConfig {
    pub llm: LlmConfig,
    pub embedder: EmbedderConfig,
    pub sparse_embedder: Option<SparseEmbedderConfig>,
    pub reranker: RerankerConfig,
    pub storage: StorageConfig,
    pub router: RouterConfig,
    pub retention: RetentionConfig,
    pub reclassification: ReclassificationConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub observability: ObservabilityConfig,
    pub profile: ProfileConfig,
}

impl PowerMemConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
