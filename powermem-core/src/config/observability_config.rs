//! Logging/tracing setup owned by the facade (SPEC_FULL §10.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `tracing_subscriber::EnvFilter` directive string, e.g. `"powermem=debug,info"`.
    pub log_filter: String,
    pub json_logs: bool,
    /// Emit `_fusion_info` on every retrieval hit (§4.5 step 8). Disabling trims response size.
    pub annotate_fusion_info: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            json_logs: false,
            annotate_fusion_info: true,
        }
    }
}
