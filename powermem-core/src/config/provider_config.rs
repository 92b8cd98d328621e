//! Provider wiring (§6.5 llm.*, embedder.*, sparse_embedder.*, reranker.*).

use serde::{Deserialize, Serialize};

/// `llm.{provider, model, temperature, api_key, base_url}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Overrides the built-in fact-extraction prompt (§6.5 custom_fact_extraction_prompt).
    pub custom_fact_extraction_prompt: Option<String>,
    /// Overrides the built-in update/decision prompt (§6.5 custom_update_memory_prompt).
    pub custom_update_memory_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "mock-chat".to_string(),
            temperature: 0.0,
            api_key: None,
            base_url: None,
            custom_fact_extraction_prompt: None,
            custom_update_memory_prompt: None,
        }
    }
}

/// `embedder.{provider, model, dims, api_key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub provider: String,
    pub model: String,
    pub dims: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "deterministic".to_string(),
            model: "deterministic-hash".to_string(),
            dims: 256,
            api_key: None,
            base_url: None,
        }
    }
}

/// `sparse_embedder.{provider, model}` — optional, enables the sparse channel.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SparseEmbedderConfig {
    pub provider: String,
    pub model: String,
}

/// `reranker.{enabled, provider, model}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "none".to_string(),
            model: String::new(),
        }
    }
}
