//! LLM / Embedder / SparseEmbedder / Reranker contracts (§4.2).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::PowerMemResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// `response_format` hint: ask the provider to return raw text or to
/// constrain output to a named JSON schema (fact extraction / decision
/// calls always request `Json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatOptions {
    pub response_format: ResponseFormat,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
}

/// `LLM.chat(messages, tools?, tool_choice?, response_format?) → text |
/// structured` (§4.2). Tool calling is out of scope for this core (no
/// ingest/retrieval path invokes it); `options` covers the response-shaping
/// knobs the pipeline actually needs.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> PowerMemResult<ChatResponse>;

    /// Registry key this provider is addressed by in config (§4.2 "factory
    /// keyed on a short name").
    fn name(&self) -> &'static str;
}

/// Distinguishes why an embedding is being produced; some providers use
/// different model heads or instructions per action (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedAction {
    Add,
    Search,
    Update,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, action: EmbedAction) -> PowerMemResult<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String], action: EmbedAction) -> PowerMemResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, action).await?);
        }
        Ok(out)
    }

    fn dims(&self) -> usize;

    fn name(&self) -> &'static str;
}

pub type SparseVector = BTreeMap<i32, f32>;

#[async_trait]
pub trait SparseEmbedder: Send + Sync {
    async fn embed_sparse(&self, text: &str) -> PowerMemResult<SparseVector>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedHit {
    pub doc_index: usize,
    pub score: f64,
}

/// `Reranker.rerank(query, docs[], top_n?) → [(doc_index, score)]` sorted
/// descending by score (§4.2).
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        docs: &[String],
        top_n: Option<usize>,
    ) -> PowerMemResult<Vec<RerankedHit>>;

    fn name(&self) -> &'static str;
}
