//! Profile Store (C10, §4.10): a per-user blob of either free-form
//! `profile_content` or a nested `topics` mapping, refreshed by an
//! LLM-driven extraction call on `add()` and attached read-only to
//! `search()` results via `ProfileLookup`.

mod prompts;
mod store;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use powermem_core::config::ProfileConfig;
use powermem_core::errors::PowerMemResult;
use powermem_core::profile::ProfileBlob;
use powermem_core::traits::{ChatMessage, ChatOptions, Llm, ProfileLookup, ResponseFormat};
use powermem_validation::validate_profile_extraction;

pub use store::ProfileStore;

pub struct ProfileEngine {
    store: ProfileStore,
    llm: Arc<dyn Llm>,
    config: ProfileConfig,
}

impl ProfileEngine {
    pub fn new(store: ProfileStore, llm: Arc<dyn Llm>, config: ProfileConfig) -> Self {
        Self { store, llm, config }
    }

    pub async fn get(&self, user_id: &str) -> PowerMemResult<Option<ProfileBlob>> {
        if !self.config.enabled {
            return Ok(None);
        }
        Ok(self.store.get(user_id).await?.map(|record| record.blob))
    }

    /// Extracts an updated profile from `conversation` (current blob + the
    /// new conversation text) and atomically replaces the stored blob
    /// (§4.10). Best-effort: an unavailable LLM or a malformed response
    /// leaves the existing profile untouched rather than failing the
    /// caller's `add()` over it — profile maintenance is a side-effect of
    /// ingest, never its critical path.
    pub async fn add(&self, user_id: &str, conversation: &str) -> PowerMemResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let current = self.get(user_id).await?.unwrap_or_default();
        let prompt = self
            .config
            .custom_profile_extraction_prompt
            .as_deref()
            .unwrap_or(prompts::DEFAULT_PROFILE_EXTRACTION_PROMPT);
        let user_turn = format!("current profile: {}\nnew conversation:\n{conversation}", current.to_value());

        let response = match self
            .llm
            .chat(
                &[ChatMessage::system(prompt), ChatMessage::user(user_turn)],
                &ChatOptions {
                    response_format: ResponseFormat::Json,
                    temperature: Some(0.0),
                },
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, user_id, "LLM unavailable for profile extraction, leaving profile unchanged");
                return Ok(());
            }
        };

        let Some(blob) = validate_profile_extraction(&response.text) else {
            return Ok(());
        };

        self.store.upsert(user_id, blob, Utc::now()).await
    }
}

#[async_trait]
impl ProfileLookup for ProfileEngine {
    async fn profile_blob(&self, user_id: &str) -> PowerMemResult<Option<Value>> {
        Ok(self.get(user_id).await?.map(|blob| blob.to_value()))
    }
}
