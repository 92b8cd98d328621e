//! Messages → facts → similarity search → ADD/UPDATE/DELETE/NONE plan →
//! apply (§4.7, "the hardest part"). Pass-through mode (`infer=false`)
//! skips extraction and reconciliation entirely; intelligent mode runs the
//! full pipeline below.

pub mod messages;
mod prompts;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::warn;

use powermem_core::config::{IngestConfig, RetentionConfig};
use powermem_core::errors::{IngestError, PowerMemError, PowerMemResult, ProviderError};
use powermem_core::memory::{content_hash, MemoryId, MemoryRecord, RetentionBlock, ScopeKeys, SnowflakeGenerator};
use powermem_core::traits::{
    ChatMessage, ChatOptions, EmbedAction, Embedder, InsertItem, Llm, ResponseFormat, SparseEmbedder,
    UpdatePatch, VectorStore,
};
use powermem_router::Router;
use powermem_validation::{validate_decision, validate_extraction, Decision, ExtractedFact, DEFAULT_IMPORTANCE};

pub use messages::MessageInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Add,
    Update,
    Delete,
    None,
}

#[derive(Debug, Clone)]
pub struct IngestEvent {
    pub id: MemoryId,
    pub content: String,
    pub event: EventKind,
    pub previous_memory: Option<String>,
    pub metadata: Map<String, Value>,
}

/// A fact that couldn't be carried through the pipeline — distinct from the
/// four terminal `EventKind`s since it never reached a decision (§4.7
/// failure semantics: "skip that fact... proceed with the rest").
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub fact_content: String,
    pub reason: String,
}

pub struct IngestRequest {
    pub messages: MessageInput,
    pub scope_keys: ScopeKeys,
    /// Caller-supplied metadata: drives sub-store routing (§4.6 step 1) and
    /// is merged onto every record this call creates.
    pub metadata: Map<String, Value>,
    pub infer: bool,
    pub prompt_override: Option<String>,
}

pub struct IngestResponse {
    pub events: Vec<IngestEvent>,
    pub failures: Vec<IngestFailure>,
}

pub struct IngestEngine {
    router: Arc<Router>,
    embedder: Arc<dyn Embedder>,
    sparse_embedder: Option<Arc<dyn SparseEmbedder>>,
    llm: Arc<dyn Llm>,
    id_gen: Arc<SnowflakeGenerator>,
    retention_config: RetentionConfig,
    config: IngestConfig,
}

impl IngestEngine {
    pub fn new(
        router: Arc<Router>,
        embedder: Arc<dyn Embedder>,
        sparse_embedder: Option<Arc<dyn SparseEmbedder>>,
        llm: Arc<dyn Llm>,
        id_gen: Arc<SnowflakeGenerator>,
        retention_config: RetentionConfig,
        config: IngestConfig,
    ) -> Self {
        Self {
            router,
            embedder,
            sparse_embedder,
            llm,
            id_gen,
            retention_config,
            config,
        }
    }

    pub async fn add(&self, request: IngestRequest) -> PowerMemResult<IngestResponse> {
        let chat_messages = request.messages.clone().normalize();
        let plain_content = messages::render_plain_content(&chat_messages);
        if plain_content.trim().is_empty() {
            return Err(PowerMemError::Ingest(IngestError::EmptyContent));
        }

        let target = self.router.route_for_write(&request.metadata);
        let infer = self.config.intelligent_mode && request.infer;

        if infer {
            let combined_text = messages::render_messages(&chat_messages);
            self.add_intelligent(&request, &combined_text, target).await
        } else {
            self.add_pass_through(&request, plain_content, target).await
        }
    }

    async fn add_pass_through(
        &self,
        request: &IngestRequest,
        content: String,
        target: Arc<dyn VectorStore>,
    ) -> PowerMemResult<IngestResponse> {
        let now = Utc::now();
        let hash = content_hash(&content);

        if let Some(existing) = self.find_by_hash(&target, &request.scope_keys, &hash).await? {
            return Ok(IngestResponse {
                events: vec![IngestEvent {
                    id: existing.id,
                    content,
                    event: EventKind::None,
                    previous_memory: None,
                    metadata: request.metadata.clone(),
                }],
                failures: Vec::new(),
            });
        }

        let dense = match self.embedder.embed(&content, EmbedAction::Add).await {
            Ok(v) => v,
            Err(err) => {
                return Ok(IngestResponse {
                    events: Vec::new(),
                    failures: vec![IngestFailure {
                        fact_content: content,
                        reason: err.to_string(),
                    }],
                })
            }
        };

        let id = self.id_gen.next_id(now.timestamp_millis());
        let mut record = MemoryRecord::new(id, content.clone(), dense, request.scope_keys.clone(), now);
        record.metadata.extend(request.metadata.clone());
        let block = RetentionBlock::new_for_add(
            DEFAULT_IMPORTANCE,
            self.retention_config.decay_rate,
            self.retention_config.reinforcement_factor,
            now,
        );
        record.set_retention_block(&block);

        let insert_result = target
            .insert(vec![InsertItem {
                id: Some(id),
                dense_embedding: record.dense_embedding.clone(),
                sparse_embedding: None,
                payload: record.to_payload(),
            }])
            .await;

        match insert_result {
            Ok(_) => Ok(IngestResponse {
                events: vec![IngestEvent {
                    id,
                    content,
                    event: EventKind::Add,
                    previous_memory: None,
                    metadata: request.metadata.clone(),
                }],
                failures: Vec::new(),
            }),
            Err(err) => Err(PowerMemError::Ingest(IngestError::StoreWriteFailed(err.to_string()))),
        }
    }

    async fn add_intelligent(
        &self,
        request: &IngestRequest,
        combined_text: &str,
        target: Arc<dyn VectorStore>,
    ) -> PowerMemResult<IngestResponse> {
        let extraction_prompt = request
            .prompt_override
            .as_deref()
            .or(self.config.custom_fact_extraction_prompt.as_deref())
            .unwrap_or(prompts::DEFAULT_FACT_EXTRACTION_PROMPT);

        let approx_tokens = powermem_tokens::TokenCounter::count_approximate(combined_text);
        if approx_tokens > self.config.max_extraction_tokens {
            return Err(PowerMemError::Provider(ProviderError::TokenBudgetExceeded {
                needed: approx_tokens,
                available: self.config.max_extraction_tokens,
            }));
        }

        let extraction_response = self
            .llm
            .chat(
                &[ChatMessage::system(extraction_prompt), ChatMessage::user(combined_text)],
                &ChatOptions {
                    response_format: ResponseFormat::Json,
                    temperature: Some(0.0),
                },
            )
            .await
            .map_err(|err| PowerMemError::Ingest(IngestError::LlmUnavailable(err.to_string())))?;

        let facts = validate_extraction(&extraction_response.text, self.config.max_facts_per_extraction)?;

        let mut events = Vec::new();
        let mut failures = Vec::new();

        // DELETE supersedes UPDATE supersedes ADD on the same existing id
        // (§4.7 ordering guarantees); grouping apply by kind across the
        // whole batch gives that for free.
        let mut deletes: Vec<(MemoryId, String)> = Vec::new();
        let mut updates: Vec<(MemoryId, String, String)> = Vec::new();
        let mut adds: Vec<(String, f64)> = Vec::new();
        let mut nones: Vec<(MemoryId, String)> = Vec::new();

        for fact in facts {
            match self.plan_fact(request, &target, fact).await {
                FactPlan::Delete { existing_id, previous } => deletes.push((existing_id, previous)),
                FactPlan::Update {
                    existing_id,
                    previous,
                    new_text,
                } => updates.push((existing_id, previous, new_text)),
                FactPlan::Add { content, importance_score } => adds.push((content, importance_score)),
                FactPlan::None { existing_id, content } => nones.push((existing_id, content)),
                FactPlan::Failed { fact_content, reason } => failures.push(IngestFailure { fact_content, reason }),
            }
        }

        let now = Utc::now();

        for (id, previous) in deletes {
            match target.delete(id).await {
                Ok(_) => events.push(IngestEvent {
                    id,
                    content: previous.clone(),
                    event: EventKind::Delete,
                    previous_memory: Some(previous),
                    metadata: request.metadata.clone(),
                }),
                Err(err) => {
                    warn!(error = %err, id = id.0, "delete failed during ingest apply, continuing batch");
                    failures.push(IngestFailure {
                        fact_content: previous,
                        reason: err.to_string(),
                    });
                }
            }
        }

        for (id, previous, new_text) in updates {
            match self.apply_update(&target, id, new_text.clone(), now).await {
                Ok(()) => events.push(IngestEvent {
                    id,
                    content: new_text,
                    event: EventKind::Update,
                    previous_memory: Some(previous),
                    metadata: request.metadata.clone(),
                }),
                Err(err) => {
                    warn!(error = %err, id = id.0, "update failed during ingest apply, continuing batch");
                    failures.push(IngestFailure {
                        fact_content: new_text,
                        reason: err.to_string(),
                    });
                }
            }
        }

        for (id, content) in nones {
            events.push(IngestEvent {
                id,
                content,
                event: EventKind::None,
                previous_memory: None,
                metadata: request.metadata.clone(),
            });
        }

        if !adds.is_empty() {
            let mut items = Vec::with_capacity(adds.len());
            let mut records = Vec::with_capacity(adds.len());
            for (content, importance_score) in adds {
                let dense = match self.embedder.embed(&content, EmbedAction::Add).await {
                    Ok(v) => v,
                    Err(err) => {
                        failures.push(IngestFailure {
                            fact_content: content,
                            reason: err.to_string(),
                        });
                        continue;
                    }
                };
                let id = self.id_gen.next_id(now.timestamp_millis());
                let mut record = MemoryRecord::new(id, content, dense, request.scope_keys.clone(), now);
                record.metadata.extend(request.metadata.clone());
                let block = RetentionBlock::new_for_add(
                    importance_score,
                    self.retention_config.decay_rate,
                    self.retention_config.reinforcement_factor,
                    now,
                );
                record.set_retention_block(&block);
                items.push(InsertItem {
                    id: Some(id),
                    dense_embedding: record.dense_embedding.clone(),
                    sparse_embedding: None,
                    payload: record.to_payload(),
                });
                records.push(record);
            }

            if !items.is_empty() {
                match target.insert(items).await {
                    Ok(_) => {
                        for record in records {
                            events.push(IngestEvent {
                                id: record.id,
                                content: record.content,
                                event: EventKind::Add,
                                previous_memory: None,
                                metadata: request.metadata.clone(),
                            });
                        }
                    }
                    Err(err) => {
                        warn!(
                            error = %err,
                            prior_applies = events.len(),
                            "add batch failed after earlier deletes/updates were already applied"
                        );
                        return Err(PowerMemError::Ingest(IngestError::StoreWriteFailed(err.to_string())));
                    }
                }
            }
        }

        Ok(IngestResponse { events, failures })
    }

    async fn plan_fact(
        &self,
        request: &IngestRequest,
        target: &Arc<dyn VectorStore>,
        fact: ExtractedFact,
    ) -> FactPlan {
        let hash = content_hash(&fact.content);
        let scope_filter = request.scope_keys.as_filter();

        let dense = match self.embedder.embed(&fact.content, EmbedAction::Add).await {
            Ok(v) => v,
            Err(err) => {
                return FactPlan::Failed {
                    fact_content: fact.content,
                    reason: err.to_string(),
                }
            }
        };
        let sparse = match &self.sparse_embedder {
            Some(embedder) => embedder.embed_sparse(&fact.content).await.ok(),
            None => None,
        };

        let hits = match target
            .search(powermem_core::traits::SearchQuery {
                dense_vector: Some(dense.clone()),
                text: Some(fact.content.clone()),
                sparse_vector: sparse,
                limit: self.config.similarity_probe_top_k,
                filter: scope_filter.clone(),
            })
            .await
        {
            Ok(hits) => hits,
            Err(err) => {
                return FactPlan::Failed {
                    fact_content: fact.content,
                    reason: err.to_string(),
                }
            }
        };

        // Exact-hash dedup short-circuit (§4.7 step 5), checked before
        // spending an LLM call on the decision.
        if let Some(dup) = hits.iter().find(|h| hash_of(h) == Some(hash.as_str())) {
            return FactPlan::None {
                existing_id: dup.id,
                content: fact.content,
            };
        }

        if hits.is_empty() {
            return FactPlan::Add {
                content: fact.content,
                importance_score: fact.importance_score,
            };
        }

        let decision_prompt = self
            .config
            .custom_update_memory_prompt
            .as_deref()
            .unwrap_or(prompts::DEFAULT_DECISION_PROMPT);
        let candidates = hits
            .iter()
            .map(|h| format!("- id={} content={}", h.id, content_of(h).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n");
        let user_turn = format!("new fact: {}\nexisting memories:\n{candidates}", fact.content);

        let decision = match self
            .llm
            .chat(
                &[ChatMessage::system(decision_prompt), ChatMessage::user(user_turn)],
                &ChatOptions {
                    response_format: ResponseFormat::Json,
                    temperature: Some(0.0),
                },
            )
            .await
        {
            Ok(response) => validate_decision(&response.text),
            Err(err) => {
                warn!(error = %err, "LLM unavailable for decision, defaulting to ADD");
                Decision::Add
            }
        };

        match decision {
            Decision::Add => FactPlan::Add {
                content: fact.content,
                importance_score: fact.importance_score,
            },
            Decision::None => FactPlan::None {
                existing_id: hits[0].id,
                content: fact.content,
            },
            Decision::Delete { existing_id } => FactPlan::Delete {
                existing_id,
                previous: hits
                    .iter()
                    .find(|h| h.id == existing_id)
                    .and_then(content_of)
                    .unwrap_or_default(),
            },
            Decision::Update { existing_id, new_text } => FactPlan::Update {
                existing_id,
                previous: hits
                    .iter()
                    .find(|h| h.id == existing_id)
                    .and_then(content_of)
                    .unwrap_or_default(),
                new_text,
            },
        }
    }

    async fn apply_update(
        &self,
        target: &Arc<dyn VectorStore>,
        id: MemoryId,
        new_text: String,
        now: chrono::DateTime<Utc>,
    ) -> PowerMemResult<()> {
        let Some(existing) = target.get(id).await? else {
            return Err(PowerMemError::NotFound { id: id.to_string() });
        };
        let Some(mut record) = MemoryRecord::from_row(id, existing.dense_embedding, &existing.payload) else {
            return Err(PowerMemError::Ingest(IngestError::StoreWriteFailed(format!(
                "record {id} has an unrecognized payload shape"
            ))));
        };
        let new_embedding = self
            .embedder
            .embed(&new_text, EmbedAction::Update)
            .await
            .map_err(|err| PowerMemError::Ingest(IngestError::FactEmbeddingFailed(err.to_string())))?;
        record.update_content(new_text, new_embedding, now);
        target
            .update(
                id,
                UpdatePatch {
                    dense_embedding: Some(record.dense_embedding.clone()),
                    sparse_embedding: None,
                    payload: Some(record.to_payload()),
                },
            )
            .await?;
        Ok(())
    }

    async fn find_by_hash(
        &self,
        target: &Arc<dyn VectorStore>,
        scope_keys: &ScopeKeys,
        hash: &str,
    ) -> PowerMemResult<Option<powermem_core::traits::Record>> {
        use powermem_core::filter::FilterExpr;
        let hash_clause = FilterExpr::Eq("metadata.hash".to_string(), Value::String(hash.to_string()));
        let filter = match scope_keys.as_filter() {
            Some(scope) => FilterExpr::And(vec![scope, hash_clause]),
            None => hash_clause,
        };
        let mut rows = target.list(Some(filter), 1, 0).await?;
        Ok(rows.pop())
    }
}

enum FactPlan {
    Add {
        content: String,
        importance_score: f64,
    },
    Update {
        existing_id: MemoryId,
        previous: String,
        new_text: String,
    },
    Delete {
        existing_id: MemoryId,
        previous: String,
    },
    None {
        existing_id: MemoryId,
        content: String,
    },
    Failed {
        fact_content: String,
        reason: String,
    },
}

fn hash_of(hit: &powermem_core::traits::Hit) -> Option<&str> {
    hit.payload.get("metadata")?.get("hash")?.as_str()
}

fn content_of(hit: &powermem_core::traits::Hit) -> Option<String> {
    hit.payload.get("content")?.as_str().map(str::to_string)
}
