//! `MemoryEngine` (C9, §4.9): the async core every surface delegates to.
//! Composes the router, ingest pipeline, retrieval engine, profile store,
//! and observability surface into the single method set §4.1-§4.10
//! describe. The blocking adapter in `blocking.rs` wraps this verbatim —
//! no business logic is duplicated there.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, warn};

use powermem_core::config::PowerMemConfig;
use powermem_core::errors::{PowerMemError, PowerMemResult};
use powermem_core::memory::{MemoryId, MemoryRecord, ScopeKeys, SnowflakeGenerator};
use powermem_core::traits::{Record, UpdatePatch, VectorStore};
use powermem_ingest::messages::render_plain_content;
use powermem_ingest::{IngestEngine, IngestRequest, IngestResponse, MessageInput};
use powermem_observability::{AuditActor, AuditEntry, AuditLog, AuditOperation, HealthReport, SubsystemCheck};
use powermem_profile::{ProfileEngine, ProfileStore};
use powermem_reclassification::{ReclassificationSweep, SweepReport};
use powermem_retrieval::{RetentionWriteBack, RetrievalEngine, RetrievalRequest, RetrievalResponse};
use powermem_router::{Router, SubStore};

use crate::providers;

/// `add()` input before scope defaulting (§4.9: "if constructed with
/// `agent_id`, all operations implicitly add that filter unless the caller
/// overrides").
pub struct AddRequest {
    pub messages: MessageInput,
    pub scope_keys: ScopeKeys,
    pub metadata: serde_json::Map<String, Value>,
    pub infer: bool,
    pub prompt_override: Option<String>,
}

pub struct SearchRequest {
    pub query: String,
    pub scope_keys: ScopeKeys,
    pub filters: Option<powermem_core::filter::FilterExpr>,
    pub limit: usize,
    pub threshold: Option<f64>,
    pub add_profile: bool,
}

pub struct MemoryEngine {
    default_agent_id: Option<String>,
    router: Arc<Router>,
    embedder: Arc<dyn powermem_core::traits::Embedder>,
    ingest: IngestEngine,
    retrieval: RetrievalEngine,
    profile: Option<Arc<ProfileEngine>>,
    audit: AuditLog,
    retention_config: powermem_core::config::RetentionConfig,
    reclassification_config: powermem_core::config::ReclassificationConfig,
    _write_back_task: tokio::task::JoinHandle<()>,
}

impl MemoryEngine {
    /// Builds every provider and store named in `config`, wires them into
    /// the router, and assembles the ingest/retrieval/profile engines on
    /// top. `agent_id`, when given, becomes the default scope key §4.9
    /// describes.
    pub fn new(config: PowerMemConfig, agent_id: Option<String>) -> PowerMemResult<Self> {
        let llm = providers::build_llm(&config.llm)?;
        let embedder = providers::build_embedder(&config.embedder)?;
        let sparse_embedder = providers::build_sparse_embedder(&config.sparse_embedder);
        let reranker = providers::build_reranker(&config.reranker);

        let main_store = providers::build_vector_store(&config.storage, &config.storage.collection_name)?;

        let mut sub_stores = Vec::with_capacity(config.router.sub_stores.len());
        for sub_config in &config.router.sub_stores {
            let collection = sub_config
                .collection_name
                .clone()
                .unwrap_or_else(|| sub_config.name.clone());
            let mut store_config = config.storage.clone();
            if let Some(dims) = sub_config.dims {
                store_config.dims = dims;
            }
            let store = providers::build_vector_store(&store_config, &collection)?;
            let sub_embedder = match &sub_config.embedding {
                Some(name) if name != &config.embedder.provider => {
                    let mut embedder_config = config.embedder.clone();
                    embedder_config.provider = name.clone();
                    Some(providers::build_embedder(&embedder_config)?)
                }
                _ => None,
            };
            sub_stores.push(SubStore::new(sub_config.clone(), store, sub_embedder));
        }

        let router = Arc::new(Router::new(main_store, sub_stores));
        let id_gen = Arc::new(SnowflakeGenerator::new(0));

        let ingest = IngestEngine::new(
            router.clone(),
            embedder.clone(),
            sparse_embedder.clone(),
            llm.clone(),
            id_gen,
            config.retention.clone(),
            config.ingest.clone(),
        );

        let (write_back, write_back_task) = RetentionWriteBack::spawn(1024);

        let profile = if config.profile.enabled {
            let store = ProfileStore::open(&config.profile.database_path)?;
            Some(Arc::new(ProfileEngine::new(store, llm.clone(), config.profile.clone())))
        } else {
            None
        };
        let profile_lookup = profile
            .clone()
            .map(|p| p as Arc<dyn powermem_core::traits::ProfileLookup>);

        let retrieval = RetrievalEngine::new(
            router.clone(),
            embedder.clone(),
            sparse_embedder,
            reranker,
            profile_lookup,
            write_back,
            config.retrieval.clone(),
        );

        Ok(Self {
            default_agent_id: agent_id,
            router,
            embedder,
            ingest,
            retrieval,
            profile,
            audit: AuditLog::default(),
            retention_config: config.retention,
            reclassification_config: config.reclassification,
            _write_back_task: write_back_task,
        })
    }

    fn apply_default_scope(&self, mut scope: ScopeKeys) -> ScopeKeys {
        if scope.agent_id.is_none() {
            scope.agent_id = self.default_agent_id.clone();
        }
        scope
    }

    fn all_stores(&self) -> Vec<Arc<dyn VectorStore>> {
        let mut stores = vec![self.router.main.clone()];
        stores.extend(self.router.sub_stores.iter().map(|s| s.store.clone()));
        stores
    }

    /// §4.7: runs the ingest pipeline, then (best-effort, §4.10) refreshes
    /// the caller's profile blob from the same conversation text.
    pub async fn add(&self, request: AddRequest) -> PowerMemResult<IngestResponse> {
        let scope_keys = self.apply_default_scope(request.scope_keys);
        let normalized = request.messages.clone().normalize();
        let conversation_text = render_plain_content(&normalized);

        let response = self
            .ingest
            .add(IngestRequest {
                messages: request.messages,
                scope_keys: scope_keys.clone(),
                metadata: request.metadata,
                infer: request.infer,
                prompt_override: request.prompt_override,
            })
            .await?;

        for event in &response.events {
            self.audit.record(AuditEntry {
                memory_id: Some(event.id),
                operation: match event.event {
                    powermem_ingest::EventKind::Add => AuditOperation::Add,
                    powermem_ingest::EventKind::Update => AuditOperation::Update,
                    powermem_ingest::EventKind::Delete => AuditOperation::Delete,
                    powermem_ingest::EventKind::None => continue,
                },
                actor: scope_actor(&scope_keys),
                details: Value::Null,
                timestamp: Utc::now(),
            });
        }

        if let (Some(profile), Some(user_id)) = (&self.profile, &scope_keys.user_id) {
            if let Err(err) = profile.add(user_id, &conversation_text).await {
                warn!(error = %err, user_id, "profile extraction failed, continuing without it");
            } else {
                self.audit.record(AuditEntry {
                    memory_id: None,
                    operation: AuditOperation::ProfileUpdate,
                    actor: scope_actor(&scope_keys),
                    details: Value::Null,
                    timestamp: Utc::now(),
                });
            }
        }

        Ok(response)
    }

    /// §4.8: hybrid search with RRF fusion, optional rerank, and optional
    /// profile attachment.
    pub async fn search(&self, request: SearchRequest) -> PowerMemResult<RetrievalResponse> {
        let scope_keys = self.apply_default_scope(request.scope_keys);
        self.retrieval
            .search(RetrievalRequest {
                query: request.query,
                scope_keys,
                filters: request.filters,
                limit: request.limit,
                threshold: request.threshold,
                add_profile: request.add_profile,
            })
            .await
    }

    /// Identity-scoped point read: the first store (main, then sub-stores in
    /// order) holding `id` whose stored scope includes the caller's. `None`
    /// covers both "no such id" and "id exists, out of scope" — the latter
    /// is deliberately indistinguishable from the outside (§7 Forbidden vs
    /// NotFound is an internal distinction the HTTP layer may choose to
    /// collapse; this facade keeps it collapsed to avoid confirming a
    /// record's existence to an out-of-scope caller).
    pub async fn get(&self, id: MemoryId, caller_scope: ScopeKeys) -> PowerMemResult<Option<MemoryRecord>> {
        let caller_scope = self.apply_default_scope(caller_scope);
        for store in self.all_stores() {
            if let Some(record) = store.get(id).await? {
                let Some(memory) = record_to_memory(record) else { continue };
                if caller_scope.is_subset_of(&memory.scope_keys) {
                    return Ok(Some(memory));
                }
                return Ok(None);
            }
        }
        Ok(None)
    }

    /// Direct content rewrite outside the ingest pipeline (HTTP `PUT
    /// /memories/{id}`, §6.1) — bumps `updated_at`, re-embeds, preserves
    /// `id` (§3.7 Mutate lifecycle).
    pub async fn update(&self, id: MemoryId, content: String, caller_scope: ScopeKeys) -> PowerMemResult<()> {
        let caller_scope = self.apply_default_scope(caller_scope);
        let embedder = &self.embedder;
        for store in self.all_stores() {
            let Some(record) = store.get(id).await? else { continue };
            let Some(mut memory) = record_to_memory(record) else { continue };
            if !caller_scope.is_subset_of(&memory.scope_keys) {
                return Err(PowerMemError::Unauthorized);
            }
            let dense_embedding = embedder.embed(&content, powermem_core::traits::EmbedAction::Add).await?;
            memory.update_content(content, dense_embedding.clone(), Utc::now());
            store
                .update(
                    id,
                    UpdatePatch {
                        dense_embedding: Some(dense_embedding),
                        sparse_embedding: None,
                        payload: Some(memory.to_payload()),
                    },
                )
                .await?;
            self.audit.record(AuditEntry {
                memory_id: Some(id),
                operation: AuditOperation::Update,
                actor: scope_actor(&caller_scope),
                details: Value::Null,
                timestamp: Utc::now(),
            });
            return Ok(());
        }
        Err(PowerMemError::NotFound { id: id.to_string() })
    }

    pub async fn delete(&self, id: MemoryId, caller_scope: ScopeKeys) -> PowerMemResult<()> {
        let caller_scope = self.apply_default_scope(caller_scope);
        for store in self.all_stores() {
            let Some(record) = store.get(id).await? else { continue };
            let Some(memory) = record_to_memory(record) else { continue };
            if !caller_scope.is_subset_of(&memory.scope_keys) {
                return Err(PowerMemError::Unauthorized);
            }
            store.delete(id).await?;
            self.audit.record(AuditEntry {
                memory_id: Some(id),
                operation: AuditOperation::Delete,
                actor: scope_actor(&caller_scope),
                details: Value::Null,
                timestamp: Utc::now(),
            });
            return Ok(());
        }
        Err(PowerMemError::NotFound { id: id.to_string() })
    }

    /// `GET /memories` (§6.1): all records visible to `caller_scope`, main
    /// store plus every active sub-store, newest first.
    pub async fn get_all(&self, caller_scope: ScopeKeys, limit: usize) -> PowerMemResult<Vec<MemoryRecord>> {
        let caller_scope = self.apply_default_scope(caller_scope);
        let filter = caller_scope.as_filter();
        let mut all = Vec::new();
        for store in self.all_stores() {
            let page = store.list(filter.clone(), limit, 0).await?;
            all.extend(page.into_iter().filter_map(record_to_memory));
        }
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.get().cmp(&a.id.get())));
        all.truncate(limit);
        Ok(all)
    }

    /// Activates a sub-store (§4.6): copies matching main-store rows across,
    /// then flips it `Active`. Idempotent per S5/property 5 — a repeat call
    /// with `delete_source=true` is a no-op once already `Active`.
    pub async fn migrate(&self, sub_store_index: usize, delete_source: bool) -> PowerMemResult<()> {
        let result = self.router.migrate(sub_store_index, delete_source).await;
        if let Err(err) = &result {
            error!(error = %err, sub_store_index, "migration failed");
        } else {
            self.audit.record(AuditEntry {
                memory_id: None,
                operation: AuditOperation::Migrate,
                actor: AuditActor::System,
                details: serde_json::json!({ "sub_store_index": sub_store_index, "delete_source": delete_source }),
                timestamp: Utc::now(),
            });
        }
        result
    }

    /// Runs a reclassification sweep (promotion + should-forget flagging)
    /// over the main store and every sub-store, aggregating the reports.
    pub async fn reclassify(&self) -> PowerMemResult<SweepReport> {
        let now = Utc::now();
        let mut aggregate = SweepReport::default();
        for store in self.all_stores() {
            let sweep =
                ReclassificationSweep::new(store, self.retention_config.clone(), self.reclassification_config.clone());
            let report = sweep.run(now).await?;
            aggregate.examined += report.examined;
            aggregate.promoted += report.promoted;
            aggregate.should_forget.extend(report.should_forget);
        }
        if aggregate.promoted > 0 {
            self.audit.record(AuditEntry {
                memory_id: None,
                operation: AuditOperation::Reclassify,
                actor: AuditActor::System,
                details: serde_json::json!({ "promoted": aggregate.promoted, "examined": aggregate.examined }),
                timestamp: Utc::now(),
            });
        }
        Ok(aggregate)
    }

    pub async fn profile(&self, user_id: &str) -> PowerMemResult<Option<powermem_core::profile::ProfileBlob>> {
        match &self.profile {
            Some(profile) => profile.get(user_id).await,
            None => Ok(None),
        }
    }

    /// Pings every configured store (§5 "health checks" per SPEC_FULL
    /// ambient observability). A store that errors on `col_info` is
    /// reported unhealthy rather than failing the whole report.
    pub async fn health(&self) -> HealthReport {
        let mut checks = Vec::new();
        for (idx, store) in self.all_stores().into_iter().enumerate() {
            let name = if idx == 0 {
                "main".to_string()
            } else {
                self.router.sub_stores[idx - 1].config.name.clone()
            };
            match store.col_info().await {
                Ok(info) => checks.push(SubsystemCheck::ok(name, format!("{} records", info.count))),
                Err(err) => checks.push(SubsystemCheck::unhealthy(name, err.to_string())),
            }
        }
        HealthReport::from_checks(checks, Utc::now())
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }
}

fn record_to_memory(record: Record) -> Option<MemoryRecord> {
    MemoryRecord::from_row(record.id, record.dense_embedding, &record.payload)
}

fn scope_actor(scope: &ScopeKeys) -> AuditActor {
    match (&scope.user_id, &scope.agent_id) {
        (Some(user_id), _) => AuditActor::User(user_id.clone()),
        (None, Some(agent_id)) => AuditActor::Agent(agent_id.clone()),
        (None, None) => AuditActor::System,
    }
}
