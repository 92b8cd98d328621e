//! Write/read routing decisions (§4.6 steps 1-2) and the migration protocol
//! (§4.6 steps 3-5) that moves a sub-store from `Dormant` through
//! `Migrating` to `Active` (or `Failed`).

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use powermem_core::config::SubStoreConfig;
use powermem_core::errors::{PowerMemError, PowerMemResult, RouterError};
use powermem_core::filter::FilterExpr;
use powermem_core::traits::{Embedder, InsertItem, UpdatePatch, VectorStore};

use crate::state::{SubStoreState, SubStoreStatus};

/// One configured sub-store: its routing filter, its own embedder (content
/// may need re-embedding at different dimensions), its backing store, and
/// its activation state.
pub struct SubStore {
    pub config: SubStoreConfig,
    pub store: Arc<dyn VectorStore>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub state: SubStoreState,
}

impl SubStore {
    pub fn new(config: SubStoreConfig, store: Arc<dyn VectorStore>, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self {
            config,
            store,
            embedder,
            state: SubStoreState::default(),
        }
    }
}

/// Where a write or read should be directed. Reads can fan out; writes
/// never do (§4.6 step 1 picks the single lowest-index matching sub-store).
pub enum ReadTarget {
    Single(Arc<dyn VectorStore>),
    Fanout(Vec<Arc<dyn VectorStore>>),
}

pub struct Router {
    pub main: Arc<dyn VectorStore>,
    pub sub_stores: Vec<SubStore>,
}

impl Router {
    pub fn new(main: Arc<dyn VectorStore>, sub_stores: Vec<SubStore>) -> Self {
        Self { main, sub_stores }
    }

    /// §4.6 step 1: lowest-index ACTIVE-or-MIGRATING sub-store whose
    /// `routing_filter` matches the record's metadata, else the main store.
    pub fn route_for_write(&self, metadata: &Map<String, Value>) -> Arc<dyn VectorStore> {
        let doc = Value::Object(metadata.clone());
        for sub_store in &self.sub_stores {
            if sub_store.state.accepts_writes() && sub_store.config.routing_filter.matches(&doc) {
                return sub_store.store.clone();
            }
        }
        self.main.clone()
    }

    /// §4.6 step 2: if the caller's filter is a specialization of some ACTIVE
    /// sub-store's routing filter, search only that sub-store; otherwise fan
    /// out to main plus every ACTIVE sub-store.
    pub fn route_for_read(&self, filters: Option<&FilterExpr>) -> ReadTarget {
        if let Some(filters) = filters {
            for sub_store in &self.sub_stores {
                if sub_store.state.accepts_reads() && filters.specializes(&sub_store.config.routing_filter) {
                    return ReadTarget::Single(sub_store.store.clone());
                }
            }
        }

        let mut targets = vec![self.main.clone()];
        targets.extend(
            self.sub_stores
                .iter()
                .filter(|s| s.state.accepts_reads())
                .map(|s| s.store.clone()),
        );
        ReadTarget::Fanout(targets)
    }

    /// Same routing decision as `route_for_read`, but returns the name each
    /// target would be annotated with as `_source_store` (§4.5's per-hit
    /// store provenance) instead of the store handle itself. Caller zips
    /// this by index against the `ReadTarget` it got from `route_for_read`
    /// for the same filter.
    pub fn read_target_names(&self, filters: Option<&FilterExpr>) -> Vec<String> {
        if let Some(filters) = filters {
            for sub_store in &self.sub_stores {
                if sub_store.state.accepts_reads() && filters.specializes(&sub_store.config.routing_filter) {
                    return vec![sub_store.config.name.clone()];
                }
            }
        }

        let mut names = vec!["main".to_string()];
        names.extend(
            self.sub_stores
                .iter()
                .filter(|s| s.state.accepts_reads())
                .map(|s| s.config.name.clone()),
        );
        names
    }

    /// Runs the migration protocol for `sub_stores[index]`. No-op if it's
    /// already `Active` (§4.6 idempotence).
    pub async fn migrate(&self, index: usize, delete_source: bool) -> PowerMemResult<()> {
        let sub_store = self
            .sub_stores
            .get(index)
            .ok_or_else(|| PowerMemError::from(RouterError::UnknownSubStore(index)))?;

        if sub_store.state.get() == SubStoreStatus::Active {
            info!(sub_store = %sub_store.config.name, "migration already complete, skipping");
            return Ok(());
        }
        if sub_store.state.get() == SubStoreStatus::Migrating {
            return Err(RouterError::MigrationInProgress(sub_store.config.name.clone()).into());
        }

        sub_store.state.set(SubStoreStatus::Migrating);

        let result = self.run_migration_pages(sub_store, delete_source).await;

        match result {
            Ok(moved) => {
                sub_store.state.set(SubStoreStatus::Active);
                info!(sub_store = %sub_store.config.name, moved, "sub-store activated");
                Ok(())
            }
            Err(err) => {
                sub_store.state.set(SubStoreStatus::Failed);
                warn!(sub_store = %sub_store.config.name, error = %err, "migration failed");
                Err(err)
            }
        }
    }

    async fn run_migration_pages(&self, sub_store: &SubStore, delete_source: bool) -> PowerMemResult<usize> {
        let batch = sub_store.config.migration_batch_size;
        let mut moved = 0usize;

        loop {
            let page = self
                .main
                .list(Some(sub_store.config.routing_filter.clone()), batch, 0)
                .await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();

            let mut items = Vec::with_capacity(page_len);
            let mut source_ids = Vec::with_capacity(page_len);
            for record in &page {
                let dense_embedding = match &sub_store.embedder {
                    Some(embedder) => {
                        let text = record
                            .payload
                            .get("fulltext_content")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        embedder
                            .embed(text, powermem_core::traits::EmbedAction::Add)
                            .await?
                    }
                    None => record.dense_embedding.clone(),
                };
                items.push(InsertItem {
                    id: Some(record.id),
                    dense_embedding,
                    sparse_embedding: record.sparse_embedding.clone(),
                    payload: record.payload.clone(),
                });
                source_ids.push(record.id);
            }

            sub_store.store.insert(items).await?;

            if delete_source {
                for id in &source_ids {
                    self.main.delete(*id).await?;
                }
            }

            moved += page_len;
            if page_len < batch {
                break;
            }
        }

        Ok(moved)
    }

    /// Applies a write to whichever store §4.6 step 1 selects, routing on
    /// the payload's metadata.
    pub async fn insert_routed(&self, payload: Map<String, Value>, dense_embedding: Vec<f32>, sparse_embedding: Option<powermem_core::traits::SparseVector>) -> PowerMemResult<powermem_core::memory::MemoryId> {
        let target = self.route_for_write(&payload);
        let ids = target
            .insert(vec![InsertItem {
                id: None,
                dense_embedding,
                sparse_embedding,
                payload,
            }])
            .await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| PowerMemError::Fatal {
                code: "ROUTER_EMPTY_INSERT",
                detail: "insert() returned no ids".to_string(),
            })
    }

    /// Best-effort update-in-place that leaves UpdatePatch construction to
    /// the caller; exists so the ingest pipeline doesn't need to know which
    /// physical store currently holds a given id.
    pub async fn update_in(&self, target: &Arc<dyn VectorStore>, id: powermem_core::memory::MemoryId, patch: UpdatePatch) -> PowerMemResult<bool> {
        target.update(id, patch).await
    }
}
