//! Synchronous surface (§4.9): same method names as `MemoryEngine`, each
//! one blocking on a private multi-thread `tokio::Runtime` rather than
//! re-implementing any pipeline logic (§9 "async vs sync duplication —
//! specify the async core; the sync surface delegates through a blocking
//! adapter").

use powermem_core::config::PowerMemConfig;
use powermem_core::errors::PowerMemResult;
use powermem_core::memory::{MemoryId, MemoryRecord, ScopeKeys};
use powermem_observability::{AuditEntry, HealthReport};
use powermem_reclassification::SweepReport;
use powermem_retrieval::RetrievalResponse;

use crate::engine::{AddRequest, MemoryEngine, SearchRequest};
use powermem_ingest::IngestResponse;

pub struct BlockingMemoryEngine {
    rt: tokio::runtime::Runtime,
    inner: MemoryEngine,
}

impl BlockingMemoryEngine {
    pub fn new(config: PowerMemConfig, agent_id: Option<String>) -> PowerMemResult<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to start the blocking facade's tokio runtime");
        // `MemoryEngine::new` spawns the retention write-back task
        // (`tokio::spawn`), which panics outside an active runtime context —
        // `enter()` establishes that context for this synchronous call.
        let inner = {
            let _guard = rt.enter();
            MemoryEngine::new(config, agent_id)?
        };
        Ok(Self { rt, inner })
    }

    pub fn add(&self, request: AddRequest) -> PowerMemResult<IngestResponse> {
        self.rt.block_on(self.inner.add(request))
    }

    pub fn search(&self, request: SearchRequest) -> PowerMemResult<RetrievalResponse> {
        self.rt.block_on(self.inner.search(request))
    }

    pub fn get(&self, id: MemoryId, caller_scope: ScopeKeys) -> PowerMemResult<Option<MemoryRecord>> {
        self.rt.block_on(self.inner.get(id, caller_scope))
    }

    pub fn update(&self, id: MemoryId, content: String, caller_scope: ScopeKeys) -> PowerMemResult<()> {
        self.rt.block_on(self.inner.update(id, content, caller_scope))
    }

    pub fn delete(&self, id: MemoryId, caller_scope: ScopeKeys) -> PowerMemResult<()> {
        self.rt.block_on(self.inner.delete(id, caller_scope))
    }

    pub fn get_all(&self, caller_scope: ScopeKeys, limit: usize) -> PowerMemResult<Vec<MemoryRecord>> {
        self.rt.block_on(self.inner.get_all(caller_scope, limit))
    }

    pub fn migrate(&self, sub_store_index: usize, delete_source: bool) -> PowerMemResult<()> {
        self.rt.block_on(self.inner.migrate(sub_store_index, delete_source))
    }

    pub fn reclassify(&self) -> PowerMemResult<SweepReport> {
        self.rt.block_on(self.inner.reclassify())
    }

    pub fn profile(&self, user_id: &str) -> PowerMemResult<Option<powermem_core::profile::ProfileBlob>> {
        self.rt.block_on(self.inner.profile(user_id))
    }

    pub fn health(&self) -> HealthReport {
        self.rt.block_on(self.inner.health())
    }

    pub fn audit_entries_for(&self, id: MemoryId) -> Vec<AuditEntry> {
        self.inner.audit_log().query_by_memory(id)
    }
}
