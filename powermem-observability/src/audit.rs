//! In-memory audit trail: a bounded, best-effort record of who did what to
//! which memory. Not part of persisted state (§6.4 only names the sub-store
//! status and profile tables) — this is an ambient operability surface, so
//! it is dropped on process restart like any other in-process log.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use powermem_core::memory::MemoryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    Add,
    Update,
    Delete,
    Migrate,
    Reclassify,
    ProfileUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditActor {
    System,
    User(String),
    Agent(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub memory_id: Option<MemoryId>,
    pub operation: AuditOperation,
    pub actor: AuditActor,
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

/// Bounded ring buffer of the most recent entries. A full buffer drops the
/// oldest entry rather than refusing the new one — recording is best-effort
/// and must never hold up the operation it's observing.
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            entries.pop_front();
            warn!(capacity = self.capacity, "audit log full, dropping oldest entry");
        }
        entries.push_back(entry);
    }

    pub fn query_by_memory(&self, memory_id: MemoryId) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.memory_id == Some(memory_id))
            .cloned()
            .collect()
    }

    pub fn query_by_actor(&self, actor: &AuditActor) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().iter().filter(|e| &e.actor == actor).cloned().collect()
    }

    pub fn query_by_time_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    /// 10,000 entries is generous for a best-effort in-process log without
    /// risking unbounded growth on a long-lived facade.
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(memory_id: i64, actor: AuditActor) -> AuditEntry {
        AuditEntry {
            memory_id: Some(MemoryId(memory_id)),
            operation: AuditOperation::Add,
            actor,
            details: json!({}),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn records_are_queryable_by_memory_id() {
        let log = AuditLog::new(8);
        log.record(entry(1, AuditActor::System));
        log.record(entry(2, AuditActor::System));

        assert_eq!(log.query_by_memory(MemoryId(1)).len(), 1);
        assert_eq!(log.query_by_memory(MemoryId(3)).len(), 0);
    }

    #[test]
    fn a_full_log_drops_the_oldest_entry() {
        let log = AuditLog::new(2);
        log.record(entry(1, AuditActor::System));
        log.record(entry(2, AuditActor::System));
        log.record(entry(3, AuditActor::System));

        assert_eq!(log.len(), 2);
        assert!(log.query_by_memory(MemoryId(1)).is_empty());
        assert_eq!(log.query_by_memory(MemoryId(3)).len(), 1);
    }

    #[test]
    fn records_are_queryable_by_actor() {
        let log = AuditLog::new(8);
        log.record(entry(1, AuditActor::User("u1".to_string())));
        log.record(entry(2, AuditActor::Agent("a1".to_string())));

        assert_eq!(log.query_by_actor(&AuditActor::User("u1".to_string())).len(), 1);
        assert_eq!(log.query_by_actor(&AuditActor::Agent("a1".to_string())).len(), 1);
    }
}
