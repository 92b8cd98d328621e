//! Builders for the record and config shapes that show up in nearly every
//! integration test: a record with sane defaults that individual tests
//! override only the field(s) they care about (`MemoryRecordBuilder`), and a
//! `SubStoreConfig` builder for router/sub-store tests that would otherwise
//! repeat the same `..SubStoreConfig::default()` boilerplate.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use powermem_core::config::SubStoreConfig;
use powermem_core::filter::FilterExpr;
use powermem_core::memory::{MemoryId, MemoryRecord, RetentionBlock, ScopeKeys};

/// Builds a `ScopeKeys` with only the fields named set, leaving the rest
/// `None` (the default, unscoped value every other field already has).
pub fn scope_keys(user_id: Option<&str>, agent_id: Option<&str>, run_id: Option<&str>, actor_id: Option<&str>) -> ScopeKeys {
    ScopeKeys {
        user_id: user_id.map(str::to_string),
        agent_id: agent_id.map(str::to_string),
        run_id: run_id.map(str::to_string),
        actor_id: actor_id.map(str::to_string),
    }
}

/// Shortcut for the common single-user-scope case.
pub fn user_scope(user_id: &str) -> ScopeKeys {
    scope_keys(Some(user_id), None, None, None)
}

/// A `MemoryRecord` builder defaulting to a deterministic id, empty
/// embedding, unscoped identity, and a fixed timestamp, so a test only
/// states the fields its assertion actually depends on.
pub struct MemoryRecordBuilder {
    id: MemoryId,
    content: String,
    dense_embedding: Vec<f32>,
    scope_keys: ScopeKeys,
    metadata: Map<String, Value>,
    now: DateTime<Utc>,
}

impl MemoryRecordBuilder {
    pub fn new(id: i64, content: impl Into<String>) -> Self {
        Self {
            id: MemoryId(id),
            content: content.into(),
            dense_embedding: Vec::new(),
            scope_keys: ScopeKeys::default(),
            metadata: Map::new(),
            now: Utc::now(),
        }
    }

    pub fn dense_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.dense_embedding = embedding;
        self
    }

    pub fn scope_keys(mut self, scope_keys: ScopeKeys) -> Self {
        self.scope_keys = scope_keys;
        self
    }

    pub fn metadata_field(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn retention(mut self, block: &RetentionBlock) -> Self {
        self.metadata.insert(
            "retention".to_string(),
            serde_json::to_value(block).expect("RetentionBlock always serializes"),
        );
        self
    }

    pub fn build(self) -> MemoryRecord {
        let mut record = MemoryRecord::new(self.id, self.content, self.dense_embedding, self.scope_keys, self.now);
        for (key, value) in self.metadata {
            record.metadata.insert(key, value);
        }
        record
    }
}

/// A `SubStoreConfig` builder for router tests, defaulting to an
/// always-false routing filter (so a test that forgets to set one gets a
/// sub-store that never receives writes, rather than one that silently
/// swallows everything).
pub struct SubStoreConfigBuilder {
    config: SubStoreConfig,
}

impl SubStoreConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            config: SubStoreConfig {
                name: name.to_string(),
                routing_filter: FilterExpr::Or(Vec::new()),
                ..SubStoreConfig::default()
            },
        }
    }

    pub fn routing_filter(mut self, filter: FilterExpr) -> Self {
        self.config.routing_filter = filter;
        self
    }

    pub fn matching_field(self, field: &str, value: Value) -> Self {
        self.routing_filter(FilterExpr::Eq(field.to_string(), value))
    }

    pub fn dims(mut self, dims: usize) -> Self {
        self.config.dims = Some(dims);
        self
    }

    pub fn migration_batch_size(mut self, size: usize) -> Self {
        self.config.migration_batch_size = size;
        self
    }

    pub fn build(self) -> SubStoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder_stamps_defaults_and_overrides() {
        let record = MemoryRecordBuilder::new(1, "hello world").build();
        assert_eq!(record.id, MemoryId(1));
        assert_eq!(record.content, "hello world");
        assert!(record.scope_keys.is_empty());
    }

    #[test]
    fn record_builder_carries_a_retention_block() {
        let block = RetentionBlock::new_for_add(0.5, 0.82, 0.3, Utc::now());
        let record = MemoryRecordBuilder::new(2, "x").retention(&block).build();
        assert!(record.retention_block().is_some());
    }

    #[test]
    fn sub_store_builder_defaults_to_a_never_matching_filter() {
        let config = SubStoreConfigBuilder::new("working").build();
        assert!(!config.routing_filter.matches(&serde_json::json!({"kind": "working"})));
    }

    #[test]
    fn sub_store_builder_honors_matching_field() {
        let config = SubStoreConfigBuilder::new("working")
            .matching_field("kind", serde_json::json!("working"))
            .build();
        assert!(config.routing_filter.matches(&serde_json::json!({"kind": "working"})));
    }
}
