//! Record Model & Metadata (C4, §3.1, §4.4): memory IDs, the record shape,
//! scope-key isolation, and the retention block carried in metadata.

mod id;
mod retention;
mod scope;

pub use id::{MemoryId, SnowflakeGenerator};
pub use retention::{MemoryType, RetentionBlock};
pub use scope::ScopeKeys;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lowercase, NFC-normalize, and collapse whitespace runs to a single space
/// (§4.4 `normalize = nfc→lower→collapse-whitespace`). Used both for the
/// `fulltext_content` projection and as the input to `content_hash`.
pub fn normalize_content(content: &str) -> String {
    let lower: String = content.nfc().collect::<String>().to_lowercase();
    let mut normalized = String::with_capacity(lower.len());
    let mut last_was_space = false;
    for ch in lower.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                normalized.push(' ');
            }
            last_was_space = true;
        } else {
            normalized.push(ch);
            last_was_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Content fingerprint used for exact-dedup (I4). The specification names
/// `sha256(normalize(content))[:16]`; this workspace already depends on
/// `blake3` elsewhere (snowflake-free content addressing, sub-store page
/// checksums), so the fingerprint uses blake3 instead of pulling in a
/// second hashing crate for an equivalent collision-resistance guarantee.
pub fn content_hash(content: &str) -> String {
    let normalized = normalize_content(content);
    blake3::hash(normalized.as_bytes()).to_hex()[..16].to_string()
}

use unicode_normalization::UnicodeNormalization;

/// A single memory record (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: MemoryId,
    pub content: String,
    pub dense_embedding: Vec<f32>,
    pub sparse_embedding: Option<Map<String, Value>>,
    pub scope_keys: ScopeKeys,
    pub metadata: Map<String, Value>,
    pub fulltext_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Build a fresh record for an ADD decision. `id` is supplied by the
    /// caller's `SnowflakeGenerator`; timestamps are supplied by the caller's
    /// clock so ingest code stays testable without wall-clock calls.
    pub fn new(
        id: MemoryId,
        content: String,
        dense_embedding: Vec<f32>,
        scope_keys: ScopeKeys,
        now: DateTime<Utc>,
    ) -> Self {
        let fulltext_content = normalize_content(&content);
        let hash = content_hash(&content);
        let mut metadata = Map::new();
        metadata.insert("hash".to_string(), Value::String(hash));
        Self {
            id,
            content,
            dense_embedding,
            sparse_embedding: None,
            scope_keys,
            metadata,
            fulltext_content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn hash(&self) -> Option<&str> {
        self.metadata.get("hash").and_then(Value::as_str)
    }

    /// The retention block lives under `metadata["retention"]` (§4.5) so it
    /// rides along with every backend's generic JSON payload column instead
    /// of needing its own schema.
    pub fn retention_block(&self) -> Option<RetentionBlock> {
        self.metadata
            .get("retention")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_retention_block(&mut self, block: &RetentionBlock) {
        self.metadata.insert(
            "retention".to_string(),
            serde_json::to_value(block).expect("RetentionBlock always serializes"),
        );
    }

    /// Rewrite `content` (and its derived projections), bumping `updated_at`.
    /// Preserves `id` per the Mutate lifecycle (§3.7).
    pub fn update_content(&mut self, content: String, dense_embedding: Vec<f32>, now: DateTime<Utc>) {
        self.fulltext_content = normalize_content(&content);
        let hash = content_hash(&content);
        self.metadata.insert("hash".to_string(), Value::String(hash));
        self.content = content;
        self.dense_embedding = dense_embedding;
        self.updated_at = now;
    }

    /// Projects this record into the generic `Map<String, Value>` payload
    /// shape every `VectorStore` backend persists (§4.3's backend-agnostic
    /// payload column). `scope_keys` and `metadata` each land under their
    /// own top-level key so Filter Algebra dotted paths like
    /// `scope_keys.user_id` or `metadata.project` resolve as nested JSON.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("content".to_string(), Value::String(self.content.clone()));
        payload.insert(
            "fulltext_content".to_string(),
            Value::String(self.fulltext_content.clone()),
        );
        payload.insert("scope_keys".to_string(), self.scope_keys.to_json());
        payload.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        payload.insert(
            "created_at".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        payload.insert(
            "updated_at".to_string(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        payload
    }

    /// Reconstructs a record from a stored row. `None` if the payload is
    /// missing a required field — a corrupt or foreign row, not a record
    /// this type ever wrote.
    pub fn from_row(
        id: MemoryId,
        dense_embedding: Vec<f32>,
        payload: &Map<String, Value>,
    ) -> Option<Self> {
        let content = payload.get("content")?.as_str()?.to_string();
        let fulltext_content = payload
            .get("fulltext_content")
            .and_then(Value::as_str)
            .unwrap_or(&content)
            .to_string();
        let scope_keys = payload
            .get("scope_keys")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let metadata = payload
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let created_at = payload
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))?;
        let updated_at = payload
            .get("updated_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(created_at);
        Some(Self {
            id,
            content,
            dense_embedding,
            sparse_embedding: None,
            scope_keys,
            metadata,
            fulltext_content,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize_content("  Remember\n\tTHIS  "), "remember this");
    }

    #[test]
    fn hash_is_stable_across_whitespace_variants() {
        assert_eq!(
            content_hash("Buy milk"),
            content_hash("  buy   milk  ")
        );
    }

    #[test]
    fn retention_block_roundtrips_through_metadata() {
        let mut record = MemoryRecord::new(
            MemoryId(1),
            "buy milk".to_string(),
            vec![0.1, 0.2],
            ScopeKeys::default(),
            Utc::now(),
        );
        assert!(record.retention_block().is_none());
        let block = RetentionBlock::new_for_add(0.5, 0.82, 0.3, Utc::now());
        record.set_retention_block(&block);
        let roundtripped = record.retention_block().expect("just set");
        assert_eq!(roundtripped.memory_type, block.memory_type);
    }

    #[test]
    fn hash_changes_with_content() {
        assert_ne!(content_hash("Buy milk"), content_hash("Buy bread"));
    }
}
