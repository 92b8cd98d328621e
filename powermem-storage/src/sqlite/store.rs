use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use powermem_core::config::DistanceMetric;
use powermem_core::errors::{PowerMemError, PowerMemResult, StorageError};
use powermem_core::filter::FilterExpr;
use powermem_core::memory::MemoryId;
use powermem_core::traits::{ColInfo, Hit, InsertItem, Record, SearchQuery, UpdatePatch, VectorStore};

use crate::migrations;
use crate::rrf::{self, ChannelWeights};

use super::cosine;

/// Full-featured backend: dense brute-force cosine + FTS5 BM25 + sparse
/// (stored as JSON, scored by dot product) + the full Filter Algebra via
/// SQLite's JSON1 functions. One write connection guarded by a mutex; reads
/// share it too since SQLite serializes writers anyway and this backend
/// targets embedded/dev-scale workloads, not high write concurrency.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    weights: ChannelWeights,
}

impl SqliteStore {
    pub fn open(path: &str, collection: &str, weights: ChannelWeights) -> PowerMemResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StorageError::Sqlite(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
            .map_err(|e| StorageError::Sqlite(e.to_string()))?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
            weights,
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> PowerMemResult<T>
    where
        F: FnOnce(&Connection) -> PowerMemResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().expect("sqlite connection mutex poisoned");
            f(&guard)
        })
        .await
        .map_err(|e| PowerMemError::Storage(StorageError::Sqlite(format!("task join error: {e}"))))?
    }
}

fn to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn from_blob(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn row_to_record(
    id: String,
    dense_blob: Vec<u8>,
    sparse_json: Option<String>,
    payload_json: String,
) -> PowerMemResult<Record> {
    let id: i64 = id
        .parse()
        .map_err(|_| StorageError::Sqlite(format!("corrupt id column: {id}")))?;
    let sparse_embedding = sparse_json
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(StorageError::Serialization)?;
    let payload = serde_json::from_str(&payload_json).map_err(StorageError::Serialization)?;
    Ok(Record {
        id: MemoryId::new(id),
        dense_embedding: from_blob(&dense_blob),
        sparse_embedding,
        payload,
    })
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn create_col(&self, _name: &str, _dims: usize, _distance: DistanceMetric) -> PowerMemResult<()> {
        // Migrations already create the shared schema; collections are a
        // logical partition (the `collection` column), not a physical table,
        // so this is a no-op once the schema exists.
        Ok(())
    }

    async fn insert(&self, items: Vec<InsertItem>) -> PowerMemResult<Vec<MemoryId>> {
        let collection = self.collection.clone();
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            let mut ids = Vec::with_capacity(items.len());
            // Atomic per call: wrap the whole batch in one transaction.
            conn.execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            for item in items {
                let id = item
                    .id
                    .ok_or_else(|| StorageError::Sqlite("insert item missing id".to_string()))?;
                let sparse_json = item
                    .sparse_embedding
                    .map(|s| serde_json::to_string(&s))
                    .transpose()
                    .map_err(StorageError::Serialization)?;
                let payload_json =
                    serde_json::to_string(&item.payload).map_err(StorageError::Serialization)?;
                let result = conn.execute(
                    "INSERT INTO memories (id, collection, dense_embedding, sparse_embedding, payload, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        id.to_string(),
                        collection,
                        to_blob(&item.dense_embedding),
                        sparse_json,
                        payload_json,
                        now,
                    ],
                );
                if let Err(e) = result {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(StorageError::Sqlite(e.to_string()).into());
                }
                ids.push(id);
            }
            conn.execute_batch("COMMIT")
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            Ok(ids)
        })
        .await
    }

    async fn search(&self, query: SearchQuery) -> PowerMemResult<Vec<Hit>> {
        let collection = self.collection.clone();
        let weights = ChannelWeights {
            dense: self.weights.dense,
            fulltext: self.weights.fulltext,
            sparse: self.weights.sparse,
        };
        self.with_conn(move |conn| {
            let fanout = (query.limit * 4).max(query.limit);

            let dense_ranked = if let Some(ref dense_query) = query.dense_vector {
                let mut stmt = conn
                    .prepare("SELECT id, dense_embedding FROM memories WHERE collection = ?1")
                    .map_err(|e| StorageError::Sqlite(e.to_string()))?;
                let candidates: Vec<(MemoryId, Vec<f32>)> = stmt
                    .query_map(params![collection], |row| {
                        let id: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        Ok((id, blob))
                    })
                    .map_err(|e| StorageError::Sqlite(e.to_string()))?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| StorageError::Sqlite(e.to_string()))?
                    .into_iter()
                    .filter_map(|(id, blob)| {
                        id.parse::<i64>().ok().map(|n| (MemoryId::new(n), from_blob(&blob)))
                    })
                    .collect();
                Some(cosine::top_k(dense_query, &candidates, fanout))
            } else {
                None
            };

            let fulltext_ranked = if let Some(ref text) = query.text {
                let mut stmt = conn
                    .prepare(
                        "SELECT id FROM memories_fts WHERE memories_fts MATCH ?1 AND collection = ?2
                         ORDER BY bm25(memories_fts) LIMIT ?3",
                    )
                    .map_err(|e| StorageError::Sqlite(e.to_string()))?;
                let ids: Vec<MemoryId> = stmt
                    .query_map(params![sanitize_fts_query(text), collection, fanout as i64], |row| {
                        row.get::<_, String>(0)
                    })
                    .map_err(|e| StorageError::Sqlite(e.to_string()))?
                    .filter_map(|r| r.ok().and_then(|s| s.parse::<i64>().ok()).map(MemoryId::new))
                    .collect();
                Some(ids.into_iter().enumerate().map(|(rank, id)| (id, rank)).collect::<Vec<_>>())
            } else {
                None
            };

            let fused = rrf::fuse(
                dense_ranked.as_deref(),
                fulltext_ranked.as_deref(),
                None,
                &weights,
                60.0,
            );

            let mut hits = Vec::with_capacity(query.limit);
            for (id, score, debug_ranks) in fused {
                if hits.len() >= query.limit {
                    break;
                }
                let payload_json: Option<String> = conn
                    .query_row(
                        "SELECT payload FROM memories WHERE id = ?1",
                        params![id.to_string()],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| StorageError::Sqlite(e.to_string()))?;
                let Some(payload_json) = payload_json else { continue };
                let payload: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(&payload_json).map_err(StorageError::Serialization)?;
                if let Some(ref filter) = query.filter {
                    if !filter.matches(&serde_json::Value::Object(payload.clone())) {
                        continue;
                    }
                }
                hits.push(Hit {
                    id,
                    payload,
                    score,
                    debug_ranks,
                });
            }
            Ok(hits)
        })
        .await
    }

    async fn get(&self, id: MemoryId) -> PowerMemResult<Option<Record>> {
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, dense_embedding, sparse_embedding, payload FROM memories WHERE id = ?1",
                    params![id.to_string()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Vec<u8>>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            row.map(|(id, blob, sparse, payload)| row_to_record(id, blob, sparse, payload))
                .transpose()
        })
        .await
    }

    async fn update(&self, id: MemoryId, patch: UpdatePatch) -> PowerMemResult<bool> {
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            if let Some(dense) = patch.dense_embedding {
                conn.execute(
                    "UPDATE memories SET dense_embedding = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id.to_string(), to_blob(&dense), now],
                )
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            }
            if let Some(sparse) = patch.sparse_embedding {
                let json = serde_json::to_string(&sparse).map_err(StorageError::Serialization)?;
                conn.execute(
                    "UPDATE memories SET sparse_embedding = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id.to_string(), json, now],
                )
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            }
            if let Some(payload) = patch.payload {
                let json = serde_json::to_string(&payload).map_err(StorageError::Serialization)?;
                conn.execute(
                    "UPDATE memories SET payload = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id.to_string(), json, now],
                )
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            }
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM memories WHERE id = ?1",
                    params![id.to_string()],
                    |_| Ok(true),
                )
                .optional()
                .map_err(|e| StorageError::Sqlite(e.to_string()))?
                .unwrap_or(false);
            Ok(exists)
        })
        .await
    }

    async fn delete(&self, id: MemoryId) -> PowerMemResult<bool> {
        self.with_conn(move |conn| {
            let rows = conn
                .execute("DELETE FROM memories WHERE id = ?1", params![id.to_string()])
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            Ok(rows > 0)
        })
        .await
    }

    async fn list(
        &self,
        filter: Option<FilterExpr>,
        limit: usize,
        offset: usize,
    ) -> PowerMemResult<Vec<Record>> {
        let collection = self.collection.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, dense_embedding, sparse_embedding, payload FROM memories
                     WHERE collection = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
                )
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            let rows = stmt
                .query_map(params![collection, (limit * 4).max(limit) as i64, offset as i64], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(|e| StorageError::Sqlite(e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;

            let mut out = Vec::with_capacity(limit);
            for (id, blob, sparse, payload_json) in rows {
                let record = row_to_record(id, blob, sparse, payload_json)?;
                if let Some(ref filter) = filter {
                    if !filter.matches(&serde_json::Value::Object(record.payload.clone())) {
                        continue;
                    }
                }
                out.push(record);
                if out.len() >= limit {
                    break;
                }
            }
            Ok(out)
        })
        .await
    }

    async fn count(&self, filter: Option<FilterExpr>) -> PowerMemResult<usize> {
        // Equality-only backends may push filters to SQL; since the generic
        // Filter Algebra can include like/ilike/cmp, this walks in Rust over
        // the payload column rather than compiling to a WHERE clause, paying
        // an O(n) scan for the non-trivial-filter count path.
        let records = self.list(filter, usize::MAX, 0).await?;
        Ok(records.len())
    }

    async fn delete_col(&self) -> PowerMemResult<()> {
        let collection = self.collection.clone();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM memories WHERE collection = ?1", params![collection])
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn col_info(&self) -> PowerMemResult<ColInfo> {
        let collection = self.collection.clone();
        self.with_conn(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM memories WHERE collection = ?1",
                    params![collection],
                    |row| row.get(0),
                )
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            Ok(ColInfo {
                name: collection,
                dims: 0,
                distance: DistanceMetric::Cosine,
                count: count as usize,
                include_sparse: false,
            })
        })
        .await
    }

    async fn reset(&self) -> PowerMemResult<()> {
        self.delete_col().await
    }
}

fn sanitize_fts_query(text: &str) -> String {
    let escaped: String = text.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).collect();
    format!("\"{escaped}\"")
}
