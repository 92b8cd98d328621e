//! Dense-only embedded backend for tests/dev (§6.3 minimum backend (c)).
//! No FTS/sparse channel; the full Filter Algebra works since it's pure
//! in-memory evaluation, not a SQL compiler with operator gaps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use powermem_core::config::DistanceMetric;
use powermem_core::errors::{PowerMemResult, StorageError};
use powermem_core::filter::FilterExpr;
use powermem_core::memory::MemoryId;
use powermem_core::traits::{
    ColInfo, DebugRanks, Hit, InsertItem, Record, SearchQuery, SparseVector, UpdatePatch, VectorStore,
};

use crate::sqlite::cosine;

struct Row {
    dense_embedding: Vec<f32>,
    sparse_embedding: Option<SparseVector>,
    payload: serde_json::Map<String, serde_json::Value>,
}

pub struct InMemoryStore {
    rows: DashMap<MemoryId, Row>,
    insertion_order: Mutex<Vec<MemoryId>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            insertion_order: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_col(&self, _name: &str, _dims: usize, _distance: DistanceMetric) -> PowerMemResult<()> {
        Ok(())
    }

    async fn insert(&self, items: Vec<InsertItem>) -> PowerMemResult<Vec<MemoryId>> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id.unwrap_or_else(|| {
                MemoryId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
            });
            self.rows.insert(
                id,
                Row {
                    dense_embedding: item.dense_embedding,
                    sparse_embedding: item.sparse_embedding,
                    payload: item.payload,
                },
            );
            self.insertion_order.lock().unwrap().push(id);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn search(&self, query: SearchQuery) -> PowerMemResult<Vec<Hit>> {
        let candidates: Vec<(MemoryId, Vec<f32>)> = self
            .rows
            .iter()
            .map(|entry| (*entry.key(), entry.value().dense_embedding.clone()))
            .collect();

        let ranked = if let Some(ref dense_query) = query.dense_vector {
            cosine::top_k(dense_query, &candidates, (query.limit * 4).max(query.limit))
        } else {
            candidates
                .iter()
                .enumerate()
                .map(|(rank, (id, _))| (*id, rank))
                .collect()
        };

        let mut hits = Vec::with_capacity(query.limit);
        for (rank, (id, _)) in ranked.iter().enumerate() {
            if hits.len() >= query.limit {
                break;
            }
            let Some(row) = self.rows.get(id) else { continue };
            if let Some(ref filter) = query.filter {
                if !filter.matches(&serde_json::Value::Object(row.payload.clone())) {
                    continue;
                }
            }
            hits.push(Hit {
                id: *id,
                payload: row.payload.clone(),
                score: 1.0 / (60.0 + rank as f64),
                debug_ranks: DebugRanks {
                    dense_rank: Some(rank),
                    fulltext_rank: None,
                    sparse_rank: None,
                },
            });
        }
        Ok(hits)
    }

    async fn get(&self, id: MemoryId) -> PowerMemResult<Option<Record>> {
        Ok(self.rows.get(&id).map(|row| Record {
            id,
            dense_embedding: row.dense_embedding.clone(),
            sparse_embedding: row.sparse_embedding.clone(),
            payload: row.payload.clone(),
        }))
    }

    async fn update(&self, id: MemoryId, patch: UpdatePatch) -> PowerMemResult<bool> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(dense) = patch.dense_embedding {
            row.dense_embedding = dense;
        }
        if let Some(sparse) = patch.sparse_embedding {
            row.sparse_embedding = Some(sparse);
        }
        if let Some(payload) = patch.payload {
            row.payload = payload;
        }
        Ok(true)
    }

    async fn delete(&self, id: MemoryId) -> PowerMemResult<bool> {
        let removed = self.rows.remove(&id).is_some();
        if removed {
            self.insertion_order.lock().unwrap().retain(|existing| *existing != id);
        }
        Ok(removed)
    }

    async fn list(
        &self,
        filter: Option<FilterExpr>,
        limit: usize,
        offset: usize,
    ) -> PowerMemResult<Vec<Record>> {
        let order = self.insertion_order.lock().unwrap().clone();
        let mut out = Vec::with_capacity(limit.min(order.len()));
        for id in order.into_iter().skip(offset) {
            let Some(row) = self.rows.get(&id) else { continue };
            if let Some(ref filter) = filter {
                if !filter.matches(&serde_json::Value::Object(row.payload.clone())) {
                    continue;
                }
            }
            out.push(Record {
                id,
                dense_embedding: row.dense_embedding.clone(),
                sparse_embedding: row.sparse_embedding.clone(),
                payload: row.payload.clone(),
            });
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    async fn count(&self, filter: Option<FilterExpr>) -> PowerMemResult<usize> {
        Ok(self.list(filter, usize::MAX, 0).await?.len())
    }

    async fn delete_col(&self) -> PowerMemResult<()> {
        self.rows.clear();
        self.insertion_order.lock().unwrap().clear();
        Ok(())
    }

    async fn col_info(&self) -> PowerMemResult<ColInfo> {
        Ok(ColInfo {
            name: "in-memory".to_string(),
            dims: 0,
            distance: DistanceMetric::Cosine,
            count: self.rows.len(),
            include_sparse: false,
        })
    }

    async fn reset(&self) -> PowerMemResult<()> {
        self.delete_col().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(dense: Vec<f32>, payload: serde_json::Value) -> InsertItem {
        InsertItem {
            id: None,
            dense_embedding: dense,
            sparse_embedding: None,
            payload: payload.as_object().unwrap().clone(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = InMemoryStore::new();
        let ids = store
            .insert(vec![item(vec![1.0, 0.0], json!({"content": "hello"}))])
            .await
            .unwrap();
        let fetched = store.get(ids[0]).await.unwrap().unwrap();
        assert_eq!(fetched.dense_embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let store = InMemoryStore::new();
        store
            .insert(vec![
                item(vec![1.0, 0.0], json!({"content": "a"})),
                item(vec![0.0, 1.0], json!({"content": "b"})),
            ])
            .await
            .unwrap();
        let hits = store
            .search(SearchQuery {
                dense_vector: Some(vec![0.9, 0.1]),
                text: None,
                sparse_vector: None,
                limit: 2,
                filter: None,
            })
            .await
            .unwrap();
        assert_eq!(hits[0].payload.get("content").unwrap(), "a");
    }

    #[tokio::test]
    async fn delete_removes_from_list() {
        let store = InMemoryStore::new();
        let ids = store
            .insert(vec![item(vec![1.0], json!({"content": "x"}))])
            .await
            .unwrap();
        assert!(store.delete(ids[0]).await.unwrap());
        assert!(store.get(ids[0]).await.unwrap().is_none());
    }
}
