//! Cross-store RRF fusion (§4.8 step 4), structurally the same math as
//! `powermem-storage::rrf` but over whole-store result lists instead of
//! per-channel ones within a single store.

use std::collections::HashMap;

use serde_json::{Map, Value};

use powermem_core::memory::MemoryId;
use powermem_core::traits::{DebugRanks, Hit};

/// One store's contribution to a fused hit: which rank it held in that
/// store's own result list and the per-channel ranks that produced it.
#[derive(Debug, Clone)]
pub struct StoreContribution {
    pub store_index: usize,
    pub rank: usize,
    pub weight: f64,
    pub debug_ranks: DebugRanks,
}

#[derive(Debug, Clone)]
pub struct FusionInfo {
    pub contributions: Vec<StoreContribution>,
    pub method: &'static str,
}

#[derive(Debug, Clone)]
pub struct FusedHit {
    pub id: MemoryId,
    pub payload: Map<String, Value>,
    pub score: f64,
    pub fusion_info: FusionInfo,
}

/// Fuses `lists[i]` (already ranked by `stores[i].search(...)`) with equal
/// weight per store by default (§4.8 step 4: "equal store weights"),
/// deduped by id. Result is sorted descending by fused score; ties break by
/// `updated_at` desc then `id` desc (§4.8 "Tie-breaking").
pub fn fuse_cross_store(lists: &[Vec<Hit>], weights: &[f64], k: f64) -> Vec<FusedHit> {
    let mut scores: HashMap<MemoryId, f64> = HashMap::new();
    let mut payloads: HashMap<MemoryId, Map<String, Value>> = HashMap::new();
    let mut contributions: HashMap<MemoryId, Vec<StoreContribution>> = HashMap::new();

    for (store_index, list) in lists.iter().enumerate() {
        let weight = weights.get(store_index).copied().unwrap_or(1.0);
        for (i, hit) in list.iter().enumerate() {
            let rank = i + 1;
            *scores.entry(hit.id).or_insert(0.0) += weight / (k + rank as f64);
            payloads.entry(hit.id).or_insert_with(|| hit.payload.clone());
            contributions.entry(hit.id).or_default().push(StoreContribution {
                store_index,
                rank,
                weight,
                debug_ranks: hit.debug_ranks.clone(),
            });
        }
    }

    let mut fused: Vec<FusedHit> = scores
        .into_iter()
        .map(|(id, score)| FusedHit {
            id,
            payload: payloads.remove(&id).unwrap_or_default(),
            score,
            fusion_info: FusionInfo {
                contributions: contributions.remove(&id).unwrap_or_default(),
                method: "rrf",
            },
        })
        .collect();

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| updated_at(&b.payload).cmp(&updated_at(&a.payload)))
            .then_with(|| b.id.cmp(&a.id))
    });

    fused
}

fn updated_at(payload: &Map<String, Value>) -> String {
    payload
        .get("updated_at")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(id: i64, rank_payload: Value) -> Hit {
        Hit {
            id: MemoryId(id),
            payload: rank_payload.as_object().cloned().unwrap_or_default(),
            score: 0.0,
            debug_ranks: DebugRanks::default(),
        }
    }

    #[test]
    fn fusion_is_monotonically_decreasing() {
        let list_a = vec![hit(1, json!({})), hit(2, json!({})), hit(3, json!({}))];
        let list_b = vec![hit(2, json!({})), hit(1, json!({}))];
        let fused = fuse_cross_store(&[list_a, list_b], &[1.0, 1.0], 60.0);
        assert!(fused.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn id_appearing_in_both_lists_outranks_single_list_hit() {
        let list_a = vec![hit(1, json!({})), hit(2, json!({}))];
        let list_b = vec![hit(1, json!({})), hit(3, json!({}))];
        let fused = fuse_cross_store(&[list_a, list_b], &[1.0, 1.0], 60.0);
        assert_eq!(fused[0].id, MemoryId(1));
    }

    #[test]
    fn empty_lists_fuse_to_nothing() {
        let fused = fuse_cross_store(&[vec![], vec![]], &[1.0, 1.0], 60.0);
        assert!(fused.is_empty());
    }
}
