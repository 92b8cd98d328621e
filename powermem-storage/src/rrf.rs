//! Reciprocal Rank Fusion for a single store's channels (§4.3 steps 4-6):
//! `rrf(id) = w_v/(k+rank_v) + w_f/(k+rank_f) + w_s/(k+rank_s)`.
//!
//! Cross-store fusion (§4.5) reuses the same math one level up in
//! `powermem-retrieval`; this copy stays store-local so a single backend can
//! fuse its dense/fulltext/sparse channels without depending on the
//! retrieval crate (which depends on storage, not the other way around).

use std::collections::HashMap;

use powermem_core::memory::MemoryId;
use powermem_core::traits::DebugRanks;

pub struct ChannelWeights {
    pub dense: f64,
    pub fulltext: f64,
    pub sparse: f64,
}

/// Each channel is a list of `(id, rank)` pairs, 0-indexed, best first.
/// Returns fused `(id, score, debug_ranks)` sorted descending by score.
pub fn fuse(
    dense: Option<&[(MemoryId, usize)]>,
    fulltext: Option<&[(MemoryId, usize)]>,
    sparse: Option<&[(MemoryId, usize)]>,
    weights: &ChannelWeights,
    k: f64,
) -> Vec<(MemoryId, f64, DebugRanks)> {
    let mut scores: HashMap<MemoryId, (f64, DebugRanks)> = HashMap::new();

    if let Some(list) = dense {
        for &(id, rank) in list {
            let entry = scores.entry(id).or_insert((0.0, DebugRanks::default()));
            entry.0 += weights.dense / (k + rank as f64);
            entry.1.dense_rank = Some(rank);
        }
    }
    if let Some(list) = fulltext {
        for &(id, rank) in list {
            let entry = scores.entry(id).or_insert((0.0, DebugRanks::default()));
            entry.0 += weights.fulltext / (k + rank as f64);
            entry.1.fulltext_rank = Some(rank);
        }
    }
    if let Some(list) = sparse {
        for &(id, rank) in list {
            let entry = scores.entry(id).or_insert((0.0, DebugRanks::default()));
            entry.0 += weights.sparse / (k + rank as f64);
            entry.1.sparse_rank = Some(rank);
        }
    }

    let mut fused: Vec<_> = scores.into_iter().map(|(id, (score, ranks))| (id, score, ranks)).collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_is_monotonically_decreasing() {
        let dense: Vec<(MemoryId, usize)> = (0..20).map(|i| (MemoryId::new(i), i as usize)).collect();
        let fulltext: Vec<(MemoryId, usize)> = (0..20)
            .rev()
            .map(|i| (MemoryId::new(i), (19 - i) as usize))
            .collect();
        let weights = ChannelWeights {
            dense: 1.0,
            fulltext: 1.0,
            sparse: 1.0,
        };
        let fused = fuse(Some(&dense), Some(&fulltext), None, &weights, 60.0);
        for window in fused.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn single_channel_preserves_order() {
        let dense: Vec<(MemoryId, usize)> = (0..5).map(|i| (MemoryId::new(i), i as usize)).collect();
        let weights = ChannelWeights {
            dense: 1.0,
            fulltext: 1.0,
            sparse: 1.0,
        };
        let fused = fuse(Some(&dense), None, None, &weights, 60.0);
        let order: Vec<i64> = fused.iter().map(|(id, _, _)| id.get()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
