//! Brute-force cosine similarity over the dense-embedding column. Run in
//! parallel via `rayon` since the SQLite backend has no native vector index
//! (§4.3: "minimum... (c) dense-only embedded").

use rayon::prelude::*;

use powermem_core::memory::MemoryId;

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank every candidate by cosine similarity to `query`, descending, and
/// return at most `top_k` `(id, rank)` pairs (rank is 0-indexed, best first).
pub fn top_k(
    query: &[f32],
    candidates: &[(MemoryId, Vec<f32>)],
    top_k: usize,
) -> Vec<(MemoryId, usize)> {
    let mut scored: Vec<(MemoryId, f32)> = candidates
        .par_iter()
        .map(|(id, vec)| (*id, cosine(query, vec)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(rank, (id, _))| (id, rank))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn top_k_respects_limit_and_order() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            (MemoryId::new(1), vec![1.0, 0.0]),
            (MemoryId::new(2), vec![0.0, 1.0]),
            (MemoryId::new(3), vec![0.9, 0.1]),
        ];
        let ranked = top_k(&query, &candidates, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0.get(), 1);
        assert_eq!(ranked[1].0.get(), 3);
    }
}
