//! Cross-store RRF fusion benchmarks (§4.8 step 4).

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::Map;

use powermem_core::memory::MemoryId;
use powermem_core::traits::{DebugRanks, Hit};
use powermem_retrieval::fusion::fuse_cross_store;

fn make_hits(n: usize, reversed: bool) -> Vec<Hit> {
    (0..n)
        .map(|i| {
            let id = if reversed { n - 1 - i } else { i };
            Hit {
                id: MemoryId(id as i64),
                payload: Map::new(),
                score: 0.0,
                debug_ranks: DebugRanks::default(),
            }
        })
        .collect()
}

fn bench_fuse(c: &mut Criterion, n: usize, label: &str) {
    let list_a = make_hits(n, false);
    let list_b = make_hits(n, true);

    c.bench_function(label, |b| {
        b.iter(|| {
            fuse_cross_store(&[list_a.clone(), list_b.clone()], &[1.0, 1.0], 60.0);
        });
    });
}

fn fusion_benchmarks(c: &mut Criterion) {
    bench_fuse(c, 100, "cross_store_rrf_fusion_100");
    bench_fuse(c, 10_000, "cross_store_rrf_fusion_10k");
}

criterion_group!(benches, fusion_benchmarks);
criterion_main!(benches);
