//! TrafficSplit Benchmarks
//!
//! - Quota table derivation for growing target counts
//! - Full allocation rounds against the in-memory store

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use trafficsplit_engine::{Allocator, InMemoryCounterStore, QuotaTable, RatioConfig};

/// Ratio map with `n` targets over mixed denominators
fn ratios(n: usize) -> RatioConfig {
    let denominators = [2u64, 3, 4, 5, 6, 8, 10, 12];
    RatioConfig::parse((0..n).map(|i| {
        let d = denominators[i % denominators.len()];
        (format!("target-{}", i), format!("1/{}", d))
    }))
    .expect("valid ratios")
}

fn bench_quota_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("quota_table");

    for n in [2usize, 8, 32, 128].iter() {
        let cfg = ratios(*n);
        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::new("build", n), &cfg, |b, cfg| {
            b.iter(|| QuotaTable::build(black_box(cfg)).expect("quota table"));
        });
    }

    group.finish();
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    for n in [3usize, 16, 64].iter() {
        let store = Arc::new(InMemoryCounterStore::new());
        let allocator = Allocator::new(store, ratios(*n)).expect("allocator");

        group.bench_with_input(BenchmarkId::new("in_memory", n), n, |b, _| {
            b.iter(|| {
                rt.block_on(allocator.allocate(black_box("bench")))
                    .expect("decision")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_quota_table, bench_allocate);
criterion_main!(benches);
