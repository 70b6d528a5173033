// Continuity scan benchmarks.
//
// Covers the pure link comparison and full scans over in-memory archives of
// increasing length, with and without breaks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rollcheck::scan::{compare_link, ContinuityScanner, GapPolicy};
use rollcheck::storage::{Block, MemoryBlockStore};
use rollcheck::ScanConfig;

fn hash_of(n: u64) -> Vec<u8> {
    blake3::hash(&n.to_be_bytes()).as_bytes().to_vec()
}

/// Linked archive of `len` blocks starting at 1. Every `break_every`-th
/// block gets a foreign parent hash when non-zero.
fn archive(len: u64, break_every: u64) -> MemoryBlockStore {
    MemoryBlockStore::from_blocks((1..=len).map(|n| {
        let parent_hash = if break_every != 0 && n % break_every == 0 {
            vec![0xEE; 32]
        } else {
            hash_of(n - 1)
        };
        Block::new(n, hash_of(n), parent_hash)
    }))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime")
}

fn bench_compare_link(c: &mut Criterion) {
    let parent = Block::new(41, hash_of(41), hash_of(40));
    let child = Block::new(42, hash_of(42), hash_of(41));
    let forked = Block::new(42, hash_of(42), vec![0xEE; 32]);

    c.bench_function("scan/compare_link_ok", |b| {
        b.iter(|| compare_link(42, Some(&child), Some(&parent), GapPolicy::Skip));
    });
    c.bench_function("scan/compare_link_break", |b| {
        b.iter(|| compare_link(42, Some(&forked), Some(&parent), GapPolicy::Skip));
    });
}

fn bench_full_scan(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("scan/memory");

    for len in [1_000u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(len - 1));

        let clean = ContinuityScanner::new(archive(len, 0), ScanConfig::default());
        group.bench_with_input(BenchmarkId::new("clean", len), &len, |b, _| {
            b.iter(|| rt.block_on(clean.scan(&mut ())).unwrap());
        });

        let broken = ContinuityScanner::new(archive(len, 100), ScanConfig::default());
        group.bench_with_input(BenchmarkId::new("break_every_100", len), &len, |b, _| {
            b.iter(|| rt.block_on(broken.scan(&mut ())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compare_link, bench_full_scan);
criterion_main!(benches);
