//! Persistent tree benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memdb_bench::utils::random_keys;
use memdb_tree::Tree;

fn build(keys: &[Vec<u8>]) -> Tree<usize> {
    let mut txn = Tree::new().txn();
    for (i, key) in keys.iter().enumerate() {
        txn.insert(key, i);
    }
    txn.commit()
}

/// Benchmark bulk loading inside one tree transaction.
fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_bulk_insert");

    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let keys = random_keys(count, 12);
            b.iter(|| black_box(build(&keys)));
        });
    }
    group.finish();
}

/// Benchmark single persistent inserts, each producing a new root.
fn bench_persistent_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_persistent_insert");

    for count in [1_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let tree = build(&random_keys(count, 12));
            let extra = random_keys(1, 12).remove(0);
            b.iter(|| black_box(tree.insert(&extra, 0)));
        });
    }
    group.finish();
}

/// Benchmark point reads and ordered seeks.
fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_reads");
    let keys = random_keys(10_000, 12);
    let tree = build(&keys);
    let mut cycle = keys.iter().cycle();

    group.bench_function("get", |b| {
        b.iter(|| black_box(tree.get(cycle.next().unwrap())));
    });

    group.bench_function("lower_bound_10", |b| {
        b.iter(|| {
            let start = cycle.next().unwrap();
            black_box(tree.seek_lower_bound(start).take(10).count())
        });
    });

    group.bench_function("prefix_scan", |b| {
        b.iter(|| {
            let (_, iter) = tree.seek_prefix(b"m");
            black_box(iter.count())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_bulk_insert, bench_persistent_insert, bench_reads);

criterion_main!(benches);
