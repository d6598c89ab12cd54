//! Database operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memdb_bench::utils::{populated_db, random_people};
use memdb_core::{args, Database, FilterIterator};
use memdb_testkit::{person_schema, Person, PEOPLE};
use std::sync::Arc;

/// Benchmark single object inserts, one transaction each.
fn bench_single_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_insert");

    for populated in [0, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(populated),
            populated,
            |b, &populated| {
                let db = populated_db(&random_people(populated));
                let people = random_people(1_000);
                let mut next = people.iter().cycle();

                b.iter(|| {
                    let person = next.next().cloned().unwrap();
                    let mut txn = db.txn(true);
                    txn.insert(PEOPLE, black_box(person)).unwrap();
                    txn.commit().unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark batch inserts in a single transaction.
fn bench_batch_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_insert");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let db = Database::new(person_schema()).unwrap();
                let people: Vec<Arc<Person>> =
                    random_people(batch_size).into_iter().map(Arc::new).collect();

                b.iter(|| {
                    let mut txn = db.txn(true);
                    for person in &people {
                        txn.insert(PEOPLE, Arc::clone(person)).unwrap();
                    }
                    txn.commit().unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark primary key lookups.
fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for count in [100, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("id", count), count, |b, &count| {
            let people = random_people(count);
            let db = populated_db(&people);
            let mut ids = people.iter().map(|p| p.id).cycle();

            b.iter(|| {
                let txn = db.txn(false);
                let found = txn.first(PEOPLE, "id", &args![ids.next().unwrap()]).unwrap();
                black_box(found);
            });
        });

        group.bench_with_input(BenchmarkId::new("email", count), count, |b, &count| {
            let people = random_people(count);
            let db = populated_db(&people);
            let mut emails = people.iter().map(|p| p.email.clone()).cycle();

            b.iter(|| {
                let txn = db.txn(false);
                let email = emails.next().unwrap();
                let found = txn.first(PEOPLE, "email", &args![email]).unwrap();
                black_box(found);
            });
        });
    }
    group.finish();
}

/// Benchmark full and filtered index scans.
fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");

    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("age", count), count, |b, &count| {
            let db = populated_db(&random_people(count));

            b.iter(|| {
                let txn = db.txn(false);
                black_box(txn.get(PEOPLE, "age", &args![]).unwrap().count());
            });
        });

        group.bench_with_input(BenchmarkId::new("filtered", count), count, |b, &count| {
            let db = populated_db(&random_people(count));

            b.iter(|| {
                let txn = db.txn(false);
                let iter = txn.lower_bound(PEOPLE, "age", &args![50]).unwrap();
                let adults = FilterIterator::new(iter, |p: &Arc<Person>| p.tags.is_empty());
                black_box(adults.count());
            });
        });
    }
    group.finish();
}

/// Benchmark taking a snapshot and writing to it.
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let db = populated_db(&random_people(10_000));
    let people = random_people(1);

    group.bench_function("take", |b| {
        b.iter(|| black_box(db.snapshot()));
    });

    group.bench_function("take_and_write", |b| {
        b.iter(|| {
            let snapshot = db.snapshot();
            {
                let mut txn = snapshot.txn(true);
                txn.insert(PEOPLE, people[0].clone()).unwrap();
                txn.commit().unwrap();
            }
            black_box(snapshot);
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_insert,
    bench_batch_insert,
    bench_lookup,
    bench_iteration,
    bench_snapshot,
);

criterion_main!(benches);
