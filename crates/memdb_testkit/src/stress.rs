//! Stress tests for MemDB.
//!
//! These helpers drive a [`Database`] of [`Person`] objects under heavy
//! load and concurrent access. Concurrent readers also check that every
//! snapshot they see is internally consistent: the primary and email
//! indexes of a table always hold the same number of objects.

use crate::fixtures::{sample_person, Person, PEOPLE};
use memdb_core::{args, CoreResult, Database};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Objects written per write transaction.
    pub batch_size: usize,
    /// Number of distinct primary keys.
    pub object_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            batch_size: 8,
            object_count: 1_000,
        }
    }
}

fn tally(result: CoreResult<()>, successful: &mut usize, failed: &mut usize) {
    match result {
        Ok(()) => *successful += 1,
        Err(err) => {
            tracing::debug!(error = %err, "stress operation failed");
            *failed += 1;
        }
    }
}

fn write_batch(db: &Database<Person>, start: usize, config: &StressConfig) -> CoreResult<()> {
    let mut txn = db.txn(true);
    for j in 0..config.batch_size.max(1) {
        txn.insert(PEOPLE, sample_person((start + j) % config.object_count.max(1)))?;
    }
    txn.commit()
}

fn populate(db: &Database<Person>, config: &StressConfig) -> CoreResult<()> {
    let mut txn = db.txn(true);
    for i in 0..config.object_count {
        txn.insert(PEOPLE, sample_person(i))?;
    }
    txn.commit()
}

/// Populates the table; on failure returns a result holding the one failed
/// setup operation.
fn setup(db: &Database<Person>, config: &StressConfig) -> Option<StressTestResult> {
    let start = Instant::now();
    match populate(db, config) {
        Ok(()) => None,
        Err(err) => {
            tracing::warn!(error = %err, "stress setup failed");
            Some(StressTestResult::new(0, 1, start.elapsed()))
        }
    }
}

/// Reads one snapshot and checks that its indexes agree.
fn consistent_read(db: &Database<Person>, i: usize, config: &StressConfig) -> CoreResult<bool> {
    let txn = db.txn(false);
    let target = sample_person(i % config.object_count.max(1));
    txn.first(PEOPLE, "id", &args![target.id])?;
    let by_id = txn.get(PEOPLE, "id", &args![])?.count();
    let by_email = txn.get(PEOPLE, "email", &args![])?.count();
    Ok(by_id == by_email)
}

/// Run a sequential write stress test.
///
/// Each operation is one committed transaction of `batch_size` inserts.
pub fn stress_sequential_writes(db: &Database<Person>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let result = write_batch(db, i * config.batch_size, config);
        tally(result, &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a sequential read stress test.
pub fn stress_sequential_reads(db: &Database<Person>, config: &StressConfig) -> StressTestResult {
    if let Some(failed) = setup(db, config) {
        return failed;
    }

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let txn = db.txn(false);
        let target = sample_person(i % config.object_count.max(1));
        let result = txn.first(PEOPLE, "id", &args![target.id]).map(|_| ());
        tally(result, &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed read/write stress test.
pub fn stress_mixed_operations(db: &Database<Person>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let person = sample_person(i % config.object_count.max(1));
        let result = match i % 3 {
            // Write (33%)
            0 => {
                let mut txn = db.txn(true);
                txn.insert(PEOPLE, person).and_then(|()| txn.commit())
            }
            // Read (33%)
            1 => db
                .txn(false)
                .get(PEOPLE, "name", &args![person.name.as_str()])
                .map(|iter| {
                    iter.count();
                }),
            // Delete (33%)
            _ => {
                let mut txn = db.txn(true);
                txn.delete_all(PEOPLE, "id", &args![person.id])
                    .and_then(|_| txn.commit())
            }
        };
        tally(result, &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run concurrent readers against one continuous writer.
///
/// Reads that observe an inconsistent snapshot count as failures.
pub fn stress_concurrent_reads(
    db: Arc<Database<Person>>,
    config: &StressConfig,
) -> StressTestResult {
    if let Some(failed) = setup(&db, config) {
        return failed;
    }

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let writer = {
        let db = Arc::clone(&db);
        let stop = Arc::clone(&stop);
        let config = config.clone();
        thread::spawn(move || {
            let mut i = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let mut txn = db.txn(true);
                let victim = sample_person(i % config.object_count.max(1));
                let result = txn
                    .delete_all(PEOPLE, "id", &args![victim.id])
                    .and_then(|_| txn.insert(PEOPLE, victim))
                    .and_then(|()| txn.commit());
                if let Err(err) = result {
                    tracing::warn!(error = %err, "stress writer failed");
                }
                i += 1;
            }
            i
        })
    };

    let readers: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let config = config.clone();

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    match consistent_read(&db, t * ops_per_thread + i, &config) {
                        Ok(true) => successful.fetch_add(1, Ordering::Relaxed),
                        Ok(false) | Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in readers {
        if handle.join().is_err() {
            failed.fetch_add(1, Ordering::Relaxed);
        }
    }
    stop.store(true, Ordering::Relaxed);
    let commits = writer.join().unwrap_or(0);
    tracing::debug!(commits, "stress writer finished");

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run concurrent writers; each operation is one committed batch.
///
/// Writers are serialized by the database, so every batch should succeed.
pub fn stress_concurrent_writes(
    db: Arc<Database<Person>>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let config = config.clone();

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let batch_start = (t * ops_per_thread + i) * config.batch_size;
                    match write_batch(&db, batch_start, &config) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{person_schema, TestDatabase};

    fn small() -> StressConfig {
        StressConfig {
            operations: 200,
            threads: 4,
            batch_size: 4,
            object_count: 50,
        }
    }

    #[test]
    fn sequential_writes() {
        let db = TestDatabase::new();
        let result = stress_sequential_writes(&db, &small());
        assert_eq!(result.successful_ops, 200);
        assert_eq!(db.all(PEOPLE).len(), 50);
    }

    #[test]
    fn sequential_reads() {
        let db = TestDatabase::new();
        let result = stress_sequential_reads(&db, &small());
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn mixed_operations() {
        let db = TestDatabase::new();
        let result = stress_mixed_operations(&db, &small());
        assert_eq!(result.total_ops, 200);
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn concurrent_reads_see_consistent_snapshots() {
        let db = Arc::new(TestDatabase::new().db);
        let result = stress_concurrent_reads(Arc::clone(&db), &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 200);
    }

    #[test]
    fn failed_setup_is_reported_once() {
        let mut schema = person_schema();
        schema.tables.remove(PEOPLE);
        let db = Database::new(schema).unwrap();

        let result = stress_sequential_reads(&db, &small());
        assert_eq!((result.successful_ops, result.failed_ops), (0, 1));

        let result = stress_concurrent_reads(Arc::new(db), &small());
        assert_eq!((result.successful_ops, result.failed_ops), (0, 1));
    }

    #[test]
    fn concurrent_writes() {
        let db = Arc::new(TestDatabase::new().db);
        let result = stress_concurrent_writes(Arc::clone(&db), &small());
        assert_eq!(result.successful_ops, 200);
        assert_eq!(db.stats().commits(), 200);
    }
}
