//! Database statistics and telemetry.
//!
//! Counters are updated with relaxed atomics, so reading them never blocks a
//! writer. A snapshot database gets fresh counters of its own.

use std::sync::atomic::{AtomicU64, Ordering};

/// Database statistics.
///
/// # Thread Safety
///
/// All counters are atomic and can be safely read from multiple threads.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    read_txns: AtomicU64,
    write_txns: AtomicU64,
    commits: AtomicU64,
    aborts: AtomicU64,
    inserts: AtomicU64,
    deletes: AtomicU64,
    lookups: AtomicU64,
    iterators: AtomicU64,
}

impl DatabaseStats {
    /// Creates a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_txn(&self, write: bool) {
        if write {
            self.write_txns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.read_txns.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_iterator(&self) {
        self.iterators.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of read transactions started.
    pub fn read_txns(&self) -> u64 {
        self.read_txns.load(Ordering::Relaxed)
    }

    /// Returns the number of write transactions started.
    pub fn write_txns(&self) -> u64 {
        self.write_txns.load(Ordering::Relaxed)
    }

    /// Returns the number of committed write transactions.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Returns the number of aborted write transactions.
    ///
    /// Includes write transactions dropped without a commit.
    pub fn aborts(&self) -> u64 {
        self.aborts.load(Ordering::Relaxed)
    }

    /// Returns the number of objects inserted or updated.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns the number of objects deleted.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of single-object lookups (`first`/`last`).
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Returns the number of result iterators handed out.
    pub fn iterators(&self) -> u64 {
        self.iterators.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            read_txns: self.read_txns(),
            write_txns: self.write_txns(),
            commits: self.commits(),
            aborts: self.aborts(),
            inserts: self.inserts(),
            deletes: self.deletes(),
            lookups: self.lookups(),
            iterators: self.iterators(),
        }
    }
}

/// A point-in-time copy of [`DatabaseStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Read transactions started.
    pub read_txns: u64,
    /// Write transactions started.
    pub write_txns: u64,
    /// Committed write transactions.
    pub commits: u64,
    /// Aborted write transactions.
    pub aborts: u64,
    /// Objects inserted or updated.
    pub inserts: u64,
    /// Objects deleted.
    pub deletes: u64,
    /// Single-object lookups.
    pub lookups: u64,
    /// Result iterators handed out.
    pub iterators: u64,
}
