//! Transactions.
//!
//! A [`Txn`] reads from the root it captured when it was opened. Write
//! transactions additionally hold the database's writer lock and keep one
//! private [`TreeTxn`] per index they touch; nothing they do is visible to
//! anyone else until [`Txn::commit`] publishes a new root.

mod read;
mod write;

pub use read::PREFIX_SUFFIX;

use crate::changes::{ChangeLog, Changes};
use crate::database::{Database, IndexTree, RootTree};
use crate::error::{CoreError, CoreResult};
use memdb_tree::TreeTxn;
use parking_lot::MutexGuard;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// A read or write transaction over a [`Database`].
///
/// Dropping an active write transaction aborts it and releases the writer
/// lock.
pub struct Txn<'db, T> {
    db: &'db Database<T>,
    write: bool,
    state: TxnState,
    root: Arc<RootTree<T>>,
    modified: BTreeMap<Vec<u8>, TreeTxn<Arc<T>>>,
    changes: Option<ChangeLog<T>>,
    deferred: Vec<Box<dyn FnOnce() + 'db>>,
    guard: Option<MutexGuard<'db, ()>>,
}

impl<'db, T> Txn<'db, T> {
    pub(crate) fn read(db: &'db Database<T>, root: Arc<RootTree<T>>) -> Self {
        tracing::trace!(write = false, "transaction opened");
        Self {
            db,
            write: false,
            state: TxnState::Active,
            root,
            modified: BTreeMap::new(),
            changes: None,
            deferred: Vec::new(),
            guard: None,
        }
    }

    pub(crate) fn write(
        db: &'db Database<T>,
        root: Arc<RootTree<T>>,
        guard: MutexGuard<'db, ()>,
    ) -> Self {
        tracing::trace!(write = true, "transaction opened");
        Self {
            db,
            write: true,
            state: TxnState::Active,
            root,
            modified: BTreeMap::new(),
            changes: db.config().track_changes.then(ChangeLog::new),
            deferred: Vec::new(),
            guard: Some(guard),
        }
    }

    /// True for write transactions.
    pub fn is_write(&self) -> bool {
        self.write
    }

    /// Returns the current state.
    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Enables change tracking for this transaction.
    ///
    /// Only needed when the database was configured without it.
    pub fn track_changes(&mut self) {
        if self.changes.is_none() {
            self.changes = Some(ChangeLog::new());
        }
    }

    /// Returns the changes made so far, or `None` when tracking is off.
    ///
    /// Still available after a successful commit.
    pub fn changes(&self) -> Option<Changes<T>> {
        self.changes.as_ref().map(ChangeLog::changes)
    }

    /// Registers `f` to run after a successful commit.
    ///
    /// Deferred functions run in reverse registration order once the new
    /// root is visible and the writer lock is released. They are discarded
    /// on abort.
    pub fn defer(&mut self, f: impl FnOnce() + 'db) {
        self.deferred.push(Box::new(f));
    }

    /// Publishes all changes made by this write transaction.
    ///
    /// A no-op for read transactions.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        if !self.write {
            return Ok(());
        }

        let modified = std::mem::take(&mut self.modified);
        let mut root = self.root.txn();
        root.track_mutate(self.db.is_primary());
        for (path, index) in &modified {
            root.insert(path, index.commit_only());
        }
        let new_root = root.commit_only();
        self.db.publish(new_root.clone());
        self.root = Arc::new(new_root);

        // Readers woken by these channels must already see the new root.
        for (_, mut index) in modified {
            index.notify();
        }
        root.notify();

        self.state = TxnState::Committed;
        self.guard = None;
        self.db.stats().record_commit();
        tracing::debug!(
            changes = self.changes.as_ref().map_or(0, |c| c.changes().len()),
            deferred = self.deferred.len(),
            "write transaction committed"
        );

        while let Some(f) = self.deferred.pop() {
            f();
        }
        Ok(())
    }

    /// Discards all changes made by this write transaction.
    ///
    /// A no-op for read transactions.
    pub fn abort(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        if !self.write {
            return Ok(());
        }

        let touched = self.modified.len();
        self.modified.clear();
        self.changes = None;
        self.deferred.clear();
        self.state = TxnState::Aborted;
        self.guard = None;
        self.db.stats().record_abort();
        tracing::debug!(indexes = touched, "write transaction aborted");
        Ok(())
    }

    /// Returns a read transaction over this transaction's current state,
    /// including uncommitted changes.
    pub fn snapshot(&self) -> CoreResult<Txn<'db, T>> {
        self.ensure_active()?;
        if self.modified.is_empty() {
            return Ok(Txn::read(self.db, Arc::clone(&self.root)));
        }
        let mut root = self.root.txn();
        root.track_mutate(false);
        for (path, index) in &self.modified {
            root.insert(path, index.commit_only());
        }
        Ok(Txn::read(self.db, Arc::new(root.commit_only())))
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TxnState::Active => Ok(()),
            TxnState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TxnState::Aborted => Err(CoreError::invalid_operation("transaction already aborted")),
        }
    }

    fn ensure_write(&self) -> CoreResult<()> {
        self.ensure_active()?;
        if self.write {
            Ok(())
        } else {
            Err(CoreError::ReadOnlyTransaction)
        }
    }

    /// Returns the index tree as this transaction sees it.
    fn readable_index(&self, table: &str, index: &str) -> CoreResult<IndexTree<T>> {
        let path = crate::database::index_path(table, index);
        if let Some(txn) = self.modified.get(&path) {
            return Ok(txn.root());
        }
        self.root
            .get(&path)
            .cloned()
            .ok_or_else(|| CoreError::index_not_found(table, index))
    }

    /// Returns the private handle for an index, opening it on first use.
    fn writable_index(&mut self, table: &str, index: &str) -> CoreResult<&mut TreeTxn<Arc<T>>> {
        let path = crate::database::index_path(table, index);
        match self.modified.entry(path) {
            std::collections::btree_map::Entry::Occupied(entry) => Ok(entry.into_mut()),
            std::collections::btree_map::Entry::Vacant(entry) => {
                let tree = self
                    .root
                    .get(entry.key())
                    .ok_or_else(|| CoreError::index_not_found(table, index))?;
                let mut txn = tree.txn();
                txn.track_mutate(self.db.is_primary());
                tracing::trace!(table, index, "index opened for writing");
                Ok(entry.insert(txn))
            }
        }
    }
}

impl<T> Drop for Txn<'_, T> {
    fn drop(&mut self) {
        if self.write && self.state == TxnState::Active {
            tracing::debug!("write transaction dropped while active");
            let _ = self.abort();
        }
    }
}

impl<T> fmt::Debug for Txn<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Txn")
            .field("write", &self.write)
            .field("state", &self.state)
            .field("modified", &self.modified.len())
            .finish()
    }
}
