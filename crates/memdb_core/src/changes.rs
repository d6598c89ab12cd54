//! Change tracking for write transactions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A single object-level change made by a write transaction.
///
/// `before` is the committed state when the transaction first touched the
/// object, `after` the state it left behind.
pub struct Change<T> {
    /// Table the object belongs to.
    pub table: String,
    /// Object before the transaction, if it existed.
    pub before: Option<Arc<T>>,
    /// Object after the transaction, if it still exists.
    pub after: Option<Arc<T>>,
    primary_key: Vec<u8>,
}

impl<T> Change<T> {
    /// True if the object did not exist before.
    pub fn created(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    /// True if the object existed before and still does.
    pub fn updated(&self) -> bool {
        self.before.is_some() && self.after.is_some()
    }

    /// True if the object existed before and no longer does.
    pub fn deleted(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }

    /// Primary key of the changed object.
    pub fn primary_key(&self) -> &[u8] {
        &self.primary_key
    }
}

impl<T> Clone for Change<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            primary_key: self.primary_key.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Change<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Change")
            .field("table", &self.table)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}

/// Changes in the order each object was first touched.
pub type Changes<T> = Vec<Change<T>>;

/// Per-transaction change log, one entry per `(table, primary key)`.
pub(crate) struct ChangeLog<T> {
    entries: Vec<Change<T>>,
    positions: HashMap<(String, Vec<u8>), usize>,
}

impl<T> ChangeLog<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Records a write. A repeated write to the same object keeps the
    /// original `before` and replaces `after`.
    pub(crate) fn record(
        &mut self,
        table: &str,
        primary_key: &[u8],
        before: Option<Arc<T>>,
        after: Option<Arc<T>>,
    ) {
        let slot = (table.to_string(), primary_key.to_vec());
        match self.positions.get(&slot) {
            Some(&pos) => self.entries[pos].after = after,
            None => {
                self.positions.insert(slot, self.entries.len());
                self.entries.push(Change {
                    table: table.to_string(),
                    before,
                    after,
                    primary_key: primary_key.to_vec(),
                });
            }
        }
    }

    /// Returns the net changes. Objects created and deleted again within the
    /// transaction are left out.
    pub(crate) fn changes(&self) -> Changes<T> {
        self.entries
            .iter()
            .filter(|c| c.before.is_some() || c.after.is_some())
            .cloned()
            .collect()
    }
}
