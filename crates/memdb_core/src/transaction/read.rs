//! Index queries.

use super::Txn;
use crate::database::IndexTree;
use crate::error::{CoreError, CoreResult};
use crate::index::Arg;
use crate::iterator::IndexIterator;
use crate::schema::IndexSchema;
use memdb_tree::WatchCh;
use std::sync::Arc;

/// Suffix that turns an index name into its prefix-query form.
pub const PREFIX_SUFFIX: &str = "_prefix";

/// A resolved query: which index to read and the key derived from the args.
pub(super) struct Lookup<'a, T> {
    pub(super) name: &'a str,
    pub(super) schema: &'a IndexSchema<T>,
    pub(super) key: Vec<u8>,
    pub(super) prefix: bool,
}

impl<T> Lookup<'_, T> {
    /// True when the key addresses exactly one tree entry.
    fn is_exact(&self) -> bool {
        !self.prefix && !self.key.is_empty() && !stores_compound_keys(self.schema)
    }
}

/// Indexes that may hold several objects per derived key append the primary
/// key to every stored key.
pub(super) fn stores_compound_keys<T>(index: &IndexSchema<T>) -> bool {
    !index.unique || !index.indexer.is_single()
}

impl<'db, T> Txn<'db, T> {
    /// Resolves `index` (possibly with the `_prefix` suffix) and derives the
    /// query key. Empty `args` yield an empty key, which covers the whole
    /// index.
    pub(super) fn lookup(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<Lookup<'db, T>> {
        let db = self.db;
        let table_schema = db
            .schema()
            .get(table)
            .ok_or_else(|| CoreError::table_not_found(table))?;

        let (name, prefix) = match index.strip_suffix(PREFIX_SUFFIX) {
            Some(base) if !table_schema.indexes.contains_key(index) => (base, true),
            _ => (index, false),
        };
        let (name, schema) = table_schema
            .indexes
            .get_key_value(name)
            .ok_or_else(|| CoreError::index_not_found(table, name))?;

        let key = if args.is_empty() {
            Vec::new()
        } else if prefix {
            schema
                .indexer
                .prefix_from_args(args)
                .ok_or_else(|| CoreError::PrefixNotSupported {
                    index: name.clone(),
                })??
        } else {
            schema.indexer.from_args(args)?
        };

        Ok(Lookup {
            name: name.as_str(),
            schema,
            key,
            prefix,
        })
    }

    fn lookup_tree(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<(Lookup<'db, T>, IndexTree<T>)> {
        self.ensure_active()?;
        let lookup = self.lookup(table, index, args)?;
        let tree = self.readable_index(table, lookup.name)?;
        Ok((lookup, tree))
    }

    /// Returns the first object matching the query, or `None`.
    pub fn first(&self, table: &str, index: &str, args: &[Arg]) -> CoreResult<Option<Arc<T>>> {
        Ok(self.first_watch(table, index, args)?.1)
    }

    /// Like [`first`](Self::first), also returning a channel that fires when
    /// the result may have changed.
    pub fn first_watch(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<(WatchCh, Option<Arc<T>>)> {
        let (lookup, tree) = self.lookup_tree(table, index, args)?;
        self.db.stats().record_lookup();

        if lookup.is_exact() {
            let (watch, value) = tree.get_watch(&lookup.key);
            return Ok((watch, value.cloned()));
        }
        let (watch, mut iter) = tree.seek_prefix(&lookup.key);
        Ok((watch, iter.next().map(|leaf| Arc::clone(leaf.value()))))
    }

    /// Returns the last object matching the query, or `None`.
    pub fn last(&self, table: &str, index: &str, args: &[Arg]) -> CoreResult<Option<Arc<T>>> {
        Ok(self.last_watch(table, index, args)?.1)
    }

    /// Like [`last`](Self::last), also returning a watch channel.
    pub fn last_watch(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<(WatchCh, Option<Arc<T>>)> {
        let (lookup, tree) = self.lookup_tree(table, index, args)?;
        self.db.stats().record_lookup();

        if lookup.is_exact() {
            let (watch, value) = tree.get_watch(&lookup.key);
            return Ok((watch, value.cloned()));
        }
        let (watch, mut iter) = tree.seek_prefix_rev(&lookup.key);
        Ok((watch, iter.next().map(|leaf| Arc::clone(leaf.value()))))
    }

    /// Iterates, in key order, over every object whose key starts with the
    /// key derived from `args`.
    pub fn get(&self, table: &str, index: &str, args: &[Arg]) -> CoreResult<IndexIterator<T>> {
        let (lookup, tree) = self.lookup_tree(table, index, args)?;
        self.db.stats().record_iterator();
        let (watch, iter) = tree.seek_prefix(&lookup.key);
        Ok(IndexIterator::forward(iter, watch))
    }

    /// Like [`get`](Self::get), in descending key order.
    pub fn get_reverse(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<IndexIterator<T>> {
        let (lookup, tree) = self.lookup_tree(table, index, args)?;
        self.db.stats().record_iterator();
        let (watch, iter) = tree.seek_prefix_rev(&lookup.key);
        Ok(IndexIterator::reverse(iter, watch))
    }

    /// Iterates in ascending order from the first key `>=` the derived key
    /// to the end of the index.
    ///
    /// The watch channel covers the whole index.
    pub fn lower_bound(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<IndexIterator<T>> {
        let (lookup, tree) = self.lookup_tree(table, index, args)?;
        self.db.stats().record_iterator();
        let iter = tree.seek_lower_bound(&lookup.key);
        Ok(IndexIterator::forward(iter, tree.root_watch()))
    }

    /// Iterates in descending order from the last key `<=` the derived key
    /// to the start of the index. On non-unique and multi-value indexes the
    /// objects stored under the derived key itself are included.
    ///
    /// The watch channel covers the whole index.
    pub fn reverse_lower_bound(
        &self,
        table: &str,
        index: &str,
        args: &[Arg],
    ) -> CoreResult<IndexIterator<T>> {
        let (lookup, tree) = self.lookup_tree(table, index, args)?;
        self.db.stats().record_iterator();
        let watch = tree.root_watch();
        if lookup.key.is_empty() {
            return Ok(IndexIterator::reverse(tree.iter_rev(), watch));
        }
        let below = tree.seek_reverse_lower_bound(&lookup.key);
        if !stores_compound_keys(lookup.schema) {
            return Ok(IndexIterator::reverse(below, watch));
        }
        // Stored keys carry a primary key suffix, so entries for the derived
        // key itself sort above it.
        let (_, equal) = tree.seek_prefix_rev(&lookup.key);
        Ok(IndexIterator::reverse_chain(equal, below, watch))
    }
}
