//! Published tree versions and their transactional handles.

use crate::iter::{Iter, ReverseIter};
use crate::node::{longest_prefix, Leaf, Node};
use crate::watch::WatchCh;
use std::fmt;
use std::sync::Arc;

/// An immutable version of a radix tree.
///
/// Cloning is O(1): clones share every node. Mutation goes through a
/// [`TreeTxn`], which produces a new version and leaves this one untouched.
pub struct Tree<V> {
    root: Arc<Node<V>>,
    size: usize,
}

impl<V> Clone for Tree<V> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            size: self.size,
        }
    }
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Tree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("size", &self.size).finish()
    }
}

impl<V> Tree<V> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(Node::empty(Vec::new())),
            size: 0,
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the tree holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Looks up the value stored at `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.root.get(key).map(|leaf| leaf.value())
    }

    /// Looks up `key` and returns a channel that fires when that entry (or,
    /// if absent, the subtree where it would live) changes.
    #[must_use]
    pub fn get_watch(&self, key: &[u8]) -> (WatchCh, Option<&V>) {
        let (watch, leaf) = self.root.get_watch(key);
        (watch, leaf.map(|l| l.value()))
    }

    /// Returns the channel that fires on any change to this version.
    #[must_use]
    pub fn root_watch(&self) -> WatchCh {
        self.root.mutate.clone()
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn minimum(&self) -> Option<Arc<Leaf<V>>> {
        self.root.minimum().cloned()
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn maximum(&self) -> Option<Arc<Leaf<V>>> {
        self.root.maximum().cloned()
    }

    /// Iterates every entry in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<V> {
        Iter::from_node(Arc::clone(&self.root))
    }

    /// Iterates every entry in descending key order.
    #[must_use]
    pub fn iter_rev(&self) -> ReverseIter<V> {
        ReverseIter::from_node(Arc::clone(&self.root))
    }

    /// Iterates, in ascending order, the entries whose key starts with
    /// `prefix`.
    ///
    /// The returned channel belongs to the node covering `prefix` and fires
    /// only when something under it changes.
    #[must_use]
    pub fn seek_prefix(&self, prefix: &[u8]) -> (WatchCh, Iter<V>) {
        match self.prefix_node(prefix) {
            (watch, Some(node)) => (watch, Iter::from_node(node)),
            (watch, None) => (watch, Iter::empty()),
        }
    }

    /// Like [`seek_prefix`](Self::seek_prefix) but descending.
    #[must_use]
    pub fn seek_prefix_rev(&self, prefix: &[u8]) -> (WatchCh, ReverseIter<V>) {
        match self.prefix_node(prefix) {
            (watch, Some(node)) => (watch, ReverseIter::from_node(node)),
            (watch, None) => (watch, ReverseIter::empty()),
        }
    }

    /// Iterates ascending from the first key `>= key`.
    #[must_use]
    pub fn seek_lower_bound(&self, key: &[u8]) -> Iter<V> {
        Iter::lower_bound(&self.root, key)
    }

    /// Iterates descending from the last key `<= key`.
    #[must_use]
    pub fn seek_reverse_lower_bound(&self, key: &[u8]) -> ReverseIter<V> {
        ReverseIter::lower_bound(&self.root, key)
    }

    /// Finds the subtree holding every key with `prefix` and the channel
    /// scoped to it.
    fn prefix_node(&self, prefix: &[u8]) -> (WatchCh, Option<Arc<Node<V>>>) {
        let mut n = Arc::clone(&self.root);
        let mut search = prefix;
        loop {
            if search.is_empty() {
                return (n.mutate.clone(), Some(n));
            }
            let Some(child) = n.find_edge(search[0]).cloned() else {
                return (n.mutate.clone(), None);
            };
            if search.starts_with(&child.prefix) {
                search = &search[child.prefix.len()..];
                n = child;
            } else if child.prefix.starts_with(search) {
                // The prefix ends inside the child's edge.
                return (child.mutate.clone(), Some(child));
            } else {
                // Any key with this prefix would have to split the child.
                return (child.mutate.clone(), None);
            }
        }
    }
}

impl<V: Clone> Tree<V> {
    /// Starts a transaction against this version.
    #[must_use]
    pub fn txn(&self) -> TreeTxn<V> {
        TreeTxn {
            root: Arc::clone(&self.root),
            size: self.size,
            track_mutate: true,
            tracked: Vec::new(),
        }
    }

    /// Returns a new version with `key` set to `value`, and the previous value.
    ///
    /// Shorthand for a single-operation transaction.
    #[must_use]
    pub fn insert(&self, key: &[u8], value: V) -> (Self, Option<V>) {
        let mut txn = self.txn();
        let old = txn.insert(key, value);
        (txn.commit(), old)
    }

    /// Returns a new version without `key`, and the removed value.
    #[must_use]
    pub fn delete(&self, key: &[u8]) -> (Self, Option<V>) {
        let mut txn = self.txn();
        let old = txn.delete(key);
        (txn.commit(), old)
    }
}

/// A private, mutable working copy of a tree.
///
/// Mutations copy the path from the root to the change; nodes reachable
/// from any published [`Tree`] are never modified. Channels of replaced
/// nodes are collected and fired by [`notify`](Self::notify) (or
/// [`commit`](Self::commit)) once the new version has been published.
pub struct TreeTxn<V> {
    root: Arc<Node<V>>,
    size: usize,
    track_mutate: bool,
    tracked: Vec<WatchCh>,
}

impl<V> fmt::Debug for TreeTxn<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeTxn")
            .field("size", &self.size)
            .field("track_mutate", &self.track_mutate)
            .field("tracked", &self.tracked.len())
            .finish()
    }
}

impl<V: Clone> TreeTxn<V> {
    /// Enables or disables collection of channels to fire on commit.
    ///
    /// Disable it for transactions whose result is never published where
    /// watchers can see it, so shared nodes are not falsely reported as
    /// changed.
    pub fn track_mutate(&mut self, track: bool) {
        self.track_mutate = track;
        if !track {
            self.tracked.clear();
        }
    }

    /// Returns the number of entries in the working copy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the working copy holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Looks up `key` in the working copy.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.root.get(key).map(|leaf| leaf.value())
    }

    /// Returns the working copy as an immutable version without ending the
    /// transaction and without firing any channel.
    #[must_use]
    pub fn root(&self) -> Tree<V> {
        Tree {
            root: Arc::clone(&self.root),
            size: self.size,
        }
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let root = Arc::clone(&self.root);
        let (new_root, old) = self.insert_node(&root, key, key, value);
        self.root = new_root;
        if old.is_none() {
            self.size += 1;
        }
        old
    }

    /// Removes `key`, returning the removed value.
    pub fn delete(&mut self, key: &[u8]) -> Option<V> {
        let root = Arc::clone(&self.root);
        let (new_root, leaf) = self.delete_node(&root, key, true)?;
        if let Some(new_root) = new_root {
            self.root = new_root;
        }
        self.size -= 1;
        Some(leaf.value().clone())
    }

    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Returns true if anything was removed.
    pub fn delete_prefix(&mut self, prefix: &[u8]) -> bool {
        let root = Arc::clone(&self.root);
        match self.delete_prefix_node(&root, prefix, true) {
            Some((new_root, removed)) => {
                self.root = new_root.unwrap_or_else(|| Arc::new(Node::empty(Vec::new())));
                self.size -= removed;
                removed > 0
            }
            None => false,
        }
    }

    /// Produces the new version without firing channels.
    ///
    /// Call [`notify`](Self::notify) once the version is visible.
    #[must_use]
    pub fn commit_only(&self) -> Tree<V> {
        self.root()
    }

    /// Fires the channels of every node replaced by this transaction.
    pub fn notify(&mut self) {
        for watch in self.tracked.drain(..) {
            watch.fire();
        }
    }

    /// Produces the new version and fires the replaced channels.
    #[must_use]
    pub fn commit(mut self) -> Tree<V> {
        let tree = self.commit_only();
        self.notify();
        tree
    }

    fn track(&mut self, watch: &WatchCh) {
        if self.track_mutate {
            self.tracked.push(watch.clone());
        }
    }

    fn insert_node(
        &mut self,
        n: &Arc<Node<V>>,
        key: &[u8],
        search: &[u8],
        value: V,
    ) -> (Arc<Node<V>>, Option<V>) {
        if search.is_empty() {
            let old = n.leaf.as_ref().map(|leaf| leaf.value().clone());
            if let Some(leaf) = &n.leaf {
                self.track(&leaf.mutate);
            }
            self.track(&n.mutate);
            let mut nc = n.copy();
            nc.leaf = Some(Arc::new(Leaf::new(key.to_vec(), value)));
            return (Arc::new(nc), old);
        }

        let pos = match n.edge_position(search[0]) {
            Ok(pos) => pos,
            Err(pos) => {
                self.track(&n.mutate);
                let leaf = Arc::new(Leaf::new(key.to_vec(), value));
                let mut nc = n.copy();
                nc.edges
                    .insert(pos, Arc::new(Node::with_leaf(search.to_vec(), leaf)));
                return (Arc::new(nc), None);
            }
        };

        let child = Arc::clone(&n.edges[pos]);
        let common = longest_prefix(search, &child.prefix);
        if common == child.prefix.len() {
            let (new_child, old) = self.insert_node(&child, key, &search[common..], value);
            self.track(&n.mutate);
            let mut nc = n.copy();
            nc.edges[pos] = new_child;
            return (Arc::new(nc), old);
        }

        // Split the edge at the first differing byte.
        self.track(&n.mutate);
        self.track(&child.mutate);
        let mut split = Node::empty(search[..common].to_vec());
        let mut moved = child.copy();
        moved.prefix = child.prefix[common..].to_vec();
        split.add_edge(Arc::new(moved));

        let leaf = Arc::new(Leaf::new(key.to_vec(), value));
        let rest = &search[common..];
        if rest.is_empty() {
            split.leaf = Some(leaf);
        } else {
            split.add_edge(Arc::new(Node::with_leaf(rest.to_vec(), leaf)));
        }

        let mut nc = n.copy();
        nc.edges[pos] = Arc::new(split);
        (Arc::new(nc), None)
    }

    /// Returns the replacement for `n` (`None` if `n` disappears) and the
    /// removed leaf, or `None` if `search` is absent.
    fn delete_node(
        &mut self,
        n: &Arc<Node<V>>,
        search: &[u8],
        is_root: bool,
    ) -> Option<(Option<Arc<Node<V>>>, Arc<Leaf<V>>)> {
        if search.is_empty() {
            let leaf = n.leaf.clone()?;
            self.track(&leaf.mutate);
            self.track(&n.mutate);
            if !is_root && n.edges.is_empty() {
                return Some((None, leaf));
            }
            let mut nc = n.copy();
            nc.leaf = None;
            if !is_root && nc.edges.len() == 1 {
                self.merge_child(&mut nc);
            }
            return Some((Some(Arc::new(nc)), leaf));
        }

        let pos = n.edge_position(search[0]).ok()?;
        let child = Arc::clone(&n.edges[pos]);
        if !search.starts_with(&child.prefix) {
            return None;
        }
        let (new_child, leaf) = self.delete_node(&child, &search[child.prefix.len()..], false)?;

        self.track(&n.mutate);
        let mut nc = n.copy();
        self.replace_edge(&mut nc, pos, new_child, is_root);
        Some((Some(Arc::new(nc)), leaf))
    }

    /// Returns the replacement for `n` and the number of removed entries, or
    /// `None` if no key has `search` as a prefix.
    fn delete_prefix_node(
        &mut self,
        n: &Arc<Node<V>>,
        search: &[u8],
        is_root: bool,
    ) -> Option<(Option<Arc<Node<V>>>, usize)> {
        if search.is_empty() {
            let removed = self.track_subtree(n);
            return Some((None, removed));
        }

        let pos = n.edge_position(search[0]).ok()?;
        let child = Arc::clone(&n.edges[pos]);
        let rest = if search.starts_with(&child.prefix) {
            &search[child.prefix.len()..]
        } else if child.prefix.starts_with(search) {
            &search[search.len()..]
        } else {
            return None;
        };
        let (new_child, removed) = self.delete_prefix_node(&child, rest, false)?;

        self.track(&n.mutate);
        let mut nc = n.copy();
        self.replace_edge(&mut nc, pos, new_child, is_root);
        Some((Some(Arc::new(nc)), removed))
    }

    fn replace_edge(
        &mut self,
        nc: &mut Node<V>,
        pos: usize,
        new_child: Option<Arc<Node<V>>>,
        is_root: bool,
    ) {
        match new_child {
            Some(child) => nc.edges[pos] = child,
            None => {
                nc.edges.remove(pos);
                if !is_root && nc.edges.len() == 1 && nc.leaf.is_none() {
                    self.merge_child(nc);
                }
            }
        }
    }

    /// Collapses a node with a single child and no leaf into that child.
    fn merge_child(&mut self, nc: &mut Node<V>) {
        let child = Arc::clone(&nc.edges[0]);
        self.track(&child.mutate);
        nc.prefix.extend_from_slice(&child.prefix);
        nc.leaf = child.leaf.clone();
        nc.edges = child.edges.clone();
    }

    /// Tracks every channel under `n`; returns the number of leaves.
    fn track_subtree(&mut self, n: &Arc<Node<V>>) -> usize {
        self.track(&n.mutate);
        let mut count = 0;
        if let Some(leaf) = &n.leaf {
            self.track(&leaf.mutate);
            count += 1;
        }
        for edge in &n.edges {
            count += self.track_subtree(edge);
        }
        count
    }
}
