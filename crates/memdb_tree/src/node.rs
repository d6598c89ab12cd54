//! Radix tree nodes.
//!
//! Nodes are immutable once published. A transaction never mutates a
//! reachable node; it copies the path from the root to the change and
//! links the copies into a new root.

use crate::watch::WatchCh;
use std::sync::Arc;

/// A key/value pair stored in the tree.
#[derive(Debug)]
pub struct Leaf<V> {
    key: Vec<u8>,
    value: V,
    pub(crate) mutate: WatchCh,
}

impl<V> Leaf<V> {
    pub(crate) fn new(key: Vec<u8>, value: V) -> Self {
        Self {
            key,
            value,
            mutate: WatchCh::new(),
        }
    }

    /// Returns the full key of this entry.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns the stored value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the channel that fires when this entry is replaced or removed.
    #[must_use]
    pub fn watch(&self) -> WatchCh {
        self.mutate.clone()
    }
}

/// An inner node. `prefix` is the chunk of key consumed by the edge leading
/// here, so its first byte is the edge label. The root's prefix is empty.
#[derive(Debug)]
pub(crate) struct Node<V> {
    pub(crate) prefix: Vec<u8>,
    pub(crate) leaf: Option<Arc<Leaf<V>>>,
    /// Children sorted by label.
    pub(crate) edges: Vec<Arc<Node<V>>>,
    pub(crate) mutate: WatchCh,
}

impl<V> Node<V> {
    pub(crate) fn empty(prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            leaf: None,
            edges: Vec::new(),
            mutate: WatchCh::new(),
        }
    }

    pub(crate) fn with_leaf(prefix: Vec<u8>, leaf: Arc<Leaf<V>>) -> Self {
        Self {
            prefix,
            leaf: Some(leaf),
            edges: Vec::new(),
            mutate: WatchCh::new(),
        }
    }

    /// Shallow copy with a fresh watch channel.
    pub(crate) fn copy(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            leaf: self.leaf.clone(),
            edges: self.edges.clone(),
            mutate: WatchCh::new(),
        }
    }

    pub(crate) fn label(&self) -> u8 {
        self.prefix[0]
    }

    /// Binary search for the edge with `label`.
    pub(crate) fn edge_position(&self, label: u8) -> Result<usize, usize> {
        self.edges.binary_search_by(|e| e.label().cmp(&label))
    }

    pub(crate) fn find_edge(&self, label: u8) -> Option<&Arc<Node<V>>> {
        self.edge_position(label).ok().map(|pos| &self.edges[pos])
    }

    pub(crate) fn add_edge(&mut self, child: Arc<Node<V>>) {
        match self.edge_position(child.label()) {
            Ok(pos) => self.edges[pos] = child,
            Err(pos) => self.edges.insert(pos, child),
        }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<&Arc<Leaf<V>>> {
        let mut n = self;
        let mut search = key;
        loop {
            if search.is_empty() {
                return n.leaf.as_ref();
            }
            let child = n.find_edge(search[0])?;
            if !search.starts_with(&child.prefix) {
                return None;
            }
            search = &search[child.prefix.len()..];
            n = child.as_ref();
        }
    }

    /// Like [`get`](Self::get) but also returns the most specific channel
    /// that fires if the entry for `key` changes: the leaf's own channel when
    /// present, otherwise the channel of the deepest node on the search path.
    pub(crate) fn get_watch(&self, key: &[u8]) -> (WatchCh, Option<&Arc<Leaf<V>>>) {
        let mut n = self;
        let mut search = key;
        loop {
            let watch = &n.mutate;
            if search.is_empty() {
                return match &n.leaf {
                    Some(leaf) => (leaf.mutate.clone(), Some(leaf)),
                    None => (watch.clone(), None),
                };
            }
            let Some(child) = n.find_edge(search[0]) else {
                return (watch.clone(), None);
            };
            if !search.starts_with(&child.prefix) {
                return (watch.clone(), None);
            }
            search = &search[child.prefix.len()..];
            n = child.as_ref();
        }
    }

    pub(crate) fn minimum(&self) -> Option<&Arc<Leaf<V>>> {
        let mut n = self;
        loop {
            if n.leaf.is_some() {
                return n.leaf.as_ref();
            }
            n = n.edges.first()?.as_ref();
        }
    }

    pub(crate) fn maximum(&self) -> Option<&Arc<Leaf<V>>> {
        let mut n = self;
        loop {
            match n.edges.last() {
                Some(child) => n = child.as_ref(),
                None => return n.leaf.as_ref(),
            }
        }
    }
}

pub(crate) fn longest_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
