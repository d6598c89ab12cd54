//! Ordered iteration over a tree version.
//!
//! Iterators own `Arc`s to the nodes they still have to visit, so they stay
//! valid (and keep returning the same data) no matter how many newer
//! versions are committed while they are alive.

use crate::node::{Leaf, Node};
use std::cmp::Ordering;
use std::sync::Arc;

pub(crate) enum Frame<V> {
    Node(Arc<Node<V>>),
    Leaf(Arc<Leaf<V>>),
}

/// Ascending iterator over the entries of a tree.
pub struct Iter<V> {
    stack: Vec<Frame<V>>,
}

impl<V> Iter<V> {
    pub(crate) fn empty() -> Self {
        Self { stack: Vec::new() }
    }

    pub(crate) fn from_node(node: Arc<Node<V>>) -> Self {
        Self {
            stack: vec![Frame::Node(node)],
        }
    }

    /// Positions the iterator at the first key `>= key`.
    pub(crate) fn lower_bound(root: &Arc<Node<V>>, key: &[u8]) -> Self {
        let mut stack = Vec::new();
        let mut n = Arc::clone(root);
        let mut search = key;
        loop {
            let len = n.prefix.len().min(search.len());
            match n.prefix[..len].cmp(&search[..len]) {
                // Whole subtree sorts after the key.
                Ordering::Greater => {
                    stack.push(Frame::Node(n));
                    break;
                }
                // Whole subtree sorts before the key.
                Ordering::Less => break,
                Ordering::Equal => {}
            }
            if n.prefix.len() >= search.len() {
                // Every key below extends `key`, so none sorts before it.
                stack.push(Frame::Node(n));
                break;
            }
            search = &search[n.prefix.len()..];
            let label = search[0];
            // The leaf here is a strict prefix of `key` and is skipped.
            for edge in n.edges.iter().rev() {
                if edge.label() <= label {
                    break;
                }
                stack.push(Frame::Node(Arc::clone(edge)));
            }
            match n.find_edge(label) {
                Some(child) => n = Arc::clone(child),
                None => break,
            }
        }
        Self { stack }
    }
}

impl<V> Iterator for Iter<V> {
    type Item = Arc<Leaf<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Leaf(leaf) => return Some(leaf),
                Frame::Node(node) => {
                    for edge in node.edges.iter().rev() {
                        self.stack.push(Frame::Node(Arc::clone(edge)));
                    }
                    if let Some(leaf) = &node.leaf {
                        return Some(Arc::clone(leaf));
                    }
                }
            }
        }
        None
    }
}

/// Descending iterator over the entries of a tree.
pub struct ReverseIter<V> {
    stack: Vec<Frame<V>>,
}

impl<V> ReverseIter<V> {
    pub(crate) fn empty() -> Self {
        Self { stack: Vec::new() }
    }

    pub(crate) fn from_node(node: Arc<Node<V>>) -> Self {
        Self {
            stack: vec![Frame::Node(node)],
        }
    }

    /// Positions the iterator at the last key `<= key`.
    pub(crate) fn lower_bound(root: &Arc<Node<V>>, key: &[u8]) -> Self {
        let mut stack = Vec::new();
        let mut n = Arc::clone(root);
        let mut search = key;
        loop {
            let len = n.prefix.len().min(search.len());
            match n.prefix[..len].cmp(&search[..len]) {
                Ordering::Greater => break,
                Ordering::Less => {
                    stack.push(Frame::Node(n));
                    break;
                }
                Ordering::Equal => {}
            }
            if n.prefix.len() > search.len() {
                // Every key below is longer than `key` and extends it.
                break;
            }
            search = &search[n.prefix.len()..];
            if let Some(leaf) = &n.leaf {
                stack.push(Frame::Leaf(Arc::clone(leaf)));
            }
            if search.is_empty() {
                break;
            }
            let label = search[0];
            for edge in &n.edges {
                if edge.label() >= label {
                    break;
                }
                stack.push(Frame::Node(Arc::clone(edge)));
            }
            match n.find_edge(label) {
                Some(child) => n = Arc::clone(child),
                None => break,
            }
        }
        Self { stack }
    }
}

impl<V> Iterator for ReverseIter<V> {
    type Item = Arc<Leaf<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Leaf(leaf) => return Some(leaf),
                Frame::Node(node) => {
                    if let Some(leaf) = &node.leaf {
                        self.stack.push(Frame::Leaf(Arc::clone(leaf)));
                    }
                    for edge in &node.edges {
                        self.stack.push(Frame::Node(Arc::clone(edge)));
                    }
                }
            }
        }
        None
    }
}
