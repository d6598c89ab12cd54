//! # MemDB Tree
//!
//! Persistent (copy-on-write) radix tree used as the storage layer of MemDB.
//!
//! Every mutation produces a new [`Tree`] version that shares all untouched
//! nodes with the previous one. Old versions stay valid and readable for as
//! long as someone holds them, which is what gives MemDB its snapshots.
//!
//! ## Design Principles
//!
//! - Published versions are immutable; writes go through a [`TreeTxn`]
//! - Keys are raw bytes and iterate in lexicographic order
//! - Every node carries a fire-once [`WatchCh`] that fires when a committed
//!   transaction replaces the node, so watchers are woken only for the
//!   subtree they read from
//!
//! ## Example
//!
//! ```rust
//! use memdb_tree::Tree;
//!
//! let tree: Tree<u32> = Tree::new();
//! let mut txn = tree.txn();
//! txn.insert(b"foo", 1);
//! txn.insert(b"foobar", 2);
//! let next = txn.commit();
//!
//! assert_eq!(tree.len(), 0);
//! assert_eq!(next.get(b"foobar"), Some(&2));
//!
//! let (_watch, iter) = next.seek_prefix(b"foo");
//! assert_eq!(iter.count(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod iter;
mod node;
mod tree;
mod watch;

pub use iter::{Iter, ReverseIter};
pub use node::Leaf;
pub use tree::{Tree, TreeTxn};
pub use watch::{WatchCh, Wakeup};
