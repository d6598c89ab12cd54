//! Result iterators returned by multi-object queries.

use memdb_tree::{Iter, Leaf, ReverseIter, WatchCh};
use std::fmt;
use std::sync::Arc;

/// An iterator over query results that also exposes a watch channel.
///
/// The channel fires when any object in the scanned range changes in a
/// later commit. Results themselves come from the snapshot the query ran
/// against and never change.
pub trait ResultIterator<T>: Iterator<Item = Arc<T>> {
    /// Channel covering the scanned range.
    fn watch_ch(&self) -> WatchCh;
}

enum Cursor<T> {
    Forward(Iter<Arc<T>>),
    Reverse(ReverseIter<Arc<T>>),
    ReverseChain(std::iter::Chain<ReverseIter<Arc<T>>, ReverseIter<Arc<T>>>),
}

/// Iterator over the objects stored under one index range.
pub struct IndexIterator<T> {
    cursor: Cursor<T>,
    watch: WatchCh,
}

impl<T> IndexIterator<T> {
    pub(crate) fn forward(iter: Iter<Arc<T>>, watch: WatchCh) -> Self {
        Self {
            cursor: Cursor::Forward(iter),
            watch,
        }
    }

    pub(crate) fn reverse(iter: ReverseIter<Arc<T>>, watch: WatchCh) -> Self {
        Self {
            cursor: Cursor::Reverse(iter),
            watch,
        }
    }

    pub(crate) fn reverse_chain(
        first: ReverseIter<Arc<T>>,
        then: ReverseIter<Arc<T>>,
        watch: WatchCh,
    ) -> Self {
        Self {
            cursor: Cursor::ReverseChain(first.chain(then)),
            watch,
        }
    }
}

fn value<T>(leaf: Arc<Leaf<Arc<T>>>) -> Arc<T> {
    Arc::clone(leaf.value())
}

impl<T> Iterator for IndexIterator<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.cursor {
            Cursor::Forward(iter) => iter.next().map(value),
            Cursor::Reverse(iter) => iter.next().map(value),
            Cursor::ReverseChain(iter) => iter.next().map(value),
        }
    }
}

impl<T> ResultIterator<T> for IndexIterator<T> {
    fn watch_ch(&self) -> WatchCh {
        self.watch.clone()
    }
}

impl<T> fmt::Debug for IndexIterator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.cursor {
            Cursor::Forward(_) => "forward",
            Cursor::Reverse(_) | Cursor::ReverseChain(_) => "reverse",
        };
        f.debug_struct("IndexIterator")
            .field("direction", &direction)
            .field("watch", &self.watch)
            .finish()
    }
}

/// Wraps a result iterator and skips every object for which `filter`
/// returns `true`.
///
/// Once the wrapped iterator is exhausted this one keeps returning `None`.
pub struct FilterIterator<I, F> {
    iter: I,
    filter: F,
    done: bool,
}

impl<I, F> FilterIterator<I, F> {
    /// Creates a filtering wrapper.
    pub fn new(iter: I, filter: F) -> Self {
        Self {
            iter,
            filter,
            done: false,
        }
    }
}

impl<I, F> Iterator for FilterIterator<I, F>
where
    I: Iterator,
    F: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.iter.next() {
                Some(item) if (self.filter)(&item) => continue,
                Some(item) => return Some(item),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl<T, I, F> ResultIterator<T> for FilterIterator<I, F>
where
    I: ResultIterator<T>,
    F: FnMut(&Arc<T>) -> bool,
{
    fn watch_ch(&self) -> WatchCh {
        self.iter.watch_ch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memdb_tree::Tree;

    fn tree() -> Tree<Arc<u32>> {
        let mut txn = Tree::new().txn();
        for i in 0..6_u32 {
            txn.insert(&[i as u8], Arc::new(i));
        }
        txn.commit()
    }

    #[test]
    fn forward_and_reverse() {
        let tree = tree();
        let (watch, iter) = tree.seek_prefix(b"");
        let it = IndexIterator::forward(iter, watch);
        assert_eq!(it.map(|v| *v).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);

        let (watch, iter) = tree.seek_prefix_rev(b"");
        let it = IndexIterator::reverse(iter, watch);
        assert_eq!(it.map(|v| *v).collect::<Vec<_>>(), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn filter_skips_matches() {
        let tree = tree();
        let (watch, iter) = tree.seek_prefix(b"");
        let it = FilterIterator::new(IndexIterator::forward(iter, watch.clone()), |v: &Arc<u32>| {
            **v % 2 == 0
        });
        assert_eq!(it.watch_ch(), watch);
        assert_eq!(it.map(|v| *v).collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn filter_stays_exhausted() {
        let tree = tree();
        let (watch, iter) = tree.seek_prefix(b"");
        let mut it = FilterIterator::new(IndexIterator::forward(iter, watch), |_: &Arc<u32>| true);
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }
}
