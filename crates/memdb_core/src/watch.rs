//! Waiting on several watch channels at once.

use memdb_tree::{Wakeup, WatchCh};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

/// A set of watch channels that can be waited on together.
///
/// Query operations hand out a [`WatchCh`] alongside their results; collect
/// them here and call [`WatchSet::watch`] to block until any of the read
/// data changes.
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    channels: HashSet<WatchCh>,
}

impl WatchSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel. Adding the same channel twice has no effect.
    pub fn add(&mut self, ch: WatchCh) {
        self.channels.insert(ch);
    }

    /// Adds `ch` while the set holds fewer than `limit` channels, otherwise
    /// adds `alt` instead.
    ///
    /// `alt` is usually a coarser channel (such as an iterator's prefix
    /// channel) that covers `ch`, so the set stays bounded at the cost of
    /// spurious wakeups.
    pub fn add_with_limit(&mut self, limit: usize, ch: WatchCh, alt: WatchCh) {
        if self.channels.len() < limit {
            self.add(ch);
        } else {
            self.add(alt);
        }
    }

    /// Number of distinct channels in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if the set has no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Blocks until any channel fires or `timeout` elapses.
    ///
    /// Returns `true` if the timeout elapsed first. With no timeout an empty
    /// set returns `false` at once, since nothing could ever wake it.
    pub fn watch(&self, timeout: Option<Duration>) -> bool {
        if self.channels.is_empty() {
            return match timeout {
                Some(timeout) => {
                    thread::sleep(timeout);
                    true
                }
                None => false,
            };
        }

        let wakeup = Wakeup::new();
        let mut fired = false;
        for ch in &self.channels {
            if ch.subscribe(&wakeup) {
                fired = true;
                break;
            }
        }
        if !fired {
            fired = wakeup.wait(timeout);
        }
        for ch in &self.channels {
            ch.unsubscribe(&wakeup);
        }
        !fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn empty_set() {
        let ws = WatchSet::new();
        assert!(!ws.watch(None));
        assert!(ws.watch(Some(Duration::from_millis(5))));
    }

    #[test]
    fn duplicates_collapse() {
        let ch = WatchCh::new();
        let mut ws = WatchSet::new();
        ws.add(ch.clone());
        ws.add(ch);
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn already_fired_returns_immediately() {
        let mut ws = WatchSet::new();
        ws.add(WatchCh::new());
        ws.add(WatchCh::fired());
        assert!(!ws.watch(Some(Duration::from_secs(5))));
    }

    #[test]
    fn times_out() {
        let mut ws = WatchSet::new();
        ws.add(WatchCh::new());
        let start = Instant::now();
        assert!(ws.watch(Some(Duration::from_millis(20))));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wakes_on_fire() {
        let a = WatchCh::new();
        let b = WatchCh::new();
        let mut ws = WatchSet::new();
        ws.add(a);
        ws.add(b.clone());

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            b.fire();
        });
        assert!(!ws.watch(None));
        handle.join().unwrap();
    }

    #[test]
    fn limit_uses_alternate() {
        let alt = WatchCh::new();
        let mut ws = WatchSet::new();
        for _ in 0..3 {
            ws.add_with_limit(2, WatchCh::new(), alt.clone());
        }
        assert_eq!(ws.len(), 3);
        ws.add_with_limit(2, WatchCh::new(), alt.clone());
        assert_eq!(ws.len(), 3);

        alt.fire();
        assert!(!ws.watch(Some(Duration::from_secs(5))));
    }
}
