//! Fire-once change notification.
//!
//! Every node and leaf of a [`Tree`](crate::Tree) owns a [`WatchCh`]. When a
//! committed transaction replaces that node, the channel fires. Consumers
//! that hold a channel learn that the data they read from has been
//! superseded and must re-read to observe the new state.
//!
//! Channels are level-triggered and carry no payload: once fired they stay
//! fired, and firing again is a no-op.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cloneable handle to a fire-once signal.
///
/// Clones share the same underlying signal. Equality and hashing are by
/// identity, so channels can be collected into sets.
#[derive(Clone)]
pub struct WatchCh {
    inner: Arc<WatchInner>,
}

struct WatchInner {
    state: Mutex<WatchState>,
    cond: Condvar,
}

struct WatchState {
    fired: bool,
    listeners: Vec<Arc<Wakeup>>,
}

impl WatchCh {
    /// Creates a new, unfired channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WatchInner {
                state: Mutex::new(WatchState {
                    fired: false,
                    listeners: Vec::new(),
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Creates a channel that has already fired.
    #[must_use]
    pub fn fired() -> Self {
        let ch = Self::new();
        ch.fire();
        ch
    }

    /// Fires the channel, waking every waiter and listener.
    ///
    /// Idempotent.
    pub fn fire(&self) {
        let listeners = {
            let mut state = self.inner.state.lock();
            if state.fired {
                return;
            }
            state.fired = true;
            std::mem::take(&mut state.listeners)
        };
        self.inner.cond.notify_all();
        for listener in listeners {
            listener.notify();
        }
    }

    /// Returns true once the channel has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.state.lock().fired
    }

    /// Blocks until the channel fires.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock();
        while !state.fired {
            self.inner.cond.wait(&mut state);
        }
    }

    /// Blocks until the channel fires or `timeout` elapses.
    ///
    /// Returns true if the channel fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while !state.fired {
            if self
                .inner
                .cond
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.fired;
            }
        }
        true
    }

    /// Registers a listener to be notified when the channel fires.
    ///
    /// Returns true (and does not register) if the channel already fired.
    pub fn subscribe(&self, listener: &Arc<Wakeup>) -> bool {
        let mut state = self.inner.state.lock();
        if state.fired {
            return true;
        }
        state.listeners.push(Arc::clone(listener));
        false
    }

    /// Removes a listener previously passed to [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, listener: &Arc<Wakeup>) {
        self.inner
            .state
            .lock()
            .listeners
            .retain(|l| !Arc::ptr_eq(l, listener));
    }
}

impl Default for WatchCh {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for WatchCh {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WatchCh {}

impl Hash for WatchCh {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl fmt::Debug for WatchCh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchCh")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// A wakeup target shared by several channels.
///
/// Used to wait for the first of many channels to fire.
#[derive(Debug, Default)]
pub struct Wakeup {
    woken: Mutex<bool>,
    cond: Condvar,
}

impl Wakeup {
    /// Creates a new wakeup target.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks the target woken and releases any waiter.
    pub fn notify(&self) {
        *self.woken.lock() = true;
        self.cond.notify_all();
    }

    /// Blocks until notified or until `timeout` elapses.
    ///
    /// `None` waits without a deadline. Returns true if notified.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let mut woken = self.woken.lock();
        match timeout {
            None => {
                while !*woken {
                    self.cond.wait(&mut woken);
                }
                true
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while !*woken {
                    if self.cond.wait_until(&mut woken, deadline).timed_out() {
                        return *woken;
                    }
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fire_is_idempotent() {
        let ch = WatchCh::new();
        assert!(!ch.is_fired());
        ch.fire();
        ch.fire();
        assert!(ch.is_fired());
    }

    #[test]
    fn clones_share_state() {
        let ch = WatchCh::new();
        let other = ch.clone();
        ch.fire();
        assert!(other.is_fired());
        assert_eq!(ch, other);
        assert_ne!(ch, WatchCh::new());
    }

    #[test]
    fn wait_timeout_expires() {
        let ch = WatchCh::new();
        assert!(!ch.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn wait_wakes_on_fire() {
        let ch = WatchCh::new();
        let remote = ch.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.fire();
        });
        assert!(ch.wait_timeout(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn subscribe_after_fire_reports_immediately() {
        let ch = WatchCh::fired();
        let wakeup = Wakeup::new();
        assert!(ch.subscribe(&wakeup));
    }

    #[test]
    fn listener_notified() {
        let ch = WatchCh::new();
        let wakeup = Wakeup::new();
        assert!(!ch.subscribe(&wakeup));
        ch.fire();
        assert!(wakeup.wait(Some(Duration::from_millis(10))));
    }

    #[test]
    fn unsubscribed_listener_not_notified() {
        let ch = WatchCh::new();
        let wakeup = Wakeup::new();
        ch.subscribe(&wakeup);
        ch.unsubscribe(&wakeup);
        ch.fire();
        assert!(!wakeup.wait(Some(Duration::from_millis(10))));
    }
}
