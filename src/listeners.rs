//! Subscribers for submitted command lines.
//!
//! A [`LineListeners`] instance is owned by the background controller and
//! handed out by reference; tests build their own isolated instances.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback invoked with every submitted command line.
pub type LineCallback = Arc<dyn Fn(&str) + Send + Sync>;

type Slots = BTreeMap<u64, LineCallback>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    slots: Slots,
}

/// Set of line listeners with dynamic subscribe/unsubscribe.
#[derive(Clone, Default)]
pub struct LineListeners {
    inner: Arc<Mutex<Inner>>,
}

/// Disposer returned by [`LineListeners::add_listener`].
///
/// Dropping it does NOT unsubscribe; call [`Unsubscribe::unsubscribe`].
pub struct Unsubscribe {
    registry: Weak<Mutex<Inner>>,
    id: u64,
    done: AtomicBool,
}

impl Unsubscribe {
    /// Remove the listener this disposer was issued for. Repeated calls are no-ops.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).slots.remove(&self.id);
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // A panicking listener never runs while the lock is held, but recover anyway.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LineListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `cb` and return its disposer.
    pub fn add_listener<F>(&self, cb: F) -> Unsubscribe
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.slots.insert(id, Arc::new(cb));
        Unsubscribe {
            registry: Arc::downgrade(&self.inner),
            id,
            done: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `exstr` to every listener registered when the call starts.
    ///
    /// The id set is snapshotted up front, and each listener is looked up again
    /// right before it runs: listeners added mid-pass wait for the next event,
    /// listeners removed mid-pass are skipped. The lock is never held while a
    /// callback runs, so callbacks may subscribe or unsubscribe freely. A
    /// panicking listener is logged and the fan-out continues.
    pub fn dispatch(&self, exstr: &str) {
        let ids: Vec<u64> = lock(&self.inner).slots.keys().copied().collect();
        for id in ids {
            let cb = match lock(&self.inner).slots.get(&id) {
                Some(cb) => Arc::clone(cb),
                None => continue,
            };
            if catch_unwind(AssertUnwindSafe(|| cb(exstr))).is_err() {
                tracing::warn!(listener = id, "line listener panicked; continuing fan-out");
            }
        }
    }
}

impl std::fmt::Debug for LineListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineListeners")
            .field("len", &self.len())
            .finish()
    }
}
