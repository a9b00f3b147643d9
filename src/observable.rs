//! Observable value cell backing the view state.
//!
//! Two ways to observe:
//! - [`Observable::subscribe`] registers a callback that is invoked with the
//!   current value immediately and then synchronously on every change, before
//!   the mutating [`Observable::set`] returns.
//! - [`Observable::watch`] hands out a `tokio::sync::watch` receiver for async
//!   consumers that only care about the latest value.
//!
//! Setting a value equal to the current one is a no-op, so observers never
//! see the same value twice in a row.
//!
//! Updates and fan-out are serialized per cell: a listener must not call
//! `set` or `subscribe` on the cell that is notifying it. A panicking
//! listener is logged and skipped; the remaining listeners are still called.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::error;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Observable<T> {
    value: watch::Sender<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    // Held across value update plus fan-out, and across registration plus the
    // first call, so every listener sees changes in order.
    notify: Mutex<()>,
    next_id: AtomicU64,
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (value, _) = watch::channel(initial);
        Self {
            value,
            listeners: Mutex::new(Vec::new()),
            notify: Mutex::new(()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Stores `next` and notifies every listener. Returns false when the value
    /// was unchanged and nobody was notified.
    pub fn set(&self, next: T) -> bool {
        let _notify = lock(&self.notify);
        let changed = self.value.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if !changed {
            return false;
        }
        // Snapshot so listeners may unsubscribe while being notified.
        let listeners: Vec<Listener<T>> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&next))).is_err() {
                error!("Observable listener panicked; continuing fan-out");
            }
        }
        true
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener<T> = Arc::new(listener);
        let _notify = lock(&self.notify);
        lock(&self.listeners).push((id, listener.clone()));
        listener(&self.get());
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn watch(&self) -> watch::Receiver<T> {
        self.value.subscribe()
    }
}

impl<T> std::fmt::Debug for Observable<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.value.borrow())
            .finish_non_exhaustive()
    }
}

// Poisoning only means a listener panicked; the guarded data is still valid.
fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
