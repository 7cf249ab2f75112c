//! Change observers for the display buffer.
//!
//! Callbacks carry no payload: a notification only means "the buffer
//! changed", and observers re-read `get_items()` for the contents.

use log::error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

/// Ordered list of registered callbacks.
#[derive(Default)]
pub struct Subscribers {
    registry: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push((id, Arc::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every callback in subscription order.
    ///
    /// The list is copied first, so callbacks may subscribe or unsubscribe
    /// while being notified; such changes apply from the next notification.
    /// A panicking callback is logged and skipped.
    pub fn notify(&self) {
        let callbacks: Vec<(u64, Callback)> = lock(&self.registry).entries.clone();

        for (id, callback) in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                error!("Display buffer subscriber #{} panicked during notification", id);
            }
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `subscribe`.
///
/// Holds only a weak reference, so it never keeps the buffer alive.
/// Dropping the handle does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the callback. Safe to call any number of times, and after
    /// the buffer has been cleared or dropped.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|(id, _)| *id != self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => lock(&registry).entries.iter().any(|(id, _)| *id == self.id),
            None => false,
        }
    }
}

// The lock is never held while callbacks run
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
