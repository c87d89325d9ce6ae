//! In-process "refresh requested" broadcast.
//!
//! Components receive an `Arc<EventBus>` at construction; publishers and
//! subscribers never hold references to each other. Delivery is synchronous
//! and follows registration order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

/// Signal asking every mounted component to reload what it displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequested;

type Callback = Arc<dyn Fn(RefreshRequested) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` until the returned guard is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(RefreshRequested) + Send + Sync + 'static,
    {
        let mut subscribers = lock(&self.subscribers);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, Arc::new(callback)));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Delivers one refresh to every subscriber registered at the time of the
    /// call and returns how many were reached. The registry lock is released
    /// before callbacks run, so callbacks may subscribe or unsubscribe.
    pub fn publish_refresh(&self) -> usize {
        let snapshot: Vec<Callback> = lock(&self.subscribers)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        debug!(subscribers = snapshot.len(), "broadcasting refresh");
        for callback in &snapshot {
            callback(RefreshRequested);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).entries.len()
    }
}

/// Registration guard returned by [`EventBus::subscribe`].
#[must_use = "dropping a subscription unregisters it immediately"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            lock(&subscribers).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(subscribers: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    subscribers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/event_bus_tests.rs"]
mod tests;
