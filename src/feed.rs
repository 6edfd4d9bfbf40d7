//! Change notifications for live views
//!
//! A [`Subscription`] is owned by whoever created it and unsubscribes when
//! dropped, so a view that goes away stops receiving events.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// A write observed by the storage layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "movement_id", rename_all = "snake_case")]
pub enum MovementChange {
    Inserted(String),
    Updated(String),
    Deleted(String),
}

impl MovementChange {
    pub fn movement_id(&self) -> &str {
        match self {
            MovementChange::Inserted(id)
            | MovementChange::Updated(id)
            | MovementChange::Deleted(id) => id,
        }
    }
}

type Listener = Arc<dyn Fn(&MovementChange) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: HashMap<u64, Listener>,
}

fn lock(inner: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    // Every mutation is a single map operation, so a poisoned map is still consistent.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Broadcasts movement changes to registered listeners
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Arc<Mutex<Listeners>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it stays registered while the returned handle lives
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        listener: impl Fn(&MovementChange) + Send + Sync + 'static,
    ) -> Subscription {
        let mut listeners = lock(&self.inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));
        tracing::debug!(subscription = id, "subscribed to movement changes");

        Subscription {
            id,
            feed: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a change to every current listener
    pub fn publish(&self, change: &MovementChange) {
        let listeners: Vec<Listener> = lock(&self.inner).entries.values().cloned().collect();
        for listener in listeners {
            listener(change);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).entries.len()
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle to a registered listener
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    feed: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unsubscribe now instead of at drop
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.feed.upgrade() {
            lock(&inner).entries.remove(&self.id);
            tracing::debug!(subscription = self.id, "unsubscribed from movement changes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_subscribers() {
        let feed = ChangeFeed::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let _subscription = feed.subscribe(move |change| {
            sink.lock().unwrap().push(change.clone());
        });

        feed.publish(&MovementChange::Inserted("m1".to_string()));
        feed.publish(&MovementChange::Deleted("m1".to_string()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].movement_id(), "m1");
    }

    #[test]
    fn test_drop_unsubscribes() {
        let feed = ChangeFeed::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        let subscription = feed.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(feed.subscriber_count(), 1);

        feed.publish(&MovementChange::Updated("m1".to_string()));
        drop(subscription);
        feed.publish(&MovementChange::Updated("m1".to_string()));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_feed() {
        let feed = ChangeFeed::new();
        let subscription = feed.subscribe(|_| {});
        drop(feed);
        subscription.cancel();
    }

    #[test]
    fn test_change_serialization() {
        let json = serde_json::to_value(MovementChange::Deleted("m9".to_string())).unwrap();
        assert_eq!(json["event"], "deleted");
        assert_eq!(json["movement_id"], "m9");
    }
}
