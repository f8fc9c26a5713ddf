//! # Subscription registry: subscriber ⇄ channel interest indexes.
//!
//! The registry is the single shared-mutable-state component of the relay.
//! Access is serialized behind a `tokio::sync::RwLock`; no operation holds
//! the lock longer than a map lookup/update, and dispatch reads a snapshot
//! (last-writer-wins with respect to racing subscription changes).
//!
//! ## Rules
//! - `subscribe` is idempotent; an unknown subscriber is registered on first
//!   use, never an error.
//! - `unsubscribe` of an absent interest is a no-op.
//! - `remove_subscriber` purges every interest of a disconnected subscriber;
//!   stale entries must not accumulate.
//! - Channels with no remaining subscribers are dropped from the channel
//!   index (no unbounded growth from dead channel names).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::subscribers::SubscriberId;

#[derive(Default)]
struct Indexes {
    by_subscriber: HashMap<SubscriberId, HashSet<Arc<str>>>,
    by_channel: HashMap<Arc<str>, HashSet<SubscriberId>>,
}

/// In-memory mapping of subscriber identity → set of subscribed channels,
/// doubly indexed for O(1) routing lookups.
///
/// Restart loses all subscriptions: there is no persisted state.
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<Indexes>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `channel` to the subscriber's interest set.
    ///
    /// Idempotent: repeated calls are no-ops beyond the first. An unknown
    /// subscriber is registered implicitly. Returns `true` if the interest
    /// was newly added.
    pub async fn subscribe(&self, id: SubscriberId, channel: &str) -> bool {
        let mut inner = self.inner.write().await;

        // Reuse the interned channel name if the channel is already known.
        let key: Arc<str> = match inner.by_channel.get_key_value(channel) {
            Some((existing, _)) => Arc::clone(existing),
            None => Arc::from(channel),
        };

        let added = inner
            .by_subscriber
            .entry(id)
            .or_default()
            .insert(Arc::clone(&key));
        if added {
            inner.by_channel.entry(key).or_default().insert(id);
        }
        added
    }

    /// Removes `channel` from the subscriber's interest set.
    ///
    /// No-op if the interest (or the subscriber) is absent. Returns `true`
    /// if an interest was removed.
    pub async fn unsubscribe(&self, id: SubscriberId, channel: &str) -> bool {
        let mut inner = self.inner.write().await;

        let removed = match inner.by_subscriber.get_mut(&id) {
            Some(channels) => channels.remove(channel),
            None => false,
        };
        if removed {
            if let Some(subscribers) = inner.by_channel.get_mut(channel) {
                subscribers.remove(&id);
                if subscribers.is_empty() {
                    inner.by_channel.remove(channel);
                }
            }
        }
        removed
    }

    /// Purges all interests of a disconnected subscriber.
    ///
    /// Returns the channels the subscriber was interested in (empty if the
    /// subscriber was unknown).
    pub async fn remove_subscriber(&self, id: SubscriberId) -> Vec<Arc<str>> {
        let mut inner = self.inner.write().await;

        let channels = match inner.by_subscriber.remove(&id) {
            Some(channels) => channels,
            None => return Vec::new(),
        };
        for channel in &channels {
            if let Some(subscribers) = inner.by_channel.get_mut(channel) {
                subscribers.remove(&id);
                if subscribers.is_empty() {
                    inner.by_channel.remove(channel);
                }
            }
        }
        channels.into_iter().collect()
    }

    /// Snapshot of the subscribers currently interested in `channel`.
    ///
    /// No ordering guarantee. The snapshot is what dispatch routes against;
    /// changes racing with an in-flight dispatch take effect on the next one.
    pub async fn subscribers_for(&self, channel: &str) -> Vec<SubscriberId> {
        let inner = self.inner.read().await;
        match inner.by_channel.get(channel) {
            Some(subscribers) => subscribers.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Snapshot of one subscriber's interest set.
    pub async fn channels_of(&self, id: SubscriberId) -> Vec<Arc<str>> {
        let inner = self.inner.read().await;
        match inner.by_subscriber.get(&id) {
            Some(channels) => channels.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Number of known subscribers.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_subscriber.len()
    }

    /// True if no subscribers are known.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_subscriber.is_empty()
    }
}
