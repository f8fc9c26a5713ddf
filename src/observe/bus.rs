//! # Diagnostics bus.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking diagnostic publishing from the relay's dispatch and worker
//! paths.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: a single ring buffer stores recent events for all
//!   receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n`
//!   oldest items.
//! - **No persistence**: events are lost if there are no active receivers at
//!   send time.

use tokio::sync::broadcast;

use super::event::RelayEvent;

/// Broadcast channel for relay diagnostics.
///
/// Multiple publishers can publish concurrently; receivers get clones of each
/// event. Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<RelayEvent>,
}

impl Bus {
    /// Creates a new bus with the given ring-buffer capacity (minimum 1,
    /// clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<RelayEvent>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, ev: RelayEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribed.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::RelayEventKind;

    #[tokio::test]
    async fn test_receiver_observes_published_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(RelayEvent::new(RelayEventKind::ShutdownRequested));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, RelayEventKind::ShutdownRequested);
    }

    #[tokio::test]
    async fn test_publish_without_receivers_is_a_noop() {
        let bus = Bus::new(1);
        // Must not block or panic.
        bus.publish(RelayEvent::new(RelayEventKind::ShutdownRequested));
    }
}
