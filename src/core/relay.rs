//! # Relay: channel-keyed dispatch over attached subscribers.
//!
//! The [`Relay`] owns the subscription registry, the per-subscriber
//! outboxes, and the diagnostics bus. It is the only component that touches
//! shared state, and every operation goes through its methods.
//!
//! ## Key responsibilities
//! - accept `(channel, payload)` events from the event source
//! - route each event to the subscribers interested in its channel
//! - apply decoded control [`Command`]s from subscriber connections
//! - purge state on disconnect ([`Relay::detach`])
//! - drain delivery workers on shutdown within [`RelayConfig::grace`]
//!
//! ## Dispatch path
//! ```text
//! publish(channel, payload)
//!   ├─► closed? → drop (returns 0)
//!   ├─► registry.subscribers_for(channel)   (snapshot read)
//!   └─► outboxes.forward(id, payload) per match   (try_send, never awaits)
//! ```
//!
//! ## Rules
//! - Delivery is best-effort, at-most-once: a full queue, a dead connection,
//!   or a panicking endpoint drops the event **for that subscriber only**.
//! - Per-channel, per-subscriber FIFO: `publish` dispatches inline in
//!   arrival order and each subscriber drains one FIFO queue.
//! - A subscriber attached after an event was dispatched never receives it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use bytes::Bytes;

use crate::core::config::RelayConfig;
use crate::core::registry::SubscriptionRegistry;
use crate::error::RelayError;
use crate::events::Event;
use crate::observe::{Bus, RelayEvent, RelayEventKind};
use crate::protocol::Command;
use crate::subscribers::{Outbound, OutboxSet, SubscriberId};

/// Coordinates the registry, per-subscriber delivery, and shutdown.
pub struct Relay {
    cfg: RelayConfig,
    registry: SubscriptionRegistry,
    outboxes: OutboxSet,
    bus: Bus,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Relay {
    /// Starts building a relay with the given configuration.
    pub fn builder(cfg: RelayConfig) -> RelayBuilder {
        RelayBuilder::new(cfg)
    }

    /// Creates a relay with the given configuration and no extras.
    pub fn new(cfg: RelayConfig) -> Arc<Self> {
        RelayBuilder::new(cfg).build()
    }

    /// The active configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.cfg
    }

    /// The diagnostics bus; subscribe to observe what the relay does.
    pub fn observe(&self) -> &Bus {
        &self.bus
    }

    /// The subscription registry (read-mostly introspection).
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Registers a live subscriber endpoint and spawns its delivery worker.
    ///
    /// Returns the allocated [`SubscriberId`]. Ids are never reused within a
    /// process; the same logical peer connecting twice gets two independent
    /// ids.
    pub async fn attach(&self, outbound: Arc<dyn Outbound>) -> SubscriberId {
        let id = SubscriberId::from_raw(self.next_id.fetch_add(1, AtomicOrdering::Relaxed));
        let endpoint = outbound.name().to_string();
        self.outboxes.attach(id, outbound).await;
        self.bus.publish(
            RelayEvent::new(RelayEventKind::SubscriberAttached)
                .with_subscriber(id)
                .with_reason(endpoint),
        );
        id
    }

    /// Disconnect hook: cancels the delivery worker, drops queued events,
    /// and purges every interest of the subscriber.
    ///
    /// Idempotent; returns `false` if the subscriber was unknown.
    pub async fn detach(&self, id: SubscriberId) -> bool {
        let had_outbox = self.outboxes.detach(id).await;
        let purged = self.registry.remove_subscriber(id).await;
        let known = had_outbox || !purged.is_empty();
        if known {
            self.bus
                .publish(RelayEvent::new(RelayEventKind::SubscriberDetached).with_subscriber(id));
        }
        known
    }

    /// Adds `channel` to the subscriber's interest set (idempotent).
    ///
    /// Returns `true` if the interest was newly added.
    pub async fn subscribe(&self, id: SubscriberId, channel: &str) -> bool {
        let added = self.registry.subscribe(id, channel).await;
        if added {
            self.bus.publish(
                RelayEvent::new(RelayEventKind::ChannelSubscribed)
                    .with_subscriber(id)
                    .with_channel(channel),
            );
        }
        added
    }

    /// Removes `channel` from the subscriber's interest set (no-op if
    /// absent).
    ///
    /// Returns `true` if an interest was removed.
    pub async fn unsubscribe(&self, id: SubscriberId, channel: &str) -> bool {
        let removed = self.registry.unsubscribe(id, channel).await;
        if removed {
            self.bus.publish(
                RelayEvent::new(RelayEventKind::ChannelUnsubscribed)
                    .with_subscriber(id)
                    .with_channel(channel),
            );
        }
        removed
    }

    /// Decodes one inbound control frame and applies it.
    ///
    /// Frames that do not decode are ignored without error (observable as
    /// [`RelayEventKind::FrameIgnored`]).
    pub async fn handle_frame(&self, id: SubscriberId, frame: &str) {
        match Command::decode(frame) {
            Command::Subscribe { channel } => {
                self.subscribe(id, &channel).await;
            }
            Command::Unsubscribe { channel } => {
                self.unsubscribe(id, &channel).await;
            }
            Command::Unknown => {
                self.bus.publish(
                    RelayEvent::new(RelayEventKind::FrameIgnored)
                        .with_subscriber(id)
                        .with_reason(frame.to_string()),
                );
            }
        }
    }

    /// Accepts one `(channel, payload)` event from the event source and fans
    /// it out to every subscriber currently interested in the channel.
    ///
    /// Returns the number of outboxes the event was queued into. Dropped
    /// deliveries (full queue, dead peer) are not retried and do not affect
    /// other subscribers.
    pub async fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> usize {
        self.publish_event(Event::new(channel, payload)).await
    }

    /// Fans out an already-constructed [`Event`].
    pub async fn publish_event(&self, ev: Event) -> usize {
        if self.closed.load(AtomicOrdering::SeqCst) {
            return 0;
        }

        let targets = self.registry.subscribers_for(&ev.channel).await;
        let mut queued = 0;
        for id in targets {
            if self
                .outboxes
                .forward(id, &ev.channel, ev.payload.clone())
                .await
            {
                queued += 1;
            }
        }
        queued
    }

    /// Number of attached subscriber endpoints.
    pub async fn attached(&self) -> usize {
        self.outboxes.len().await
    }

    /// Shuts the relay down: stops accepting events, closes all outboxes,
    /// and waits up to [`RelayConfig::grace`] for delivery workers to drain.
    ///
    /// Returns [`RelayError::GraceExceeded`] naming the outboxes that were
    /// force-terminated, or [`RelayError::Closed`] if already shut down.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        if self.closed.swap(true, AtomicOrdering::SeqCst) {
            return Err(RelayError::Closed);
        }
        self.bus
            .publish(RelayEvent::new(RelayEventKind::ShutdownRequested));

        let stuck = self.outboxes.shutdown(self.cfg.grace).await;
        if stuck.is_empty() {
            self.bus
                .publish(RelayEvent::new(RelayEventKind::DrainedWithinGrace));
            Ok(())
        } else {
            self.bus.publish(
                RelayEvent::new(RelayEventKind::GraceExceeded).with_reason(stuck.join(",")),
            );
            Err(RelayError::GraceExceeded {
                grace: self.cfg.grace,
                stuck,
            })
        }
    }
}

/// Builder for constructing a [`Relay`] with optional extras.
pub struct RelayBuilder {
    cfg: RelayConfig,

    #[cfg(feature = "logging")]
    log_writer: bool,
}

impl RelayBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RelayConfig) -> Self {
        Self {
            cfg,

            #[cfg(feature = "logging")]
            log_writer: false,
        }
    }

    /// Attaches the built-in [`LogWriter`](crate::LogWriter) to the
    /// diagnostics bus on build.
    ///
    /// Requires the `logging` feature flag.
    #[cfg(feature = "logging")]
    pub fn with_log_writer(mut self) -> Self {
        self.log_writer = true;
        self
    }

    /// Builds the relay.
    ///
    /// Must be called within a tokio runtime: delivery workers (and the
    /// optional log writer) are spawned as attached subscribers arrive.
    pub fn build(self) -> Arc<Relay> {
        let bus = Bus::new(self.cfg.observe_capacity_clamped());

        #[cfg(feature = "logging")]
        if self.log_writer {
            crate::observe::LogWriter::spawn(&bus);
        }

        let outboxes = OutboxSet::new(self.cfg.outbox_capacity_clamped(), bus.clone());
        Arc::new(Relay {
            cfg: self.cfg,
            registry: SubscriptionRegistry::new(),
            outboxes,
            bus,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time;

    struct Recorder {
        tx: mpsc::UnboundedSender<Bytes>,
    }

    #[async_trait]
    impl Outbound for Recorder {
        async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
            self.tx.send(payload).map_err(|_| TransportError::Closed)
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Recorder { tx }), rx)
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Bytes {
        time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("delivery within 1s")
            .expect("payload")
    }

    #[tokio::test]
    async fn test_scenario_two_subscribers_two_topics() {
        let relay = Relay::new(RelayConfig::default());

        let (sink1, mut rx1) = recorder();
        let (sink2, mut rx2) = recorder();
        let s1 = relay.attach(sink1).await;
        let s2 = relay.attach(sink2).await;

        relay.subscribe(s1, "topic.1").await;
        relay.subscribe(s1, "topic.2").await;
        relay.subscribe(s2, "topic.2").await;

        assert_eq!(relay.publish("topic.1", "hello").await, 1);
        assert_eq!(recv(&mut rx1).await, Bytes::from("hello"));

        assert_eq!(relay.publish("topic.2", "world").await, 2);
        assert_eq!(recv(&mut rx1).await, Bytes::from("world"));
        // S2 never saw "hello": its first delivery is "world".
        assert_eq!(recv(&mut rx2).await, Bytes::from("world"));
    }

    #[tokio::test]
    async fn test_double_subscribe_delivers_once() {
        let relay = Relay::new(RelayConfig::default());
        let (sink, mut rx) = recorder();
        let s = relay.attach(sink).await;

        assert!(relay.subscribe(s, "topic.1").await);
        assert!(!relay.subscribe(s, "topic.1").await);

        assert_eq!(relay.publish("topic.1", "once").await, 1);
        assert_eq!(recv(&mut rx).await, Bytes::from("once"));

        time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_per_subscriber_fifo_order() {
        let relay = Relay::new(RelayConfig::default());
        let (sink, mut rx) = recorder();
        let s = relay.attach(sink).await;
        relay.subscribe(s, "topic.1").await;

        for i in 0..10u8 {
            assert_eq!(relay.publish("topic.1", vec![i]).await, 1);
        }
        for i in 0..10u8 {
            assert_eq!(recv(&mut rx).await, Bytes::from(vec![i]));
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let relay = Relay::new(RelayConfig::default());
        let (sink, mut rx) = recorder();
        let s = relay.attach(sink).await;

        relay.subscribe(s, "topic.1").await;
        assert_eq!(relay.publish("topic.1", "before").await, 1);
        assert_eq!(recv(&mut rx).await, Bytes::from("before"));

        assert!(relay.unsubscribe(s, "topic.1").await);
        assert_eq!(relay.publish("topic.1", "after").await, 0);
    }

    #[tokio::test]
    async fn test_detach_purges_interests_and_stops_delivery() {
        let relay = Relay::new(RelayConfig::default());
        let (sink, _rx) = recorder();
        let s = relay.attach(sink).await;

        relay.subscribe(s, "topic.1").await;
        relay.subscribe(s, "topic.2").await;

        assert!(relay.detach(s).await);
        assert!(!relay.detach(s).await);

        assert_eq!(relay.publish("topic.1", "late").await, 0);
        assert_eq!(relay.publish("topic.2", "late").await, 0);
        assert!(relay.registry().is_empty().await);
        assert_eq!(relay.attached().await, 0);
    }

    #[tokio::test]
    async fn test_dead_subscriber_does_not_block_live_one() {
        struct Dead;

        #[async_trait]
        impl Outbound for Dead {
            async fn send(&self, _payload: Bytes) -> Result<(), TransportError> {
                Err(TransportError::Closed)
            }

            fn name(&self) -> &str {
                "dead"
            }
        }

        let relay = Relay::new(RelayConfig::default());
        let dead = relay.attach(Arc::new(Dead)).await;
        let (sink, mut rx) = recorder();
        let live = relay.attach(sink).await;

        relay.subscribe(dead, "topic.1").await;
        relay.subscribe(live, "topic.1").await;

        relay.publish("topic.1", "still delivered").await;
        assert_eq!(recv(&mut rx).await, Bytes::from("still delivered"));
    }

    #[tokio::test]
    async fn test_handle_frame_drives_registry() {
        let relay = Relay::new(RelayConfig::default());
        let (sink, _rx) = recorder();
        let s = relay.attach(sink).await;

        relay.handle_frame(s, "subscribe|topic.1").await;
        assert_eq!(relay.registry().subscribers_for("topic.1").await, vec![s]);

        relay.handle_frame(s, "unsubscribe|topic.1").await;
        assert!(relay.registry().subscribers_for("topic.1").await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_frame_is_ignored_and_observable() {
        let relay = Relay::new(RelayConfig::default());
        let mut diag = relay.observe().subscribe();
        let (sink, _rx) = recorder();
        let s = relay.attach(sink).await;

        relay.handle_frame(s, "ping").await;
        assert!(relay.registry().channels_of(s).await.is_empty());

        let ignored = time::timeout(Duration::from_secs(1), async {
            loop {
                let ev = diag.recv().await.expect("diag event");
                if ev.kind == RelayEventKind::FrameIgnored {
                    return ev;
                }
            }
        })
        .await
        .expect("FrameIgnored within 1s");
        assert_eq!(ignored.subscriber, Some(s));
        assert_eq!(ignored.reason.as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn test_shutdown_is_terminal() {
        let relay = Relay::new(RelayConfig::default());
        let (sink, _rx) = recorder();
        let s = relay.attach(sink).await;
        relay.subscribe(s, "topic.1").await;

        assert!(relay.shutdown().await.is_ok());
        assert_eq!(relay.publish("topic.1", "dropped").await, 0);
        assert!(matches!(relay.shutdown().await, Err(RelayError::Closed)));
    }
}
