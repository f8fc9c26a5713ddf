//! # Diagnostic events emitted by the relay.
//!
//! [`RelayEventKind`] classifies events across three categories:
//! - **Membership**: subscribers attaching/detaching, interest changes
//! - **Delivery**: forward failures, queue overflow, worker panics
//! - **Lifecycle**: shutdown progress
//!
//! The [`RelayEvent`] struct carries metadata such as the subscriber id,
//! channel, and a human-readable reason.
//!
//! ## Ordering
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically; use it to restore order when events are observed out of
//! order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::subscribers::SubscriberId;

/// Global sequence counter for diagnostic ordering.
static DIAG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of relay diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEventKind {
    // === Membership ===
    /// A subscriber endpoint was attached and its delivery worker spawned.
    ///
    /// Sets: `subscriber`, `reason` (endpoint name), `at`, `seq`.
    SubscriberAttached,

    /// A subscriber endpoint was detached; its interests were purged and any
    /// queued events dropped.
    ///
    /// Sets: `subscriber`, `at`, `seq`.
    SubscriberDetached,

    /// A channel was added to a subscriber's interest set.
    ///
    /// Sets: `subscriber`, `channel`, `at`, `seq`.
    ChannelSubscribed,

    /// A channel was removed from a subscriber's interest set.
    ///
    /// Sets: `subscriber`, `channel`, `at`, `seq`.
    ChannelUnsubscribed,

    // === Delivery ===
    /// Forwarding a payload to one subscriber failed; other subscribers are
    /// unaffected.
    ///
    /// Sets: `subscriber`, `reason` (error label), `at`, `seq`.
    ForwardFailed,

    /// A subscriber's outbox was full; the event was dropped for it.
    ///
    /// Sets: `subscriber`, `channel`, `at`, `seq`.
    OutboxOverflow,

    /// A delivery worker caught a panic from an `Outbound` implementation.
    ///
    /// Sets: `subscriber`, `reason` (panic info), `at`, `seq`.
    OutboxPanicked,

    // === Inbound frames ===
    /// An inbound control frame did not decode and was ignored.
    ///
    /// Sets: `subscriber`, `reason` (the raw frame), `at`, `seq`.
    FrameIgnored,

    // === Lifecycle ===
    /// Relay shutdown began.
    ///
    /// Sets: `at`, `seq`.
    ShutdownRequested,

    /// All outboxes drained within the configured grace period.
    ///
    /// Sets: `at`, `seq`.
    DrainedWithinGrace,

    /// Grace period exceeded; some outboxes were force-terminated.
    ///
    /// Sets: `reason` (stuck outbox names), `at`, `seq`.
    GraceExceeded,
}

/// Diagnostic event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`RelayEventKind`]
#[derive(Clone, Debug)]
pub struct RelayEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: RelayEventKind,
    /// Subscriber the event concerns, if any.
    pub subscriber: Option<SubscriberId>,
    /// Channel the event concerns, if any.
    pub channel: Option<Arc<str>>,
    /// Human-readable reason (errors, ignored frames, stuck names).
    pub reason: Option<Arc<str>>,
}

impl RelayEvent {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: RelayEventKind) -> Self {
        Self {
            seq: DIAG_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subscriber: None,
            channel: None,
            reason: None,
        }
    }

    /// Attaches the subscriber the event concerns.
    #[inline]
    pub fn with_subscriber(mut self, id: SubscriberId) -> Self {
        self.subscriber = Some(id);
        self
    }

    /// Attaches the channel the event concerns.
    #[inline]
    pub fn with_channel(mut self, channel: impl Into<Arc<str>>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a forward-failure event for one subscriber.
    #[inline]
    pub fn forward_failed(id: SubscriberId, label: &'static str) -> Self {
        RelayEvent::new(RelayEventKind::ForwardFailed)
            .with_subscriber(id)
            .with_reason(label)
    }

    /// Creates a worker-panic event for one subscriber.
    #[inline]
    pub fn outbox_panicked(id: SubscriberId, info: String) -> Self {
        RelayEvent::new(RelayEventKind::OutboxPanicked)
            .with_subscriber(id)
            .with_reason(info)
    }

    #[inline]
    pub fn is_delivery_failure(&self) -> bool {
        matches!(
            self.kind,
            RelayEventKind::ForwardFailed
                | RelayEventKind::OutboxOverflow
                | RelayEventKind::OutboxPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_fields() {
        let ev = RelayEvent::new(RelayEventKind::ChannelSubscribed)
            .with_subscriber(SubscriberId::from_raw(7))
            .with_channel("topic.1")
            .with_reason("test");
        assert_eq!(ev.kind, RelayEventKind::ChannelSubscribed);
        assert_eq!(ev.subscriber, Some(SubscriberId::from_raw(7)));
        assert_eq!(ev.channel.as_deref(), Some("topic.1"));
        assert_eq!(ev.reason.as_deref(), Some("test"));
    }

    #[test]
    fn test_delivery_failure_classification() {
        assert!(RelayEvent::new(RelayEventKind::OutboxOverflow).is_delivery_failure());
        assert!(!RelayEvent::new(RelayEventKind::SubscriberAttached).is_delivery_failure());
    }
}
