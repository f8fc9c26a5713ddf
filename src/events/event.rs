//! # The relayed event: an immutable `(channel, payload, receipt-time)` triple.
//!
//! The relay never interprets the payload; it is forwarded verbatim to every
//! matched subscriber. The `seq` field is a globally monotonic counter that
//! restores arrival order in diagnostics when timestamps collide.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// One inbound event as accepted from the event source.
///
/// - `channel`: opaque routing key; hierarchy (`"posts/1/comments"`) is a
///   caller convention, never enforced here.
/// - `payload`: opaque bytes, cheap to clone during fan-out.
/// - `at`: wall-clock receipt time.
/// - `seq`: globally monotonic arrival counter.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock receipt timestamp.
    pub at: SystemTime,
    /// Channel the event was published on.
    pub channel: Arc<str>,
    /// Opaque payload, forwarded verbatim.
    pub payload: Bytes,
}

impl Event {
    /// Creates a new event stamped with the current time and next sequence
    /// number.
    pub fn new(channel: impl Into<Arc<str>>, payload: impl Into<Bytes>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}
