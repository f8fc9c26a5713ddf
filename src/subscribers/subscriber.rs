//! # Subscriber identity and the outbound transport seam.
//!
//! `Outbound` is the extension point transports implement to receive
//! forwarded payloads. Each attached endpoint is driven by a dedicated worker
//! loop fed by a bounded queue owned by the
//! [`OutboxSet`](crate::subscribers::OutboxSet).
//!
//! ## Contract
//! - `send` must not block indefinitely: implementations time out or hand the
//!   payload to an async writer.
//! - Implementations may be slow (I/O, batching) — they do **not** block the
//!   dispatcher nor other subscribers.
//! - A disconnect-class error ([`TransportError::is_disconnect`]) stops the
//!   worker; registry cleanup is wired by the transport calling
//!   [`Relay::detach`](crate::Relay::detach).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

/// Opaque identity of one attached subscriber endpoint.
///
/// Ids are allocated by the relay on attach and never reused within a
/// process. The same logical peer connecting twice gets two independent ids;
/// the relay does not deduplicate identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Builds an id from a raw value. Intended for tests and diagnostics.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        SubscriberId(raw)
    }

    /// The raw id value.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Send capability of one subscriber connection.
///
/// Called from a subscriber-dedicated worker task, one payload at a time, in
/// queue order. Implementations should avoid blocking the async runtime.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use relaybus::{Outbound, TransportError};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Outbound for Discard {
///     async fn send(&self, _payload: Bytes) -> Result<(), TransportError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Outbound: Send + Sync + 'static {
    /// Forwards one payload to the subscriber.
    ///
    /// Must complete in bounded time; return
    /// [`TransportError::Timeout`](crate::TransportError::Timeout) when the
    /// write bound is exceeded.
    async fn send(&self, payload: Bytes) -> Result<(), TransportError>;

    /// Human-readable endpoint name (for diagnostics).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_and_display() {
        let id = SubscriberId::from_raw(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
