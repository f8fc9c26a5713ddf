//! Error types used by the relay and its transports.
//!
//! This module defines two main error enums:
//!
//! - [`RelayError`] — errors raised by the relay runtime itself.
//! - [`TransportError`] — errors raised while forwarding a payload to one
//!   subscriber endpoint.
//!
//! Both types provide `as_label` for stable log/metric labels. Forward
//! failures are never propagated to the event source or to other subscribers;
//! they surface only as diagnostics on the relay's [`Bus`](crate::Bus).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the relay runtime.
///
/// These represent failures of the relay itself, such as a shutdown drain
/// exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// Shutdown grace period was exceeded; some delivery workers were still
    /// draining and had to be force-terminated.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the subscriber outboxes that did not drain in time.
        stuck: Vec<String>,
    },

    /// The relay has already been shut down; no further events are accepted.
    #[error("relay is closed")]
    Closed,
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use relaybus::RelayError;
    ///
    /// assert_eq!(RelayError::Closed.as_label(), "relay_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::GraceExceeded { .. } => "relay_grace_exceeded",
            RelayError::Closed => "relay_closed",
        }
    }
}

/// # Errors produced while forwarding to one subscriber.
///
/// Returned by [`Outbound::send`](crate::Outbound::send) implementations.
/// Each forward attempt is isolated: an error here affects only the
/// subscriber it was raised for.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The subscriber connection is gone; further sends cannot succeed.
    #[error("connection closed")]
    Closed,

    /// The send did not complete within the transport's write bound.
    #[error("send timed out after {timeout:?}")]
    Timeout {
        /// The write bound that was exceeded.
        timeout: Duration,
    },

    /// Underlying I/O failure while writing to the subscriber.
    #[error("i/o failure: {error}")]
    Io {
        /// The underlying error message.
        error: String,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Closed => "transport_closed",
            TransportError::Timeout { .. } => "transport_timeout",
            TransportError::Io { .. } => "transport_io",
        }
    }

    /// Indicates whether the subscriber should be considered gone.
    ///
    /// A delivery worker stops forwarding after a disconnect-class error;
    /// a timeout is not by itself a disconnect.
    ///
    /// # Example
    /// ```
    /// use relaybus::TransportError;
    /// use std::time::Duration;
    ///
    /// assert!(TransportError::Closed.is_disconnect());
    /// assert!(!TransportError::Timeout { timeout: Duration::from_secs(1) }.is_disconnect());
    /// ```
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Closed | TransportError::Io { .. })
    }
}
