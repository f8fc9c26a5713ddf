//! # Global relay configuration.
//!
//! Provides [`RelayConfig`], centralized settings for the relay runtime.
//!
//! ## Sentinel values
//! - `send_timeout = 0s` → no write bound (treated as `None` by
//!   [`RelayConfig::write_bound`])

use std::time::Duration;

/// Global configuration for the relay runtime.
///
/// ## Field semantics
/// - `outbox_capacity`: per-subscriber delivery queue bound (min 1; clamped)
/// - `observe_capacity`: diagnostics ring buffer size (min 1; clamped)
/// - `grace`: maximum wait for outboxes to drain on shutdown (`0s` = no wait,
///   force immediately)
/// - `send_timeout`: write bound applied by the TCP transport per payload
///   (`0s` = unbounded)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Per-subscriber delivery queue capacity.
    ///
    /// When a subscriber's queue is full, further events are dropped for that
    /// subscriber until its worker catches up.
    pub outbox_capacity: usize,

    /// Capacity of the diagnostics broadcast ring buffer.
    ///
    /// Observers that lag behind more than this many events receive `Lagged`
    /// and skip older items.
    pub observe_capacity: usize,

    /// Maximum time to wait for delivery workers to drain on shutdown before
    /// force-terminating them.
    pub grace: Duration,

    /// Per-payload write bound for the TCP transport.
    ///
    /// - `Duration::ZERO` = unbounded
    /// - `> 0` = each `send` must complete within this window
    pub send_timeout: Duration,
}

impl RelayConfig {
    /// Returns the per-subscriber queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn outbox_capacity_clamped(&self) -> usize {
        self.outbox_capacity.max(1)
    }

    /// Returns the diagnostics capacity clamped to a minimum of 1.
    #[inline]
    pub fn observe_capacity_clamped(&self) -> usize {
        self.observe_capacity.max(1)
    }

    /// Returns the transport write bound as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(d)` → bound applied per payload
    #[inline]
    pub fn write_bound(&self) -> Option<Duration> {
        if self.send_timeout == Duration::ZERO {
            None
        } else {
            Some(self.send_timeout)
        }
    }
}

impl Default for RelayConfig {
    /// Default configuration:
    ///
    /// - `outbox_capacity = 256` (absorbs short bursts per subscriber)
    /// - `observe_capacity = 1024` (good baseline)
    /// - `grace = 5s` (reasonable drain window)
    /// - `send_timeout = 5s` (bounded writes to slow peers)
    fn default() -> Self {
        Self {
            outbox_capacity: 256,
            observe_capacity: 1024,
            grace: Duration::from_secs(5),
            send_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_and_sentinels() {
        let cfg = RelayConfig {
            outbox_capacity: 0,
            observe_capacity: 0,
            grace: Duration::ZERO,
            send_timeout: Duration::ZERO,
        };
        assert_eq!(cfg.outbox_capacity_clamped(), 1);
        assert_eq!(cfg.observe_capacity_clamped(), 1);
        assert_eq!(cfg.write_bound(), None);
    }
}
