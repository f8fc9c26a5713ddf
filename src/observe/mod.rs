//! # Relay diagnostics.
//!
//! The relay reports what it does — attaches, detaches, subscription changes,
//! forward failures, drops — as [`RelayEvent`]s on a broadcast [`Bus`].
//! Diagnostics are fire-and-forget: publishing never blocks the dispatch
//! path, and laggy observers skip over missed items.
//!
//! ```text
//! Relay ── publish(RelayEvent) ──► Bus ──► observer 1 (metrics)
//!                                      ├─► observer 2 (LogWriter, feature "logging")
//!                                      └─► observer N
//! ```

mod bus;
mod event;

#[cfg(feature = "logging")]
mod log;

pub use bus::Bus;
pub use event::{RelayEvent, RelayEventKind};

#[cfg(feature = "logging")]
pub use log::LogWriter;
