//! # relaybus
//!
//! **Relaybus** is a lightweight channel-keyed event relay for Rust.
//!
//! It receives `(channel, payload)` events from an external producer, keeps an
//! in-memory registry of subscriber interests, and fans each event out to the
//! subscribers currently interested in its channel. Delivery is best-effort,
//! at-most-once: no acknowledgements, no retries, no persistence.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Event Source (external)                Subscriber connections (transport)
//!        │                                     ▲            ▲
//!        │ publish(channel, payload)           │ send()     │ send()
//!        ▼                                     │            │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Relay (dispatcher)                                               │
//! │  - SubscriptionRegistry (subscriber ⇄ channel indexes)            │
//! │  - OutboxSet (per-subscriber bounded queue + delivery worker)     │
//! │  - Bus (diagnostics broadcast)                                    │
//! └──────┬──────────────────────┬─────────────────────────┬──────────┘
//!        ▼                      ▼                         ▼
//!   [queue S1] ─► worker S1   [queue S2] ─► worker S2   [queue SN] ─► worker SN
//!        │                      │                         │
//!        ▼                      ▼                         ▼
//!   Outbound::send()       Outbound::send()          Outbound::send()
//! ```
//!
//! ### Event flow
//! ```text
//! publish(channel, payload)
//!   ├─► registry.subscribers_for(channel)      (snapshot read, last-writer-wins)
//!   ├─► for each matched subscriber:
//!   │     try_send(payload) into its outbox    (never awaits delivery)
//!   │        ├─ Ok      → worker forwards via Outbound::send()
//!   │        ├─ Full    → dropped for that subscriber (OutboxOverflow)
//!   │        └─ Closed  → dropped for that subscriber (ForwardFailed)
//!   └─► returns number of outboxes the event was queued into
//! ```
//!
//! ## Guarantees
//! - A subscriber receives an event iff its interest set contains the event's
//!   channel at dispatch time.
//! - Per-channel, per-subscriber FIFO: events published in order arrive in
//!   order at each subscriber. No ordering across subscribers or channels.
//! - One failing subscriber never blocks or fails delivery to the others.
//! - Disconnection (`detach`) promptly purges all interests; queued events for
//!   a detached subscriber are dropped.
//!
//! ## Control protocol
//! Inbound text frames from subscriber connections decode into [`Command`]:
//! `subscribe|<channel>`, `unsubscribe|<channel>`; anything else is ignored
//! without error.
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//! - `tcp`: exposes a line-framed TCP transport ([`TcpRelayServer`]).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use relaybus::{Outbound, Relay, RelayConfig, TransportError};
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl Outbound for Stdout {
//!     async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
//!         println!("{}", String::from_utf8_lossy(&payload));
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "stdout"
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = Relay::builder(RelayConfig::default()).build();
//!
//!     let sub = relay.attach(Arc::new(Stdout)).await;
//!     relay.subscribe(sub, "greetings").await;
//!
//!     let queued = relay.publish("greetings", "hello").await;
//!     assert_eq!(queued, 1);
//!
//!     relay.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod observe;
mod protocol;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    wait_for_shutdown_signal, Relay, RelayBuilder, RelayConfig, SubscriptionRegistry,
};
pub use error::{RelayError, TransportError};
pub use events::Event;
pub use observe::{Bus, RelayEvent, RelayEventKind};
pub use protocol::{Command, FRAME_SEPARATOR};
pub use subscribers::{Outbound, SubscriberId};

// Optional: expose a simple built-in diagnostics printer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observe::LogWriter;

// Optional: expose the line-framed TCP transport.
// Enable with: `--features tcp`
#[cfg(feature = "tcp")]
mod transport;
#[cfg(feature = "tcp")]
pub use transport::TcpRelayServer;
