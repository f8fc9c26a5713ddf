//! # Subscriber endpoints.
//!
//! A subscriber is an opaque endpoint registered to receive events for one or
//! more channels. The transport owns the connection; the relay holds only a
//! non-owning [`Outbound`] handle for routing, identified by a
//! [`SubscriberId`].
//!
//! Delivery is decoupled from dispatch: each attached subscriber gets a
//! bounded queue drained by a dedicated worker ([`OutboxSet`]), so a slow or
//! dead endpoint never blocks the publisher or its peers.

mod outbox;
mod subscriber;

pub(crate) use outbox::OutboxSet;
pub use subscriber::{Outbound, SubscriberId};
