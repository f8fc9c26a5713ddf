//! # Relay core.
//!
//! The dispatcher ([`Relay`]), the subscription registry, global
//! configuration, and the OS signal helper.

mod config;
mod registry;
mod relay;
mod shutdown;

pub use config::RelayConfig;
pub use registry::SubscriptionRegistry;
pub use relay::{Relay, RelayBuilder};
pub use shutdown::wait_for_shutdown_signal;
