//! # Concrete transports.
//!
//! A transport bridges real subscriber connections to the relay: it attaches
//! an [`Outbound`](crate::Outbound) per connection, feeds inbound text frames
//! to [`Relay::handle_frame`](crate::Relay::handle_frame), and wires
//! disconnection to [`Relay::detach`](crate::Relay::detach).

mod tcp;

pub use tcp::TcpRelayServer;
