//! # Relayed events.
//!
//! An [`Event`] is the unit the relay routes: an opaque payload tagged with a
//! channel name and stamped at receipt. Events are ephemeral — never
//! persisted, never replayed after dispatch.

mod event;

pub use event::Event;
