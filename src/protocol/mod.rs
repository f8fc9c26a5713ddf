//! # Subscriber control protocol.
//!
//! Subscriber connections drive their interest set with text frames:
//!
//! ```text
//! subscribe|<channel>
//! unsubscribe|<channel>
//! ```
//!
//! Frames decode into a tagged [`Command`] before any relay state is touched;
//! transports never pattern-match on raw strings. Anything that does not
//! decode is [`Command::Unknown`] and is ignored without error.

mod command;

pub use command::{Command, FRAME_SEPARATOR};
