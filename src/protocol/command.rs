//! # Control frame decoding.
//!
//! One inbound text frame maps to exactly one [`Command`]. Decoding is total:
//! malformed input is `Unknown`, never an error, matching the relay's
//! ignore-unmatched-frames contract.

/// Separator between the verb and the channel name in a control frame.
pub const FRAME_SEPARATOR: char = '|';

/// A decoded subscriber control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add the channel to the subscriber's interest set.
    Subscribe {
        /// Channel to subscribe to.
        channel: String,
    },

    /// Remove the channel from the subscriber's interest set.
    Unsubscribe {
        /// Channel to unsubscribe from.
        channel: String,
    },

    /// Anything that did not decode; the relay ignores it without error.
    Unknown,
}

impl Command {
    /// Decodes one text frame.
    ///
    /// A frame is `<verb>|<channel>` with a non-empty channel. A trailing
    /// `\r` is stripped so CRLF-framed transports decode the same as LF.
    ///
    /// # Example
    /// ```
    /// use relaybus::Command;
    ///
    /// assert_eq!(
    ///     Command::decode("subscribe|topic.1"),
    ///     Command::Subscribe { channel: "topic.1".into() },
    /// );
    /// assert_eq!(Command::decode("ping"), Command::Unknown);
    /// ```
    pub fn decode(frame: &str) -> Command {
        let frame = frame.strip_suffix('\r').unwrap_or(frame);
        match frame.split_once(FRAME_SEPARATOR) {
            Some(("subscribe", channel)) if !channel.is_empty() => Command::Subscribe {
                channel: channel.to_string(),
            },
            Some(("unsubscribe", channel)) if !channel.is_empty() => Command::Unsubscribe {
                channel: channel.to_string(),
            },
            _ => Command::Unknown,
        }
    }

    /// Short stable label (snake_case) for diagnostics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Command::Subscribe { .. } => "subscribe",
            Command::Unsubscribe { .. } => "unsubscribe",
            Command::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_subscribe() {
        assert_eq!(
            Command::decode("subscribe|posts/1/comments"),
            Command::Subscribe {
                channel: "posts/1/comments".into()
            }
        );
    }

    #[test]
    fn test_decode_unsubscribe() {
        assert_eq!(
            Command::decode("unsubscribe|topic.2"),
            Command::Unsubscribe {
                channel: "topic.2".into()
            }
        );
    }

    #[test]
    fn test_crlf_frame_decodes_like_lf() {
        assert_eq!(
            Command::decode("subscribe|topic.1\r"),
            Command::Subscribe {
                channel: "topic.1".into()
            }
        );
    }

    #[test]
    fn test_empty_channel_is_unknown() {
        assert_eq!(Command::decode("subscribe|"), Command::Unknown);
        assert_eq!(Command::decode("unsubscribe|"), Command::Unknown);
    }

    #[test]
    fn test_garbage_is_unknown() {
        assert_eq!(Command::decode(""), Command::Unknown);
        assert_eq!(Command::decode("ping"), Command::Unknown);
        assert_eq!(Command::decode("SUBSCRIBE|topic"), Command::Unknown);
        assert_eq!(Command::decode("publish|topic"), Command::Unknown);
        assert_eq!(Command::decode("|topic"), Command::Unknown);
    }

    #[test]
    fn test_separator_inside_channel_is_kept() {
        // Only the first separator splits; the rest belongs to the name.
        assert_eq!(
            Command::decode("subscribe|a|b"),
            Command::Subscribe {
                channel: "a|b".into()
            }
        );
    }
}
