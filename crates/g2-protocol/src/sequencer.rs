//! Per-connection sequence and message-ID counters.

use log::warn;

use crate::constants::{POST_AUTH_MESSAGE_ID, POST_AUTH_SEQUENCE};

/// Sequence and message-ID counters for one connection.
///
/// The handshake uses sequence numbers 1..=7 and its own fixed message IDs, so
/// a fresh sequencer starts where the handshake leaves off. Not synchronised:
/// the owner must serialise access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSequencer {
    next_sequence: u8,
    next_message_id: u32,
}

impl Default for SessionSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSequencer {
    /// Counters positioned just after the handshake.
    pub fn new() -> Self {
        SessionSequencer {
            next_sequence: POST_AUTH_SEQUENCE,
            next_message_id: POST_AUTH_MESSAGE_ID,
        }
    }

    /// Take the next sequence number. Wraps from 255 to 0.
    pub fn next_sequence(&mut self) -> u8 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }

    /// Take the next message ID.
    ///
    /// On the (theoretical) u32 overflow the counter restarts at the
    /// post-handshake value.
    pub fn next_message_id(&mut self) -> u32 {
        let id = self.next_message_id;
        self.next_message_id = match self.next_message_id.checked_add(1) {
            Some(next) => next,
            None => {
                warn!("message ID counter exhausted, restarting at {}", POST_AUTH_MESSAGE_ID);
                POST_AUTH_MESSAGE_ID
            }
        };
        id
    }

    /// Sequence number the next command will use.
    pub fn peek_sequence(&self) -> u8 {
        self.next_sequence
    }

    /// Message ID the next command will use.
    pub fn peek_message_id(&self) -> u32 {
        self.next_message_id
    }

    /// Return to the post-handshake values (on disconnect/reconnect).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
