//! Connection-scoped protocol state.
//!
//! [`ProtocolSession`] is the send side: it owns the counters and the
//! handshake for one connection and turns [`Command`]s into ready-to-write
//! frames. [`InboundDecoder`] is the receive side and shares nothing with it,
//! so the two can live in different tasks.

use log::{debug, info, warn};

use crate::assembler::MessageAssembler;
use crate::auth::{AuthHandshake, AuthState};
use crate::commands::Command;
use crate::constants::{DEFAULT_MAX_PACKET_PAYLOAD, MAX_FRAME_PAYLOAD};
use crate::error::{AuthFailure, ProtocolError};
use crate::events::{decode_event, DecodedEvent};
use crate::frame::{build_frames, Frame};
use crate::sequencer::SessionSequencer;

/// Outbound state for one connection.
///
/// Not synchronised: wrap it in a lock or keep it on a single task.
#[derive(Debug)]
pub struct ProtocolSession {
    sequencer: SessionSequencer,
    max_packet_payload: usize,
    handshake: Option<AuthHandshake>,
}

impl Default for ProtocolSession {
    fn default() -> Self {
        ProtocolSession {
            sequencer: SessionSequencer::new(),
            max_packet_payload: DEFAULT_MAX_PACKET_PAYLOAD,
            handshake: None,
        }
    }
}

impl ProtocolSession {
    /// Create a session that splits payloads larger than `max_packet_payload`.
    pub fn new(max_packet_payload: usize) -> Result<Self, ProtocolError> {
        if max_packet_payload == 0 || max_packet_payload > MAX_FRAME_PAYLOAD {
            return Err(ProtocolError::InvalidCommand(format!(
                "packet payload limit must be 1..={}, got {}",
                MAX_FRAME_PAYLOAD, max_packet_payload
            )));
        }
        Ok(ProtocolSession {
            max_packet_payload,
            ..Default::default()
        })
    }

    /// The link came up: reset counters and prepare a fresh handshake.
    ///
    /// Any previous handshake, including a failed one, is discarded.
    pub fn on_connected(&mut self, unix_timestamp: u64) -> Result<&mut AuthHandshake, ProtocolError> {
        let handshake = AuthHandshake::new(unix_timestamp)?;
        self.sequencer.reset();
        info!("connected, handshake prepared");
        Ok(self.handshake.insert(handshake))
    }

    /// The link went down: fail an in-progress handshake, forget a completed
    /// one and reset counters.
    pub fn on_disconnected(&mut self, reason: &str) {
        if let Some(handshake) = self.handshake.as_mut() {
            let failure = AuthFailure::Disconnected {
                reason: reason.to_string(),
            };
            if !handshake.fail(failure) && handshake.state() == &AuthState::Complete {
                self.handshake = None;
            }
        }
        self.sequencer.reset();
        info!("disconnected: {}", reason);
    }

    /// Current handshake state; `NotStarted` before the first connection.
    pub fn auth_state(&self) -> AuthState {
        self.handshake
            .as_ref()
            .map(|h| h.state().clone())
            .unwrap_or(AuthState::NotStarted)
    }

    /// Whether the handshake has been fully transmitted on this connection.
    pub fn is_authenticated(&self) -> bool {
        self.auth_state() == AuthState::Complete
    }

    /// The handshake for the current connection, if one was prepared.
    pub fn handshake_mut(&mut self) -> Option<&mut AuthHandshake> {
        self.handshake.as_mut()
    }

    /// Build the frames for `command`, consuming one sequence number and,
    /// when the command carries one, one message ID.
    ///
    /// Invalid commands are rejected before any counter moves.
    pub fn next_outbound_frames(&mut self, command: &Command) -> Result<Vec<Vec<u8>>, ProtocolError> {
        command.validate()?;

        let sequence = self.sequencer.next_sequence();
        let message_id = command
            .uses_message_id()
            .then(|| self.sequencer.next_message_id());
        let payload = command.encode_payload(message_id)?;
        let frames = build_frames(
            sequence,
            command.service_id(),
            &payload,
            self.max_packet_payload,
        )?;

        debug!(
            "{} seq={} msg_id={:?} -> {} frame(s)",
            command.name(),
            sequence,
            message_id,
            frames.len()
        );
        Ok(frames)
    }

    /// Counters, for diagnostics.
    pub fn sequencer(&self) -> &SessionSequencer {
        &self.sequencer
    }
}

/// Inbound side: validates notifications, reassembles multi-packet messages
/// and decodes them.
#[derive(Debug, Default)]
pub struct InboundDecoder {
    assembler: MessageAssembler,
}

impl InboundDecoder {
    /// Create a decoder with no pending messages.
    pub fn new() -> Self {
        InboundDecoder {
            assembler: MessageAssembler::new(),
        }
    }

    /// Handle one notification.
    ///
    /// Returns `Ok(Some(event))` for a complete message, `Ok(None)` while a
    /// multi-packet message is still incomplete, or `Err` for an invalid frame.
    /// An error only concerns this frame; the caller drops it and carries on.
    pub fn deliver_bytes(&mut self, raw: &[u8]) -> Result<Option<DecodedEvent>, ProtocolError> {
        let frame = Frame::parse(raw).inspect_err(|e| {
            warn!("dropping invalid frame ({} bytes): {}", raw.len(), e);
        })?;
        Ok(self.assembler.push(frame).map(|message| decode_event(&message)))
    }

    /// Partial messages awaiting more packets.
    pub fn pending(&self) -> usize {
        self.assembler.pending()
    }

    /// Forget partial messages (on disconnect).
    pub fn reset(&mut self) {
        self.assembler.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::parse_frame;
    use crate::types::{GestureKind, ScrollMode, ServiceId};

    #[test]
    fn test_counters_advance_per_command() {
        let mut session = ProtocolSession::default();
        session.on_connected(1_700_000_000).unwrap();

        let wake = session.next_outbound_frames(&Command::DisplayWake).unwrap();
        assert_eq!(wake.len(), 1);
        assert_eq!(wake[0][2], 8);
        assert_eq!(session.sequencer().peek_message_id(), 0x14);

        let config = session.next_outbound_frames(&Command::DisplayConfig).unwrap();
        let frame = parse_frame(&config[0]).unwrap();
        assert_eq!(frame.sequence, 9);
        assert_eq!(frame.service_id, ServiceId::DISPLAY_CONFIG);
        assert_eq!(&frame.payload[..4], &[0x08, 0x02, 0x10, 0x14]);
        assert_eq!(session.sequencer().peek_message_id(), 0x15);
    }

    #[test]
    fn test_invalid_command_consumes_nothing() {
        let mut session = ProtocolSession::default();
        let bad = Command::ContentPage {
            page_index: 0,
            lines: vec![],
        };
        assert!(session.next_outbound_frames(&bad).is_err());
        assert_eq!(session.sequencer().peek_sequence(), 8);
        assert_eq!(session.sequencer().peek_message_id(), 0x14);
    }

    #[test]
    fn test_small_packet_limit_splits() {
        let mut session = ProtocolSession::new(20).unwrap();
        let frames = session.next_outbound_frames(&Command::DisplayConfig).unwrap();
        assert!(frames.len() > 1);
        for (i, bytes) in frames.iter().enumerate() {
            let frame = parse_frame(bytes).unwrap();
            assert_eq!(frame.sequence, 8);
            assert_eq!(frame.packet_index as usize, i + 1);
            assert_eq!(frame.packet_total as usize, frames.len());
        }
    }

    #[test]
    fn test_rejects_bad_packet_limit() {
        assert!(ProtocolSession::new(0).is_err());
        assert!(ProtocolSession::new(254).is_err());
        assert!(ProtocolSession::new(253).is_ok());
    }

    #[test]
    fn test_disconnect_fails_handshake_and_resets() {
        let mut session = ProtocolSession::default();
        assert_eq!(session.auth_state(), AuthState::NotStarted);
        session.on_connected(1).unwrap();
        session.handshake_mut().unwrap().mark_sent();
        session
            .next_outbound_frames(&Command::TeleprompterInit {
                total_lines: 10,
                mode: ScrollMode::Auto,
            })
            .unwrap();

        session.on_disconnected("link lost");
        assert!(matches!(
            session.auth_state(),
            AuthState::Failed(AuthFailure::Disconnected { .. })
        ));
        assert_eq!(session.sequencer().peek_sequence(), 8);

        session.on_connected(2).unwrap();
        assert_eq!(session.auth_state(), AuthState::NotStarted);
    }

    #[test]
    fn test_disconnect_after_auth_requires_new_handshake() {
        let mut session = ProtocolSession::default();
        let handshake = session.on_connected(1).unwrap();
        for _ in 0..7 {
            handshake.mark_sent();
        }
        assert!(handshake.complete());
        assert!(session.is_authenticated());

        session.on_disconnected("out of range");
        assert!(!session.is_authenticated());
        assert_eq!(session.auth_state(), AuthState::NotStarted);
    }

    #[test]
    fn test_deliver_bytes_gesture() {
        let mut decoder = InboundDecoder::new();
        let raw = Frame::response(3, ServiceId::GESTURE, vec![0x02, 0x01])
            .encode()
            .unwrap();
        assert_eq!(
            decoder.deliver_bytes(&raw).unwrap(),
            Some(DecodedEvent::Gesture {
                kind: GestureKind::DoubleTap
            })
        );
    }

    #[test]
    fn test_deliver_bytes_bad_frame_then_recovers() {
        let mut decoder = InboundDecoder::new();
        let mut raw = Frame::response(3, ServiceId::GESTURE, vec![0x01, 0x01])
            .encode()
            .unwrap();
        raw[8] ^= 0x04;
        assert!(matches!(
            decoder.deliver_bytes(&raw),
            Err(ProtocolError::CrcMismatch { .. })
        ));
        assert!(matches!(
            decoder.deliver_bytes(&[0xAA, 0x12]),
            Err(ProtocolError::TooShort { .. })
        ));

        raw[8] ^= 0x04;
        assert!(decoder.deliver_bytes(&raw).unwrap().is_some());
    }

    #[test]
    fn test_deliver_bytes_multi_packet() {
        let mut decoder = InboundDecoder::new();
        let mut parts = Vec::new();
        for (index, chunk) in [[0x01u8], [0x01u8]].iter().enumerate() {
            let frame = Frame {
                packet_total: 2,
                packet_index: index as u8 + 1,
                ..Frame::response(9, ServiceId::GESTURE, chunk.to_vec())
            };
            parts.push(frame.encode().unwrap());
        }
        assert_eq!(decoder.deliver_bytes(&parts[0]).unwrap(), None);
        assert_eq!(decoder.pending(), 1);
        assert_eq!(
            decoder.deliver_bytes(&parts[1]).unwrap(),
            Some(DecodedEvent::Gesture {
                kind: GestureKind::Tap
            })
        );
        decoder.reset();
        assert_eq!(decoder.pending(), 0);
    }
}
