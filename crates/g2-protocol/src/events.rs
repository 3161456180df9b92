//! Events decoded from frames sent by the glasses.
//!
//! Decoding never fails: anything the decoder does not understand comes back
//! as [`DecodedEvent::Opaque`] so unseen firmware behaviour degrades
//! gracefully instead of ending the session.

use log::{debug, warn};
use serde::Serialize;

use crate::constants::GESTURE_CONFIRMED;
use crate::frame::Frame;
use crate::types::{FrameType, GestureKind, ServiceId};
use crate::wire::{FieldReader, FieldValue};

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecodedEvent {
    /// A confirmed touch-bar gesture.
    Gesture {
        /// Which gesture.
        kind: GestureKind,
    },

    /// Speech-to-text output.
    SpeechTranscript {
        /// Transcribed text so far.
        text: String,
        /// Whether the recogniser has finished this utterance.
        is_final: bool,
    },

    /// A response on one of the auth services.
    AuthAck {
        /// Service the response arrived on.
        service_id: ServiceId,
        /// Message ID echoed by the glasses, if present.
        message_id: Option<u64>,
    },

    /// A recognised frame that carries nothing to act on.
    Ignored {
        /// Service the frame arrived on.
        service_id: ServiceId,
        /// Why it was ignored.
        reason: &'static str,
    },

    /// Anything else, passed through untouched.
    Opaque {
        /// Service the frame arrived on.
        service_id: ServiceId,
        /// Raw payload.
        payload: Vec<u8>,
    },
}

impl DecodedEvent {
    /// Short stable name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedEvent::Gesture { .. } => "gesture",
            DecodedEvent::SpeechTranscript { .. } => "speech_transcript",
            DecodedEvent::AuthAck { .. } => "auth_ack",
            DecodedEvent::Ignored { .. } => "ignored",
            DecodedEvent::Opaque { .. } => "opaque",
        }
    }

    fn opaque(frame: &Frame) -> Self {
        DecodedEvent::Opaque {
            service_id: frame.service_id,
            payload: frame.payload.clone(),
        }
    }
}

/// Decode one validated (and, if multi-packet, reassembled) frame.
///
/// Pure: touches no session state.
pub fn decode_event(frame: &Frame) -> DecodedEvent {
    let kind = frame.service_id.kind();
    let event = if kind.is_gesture() {
        decode_gesture(frame)
    } else if kind.is_speech() {
        decode_speech(frame)
    } else if kind.is_auth() && frame.frame_type == FrameType::Response {
        DecodedEvent::AuthAck {
            service_id: frame.service_id,
            message_id: FieldReader::find_varint(&frame.payload, 2),
        }
    } else {
        DecodedEvent::opaque(frame)
    };
    debug!("decoded {} on {} seq={}", event.kind(), frame.service_id, frame.sequence);
    event
}

fn decode_gesture(frame: &Frame) -> DecodedEvent {
    let (code, value) = match frame.payload.as_slice() {
        [code, value, ..] => (*code, *value),
        _ => return DecodedEvent::opaque(frame),
    };
    match GestureKind::from_code(code) {
        Some(kind) if value == GESTURE_CONFIRMED => DecodedEvent::Gesture { kind },
        Some(_) => DecodedEvent::Ignored {
            service_id: frame.service_id,
            reason: "gesture not confirmed",
        },
        None => {
            warn!(
                "unknown gesture code 0x{:02X} (value 0x{:02X}) on {}",
                code, value, frame.service_id
            );
            DecodedEvent::opaque(frame)
        }
    }
}

fn decode_speech(frame: &Frame) -> DecodedEvent {
    match find_transcript(&frame.payload) {
        Some((text, is_final)) => DecodedEvent::SpeechTranscript { text, is_final },
        None => {
            debug!(
                "no transcript in {} byte payload on {}",
                frame.payload.len(),
                frame.service_id
            );
            DecodedEvent::opaque(frame)
        }
    }
}

/// Find the first nested record sequence holding a UTF-8 text in field 1.
///
/// Field 2 of the same record sequence is the final flag (absent = partial).
fn find_transcript(payload: &[u8]) -> Option<(String, bool)> {
    FieldReader::new(payload)
        .map_while(Result::ok)
        .filter_map(|field| field.as_bytes())
        .find_map(parse_transcript)
}

fn parse_transcript(candidate: &[u8]) -> Option<(String, bool)> {
    let fields = FieldReader::collect_all(candidate).ok()?;
    let text = fields.iter().find_map(|f| match (f.number, f.value) {
        (1, FieldValue::Bytes(bytes)) => std::str::from_utf8(bytes).ok(),
        _ => None,
    })?;
    let is_final = fields
        .iter()
        .find(|f| f.number == 2)
        .and_then(|f| f.as_varint())
        .is_some_and(|v| v != 0);
    Some((text.to_string(), is_final))
}
