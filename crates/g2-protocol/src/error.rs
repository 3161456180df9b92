//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when building or parsing frames.
///
/// Everything here is fatal to a single frame or a single command build, never
/// to the session: inbound frames that fail are dropped and logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// First byte is not the frame magic.
    #[error("bad frame magic: 0x{0:02X}")]
    BadMagic(u8),

    /// Type byte is neither command nor response.
    #[error("unknown frame type: 0x{0:02X}")]
    UnknownFrameType(u8),

    /// Length byte disagrees with the number of bytes received.
    #[error("length field inconsistent: header declares {declared} bytes, frame carries {actual}")]
    LengthInconsistent {
        /// Payload + CRC length declared in the header.
        declared: usize,
        /// Payload + CRC length actually present.
        actual: usize,
    },

    /// CRC over the payload does not match the trailing CRC bytes.
    #[error("CRC mismatch: computed 0x{expected:04X}, frame carries 0x{actual:04X}")]
    CrcMismatch {
        /// CRC computed over the payload.
        expected: u16,
        /// CRC found in the frame.
        actual: u16,
    },

    /// Packet index is zero or past the packet total.
    #[error("invalid packet index {index} of {total}")]
    InvalidPacketIndex {
        /// 1-based packet index from the header.
        index: u8,
        /// Packet total from the header.
        total: u8,
    },

    /// Varint ran past the buffer or past 10 bytes.
    #[error("malformed varint at offset {offset}")]
    MalformedVarint {
        /// Offset of the first byte of the varint.
        offset: usize,
    },

    /// Tag/value record could not be read.
    #[error("malformed field at offset {offset}: {reason}")]
    MalformedField {
        /// Offset of the record key.
        offset: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// Payload does not fit in the frame format.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Command parameters would produce malformed wire data.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

impl ProtocolError {
    /// Short stable name, used as a metrics label and in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::TooShort { .. } => "too_short",
            ProtocolError::BadMagic(_) => "bad_magic",
            ProtocolError::UnknownFrameType(_) => "unknown_frame_type",
            ProtocolError::LengthInconsistent { .. } => "length_inconsistent",
            ProtocolError::CrcMismatch { .. } => "crc_mismatch",
            ProtocolError::InvalidPacketIndex { .. } => "invalid_packet_index",
            ProtocolError::MalformedVarint { .. } => "malformed_varint",
            ProtocolError::MalformedField { .. } => "malformed_field",
            ProtocolError::PayloadTooLarge { .. } => "payload_too_large",
            ProtocolError::InvalidCommand(_) => "invalid_command",
        }
    }
}

/// Reasons a handshake attempt ends in the failed state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The connection-attempt budget ran out.
    #[error("authentication timed out after {elapsed_ms} ms")]
    Timeout {
        /// Budget that was exceeded.
        elapsed_ms: u64,
    },

    /// Writing a handshake frame failed.
    #[error("authentication step {step} could not be written: {reason}")]
    TransportFailure {
        /// 1-based handshake step.
        step: u8,
        /// Transport-provided reason.
        reason: String,
    },

    /// The link dropped mid-handshake.
    #[error("disconnected during authentication: {reason}")]
    Disconnected {
        /// Transport-provided reason.
        reason: String,
    },
}
