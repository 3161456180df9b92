//! Frame encoding/decoding.
//!
//! Every BLE write and notification carries exactly one frame:
//!
//! ```text
//! +------+------+-----+-----+-------+-------+--------+--------+-----------+--------+--------+
//! | 0xAA | type | seq | len | total | index | svc_hi | svc_lo | payload.. | crc_lo | crc_hi |
//! +------+------+-----+-----+-------+-------+--------+--------+-----------+--------+--------+
//! ```
//!
//! `len` counts the payload plus the two CRC bytes. The CRC covers the payload
//! only. Messages too large for one frame are split into several frames that
//! share a sequence number, with `total` set on all of them and `index`
//! counting from 1.

use bytes::BufMut;
use log::{debug, trace};

use crate::constants::*;
use crate::crc::crc16;
use crate::error::ProtocolError;
use crate::types::{FrameType, ServiceId};

/// One validated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command or response.
    pub frame_type: FrameType,
    /// Sequence number shared by all packets of a message.
    pub sequence: u8,
    /// Number of packets in the message.
    pub packet_total: u8,
    /// 1-based position of this packet in the message.
    pub packet_index: u8,
    /// Service tag.
    pub service_id: ServiceId,
    /// Payload bytes, interpreted per service.
    pub payload: Vec<u8>,
}

impl Frame {
    /// A single-packet command frame.
    pub fn command(sequence: u8, service_id: ServiceId, payload: Vec<u8>) -> Self {
        Frame {
            frame_type: FrameType::Command,
            sequence,
            packet_total: 1,
            packet_index: 1,
            service_id,
            payload,
        }
    }

    /// A single-packet response frame, as the glasses would send it.
    pub fn response(sequence: u8, service_id: ServiceId, payload: Vec<u8>) -> Self {
        Frame {
            frame_type: FrameType::Response,
            ..Frame::command(sequence, service_id, payload)
        }
    }

    /// Whether this frame is one part of a larger message.
    pub fn is_multi_packet(&self) -> bool {
        self.packet_total > 1
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.payload.len() > MAX_FRAME_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_FRAME_PAYLOAD,
            });
        }

        let mut buf = Vec::with_capacity(MIN_FRAME_LEN + self.payload.len());
        buf.put_u8(FRAME_MAGIC);
        buf.put_u8(self.frame_type.to_byte());
        buf.put_u8(self.sequence);
        buf.put_u8((self.payload.len() + CRC_LEN) as u8);
        buf.put_u8(self.packet_total);
        buf.put_u8(self.packet_index);
        buf.put_slice(&self.service_id.to_bytes());
        buf.put_slice(&self.payload);
        buf.put_u16_le(crc16(&self.payload));
        Ok(buf)
    }

    /// Parse and validate wire bytes.
    ///
    /// A frame that fails any check is rejected whole; nothing is partially
    /// interpreted.
    pub fn parse(buf: &[u8]) -> Result<Frame, ProtocolError> {
        if buf.len() < MIN_FRAME_LEN {
            return Err(ProtocolError::TooShort {
                expected: MIN_FRAME_LEN,
                actual: buf.len(),
            });
        }
        if buf[0] != FRAME_MAGIC {
            return Err(ProtocolError::BadMagic(buf[0]));
        }
        let frame_type = FrameType::from_byte(buf[1]).ok_or(ProtocolError::UnknownFrameType(buf[1]))?;

        let declared = buf[3] as usize;
        let actual = buf.len() - HEADER_LEN;
        if declared != actual {
            return Err(ProtocolError::LengthInconsistent { declared, actual });
        }

        let packet_total = buf[4];
        let packet_index = buf[5];
        if packet_index == 0 || packet_index > packet_total {
            return Err(ProtocolError::InvalidPacketIndex {
                index: packet_index,
                total: packet_total,
            });
        }

        let payload = &buf[HEADER_LEN..buf.len() - CRC_LEN];
        let carried = u16::from_le_bytes([buf[buf.len() - 2], buf[buf.len() - 1]]);
        let computed = crc16(payload);
        if computed != carried {
            return Err(ProtocolError::CrcMismatch {
                expected: computed,
                actual: carried,
            });
        }

        Ok(Frame {
            frame_type,
            sequence: buf[2],
            packet_total,
            packet_index,
            service_id: ServiceId::new(buf[6], buf[7]),
            payload: payload.to_vec(),
        })
    }
}

/// Build one command frame.
pub fn build_frame(
    sequence: u8,
    service_id: ServiceId,
    payload: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let bytes = Frame::command(sequence, service_id, payload.to_vec()).encode()?;
    debug!(
        "built frame seq={} svc={} payload_len={}",
        sequence,
        service_id,
        payload.len()
    );
    trace!("frame bytes: {:02X?}", bytes);
    Ok(bytes)
}

/// Build the command frames for a payload, splitting it into chunks of at most
/// `max_payload` bytes.
///
/// All frames share `sequence`; each carries its own CRC over its own chunk.
pub fn build_frames(
    sequence: u8,
    service_id: ServiceId,
    payload: &[u8],
    max_payload: usize,
) -> Result<Vec<Vec<u8>>, ProtocolError> {
    if max_payload == 0 || max_payload > MAX_FRAME_PAYLOAD {
        return Err(ProtocolError::InvalidCommand(format!(
            "packet payload limit must be 1..={}, got {}",
            MAX_FRAME_PAYLOAD, max_payload
        )));
    }
    if payload.len() <= max_payload {
        return Ok(vec![build_frame(sequence, service_id, payload)?]);
    }

    let chunk_count = payload.len().div_ceil(max_payload);
    let total = u8::try_from(chunk_count).map_err(|_| ProtocolError::PayloadTooLarge {
        size: payload.len(),
        max: max_payload * u8::MAX as usize,
    })?;

    let frames = payload
        .chunks(max_payload)
        .zip(1..=total)
        .map(|(chunk, index)| {
            Frame {
                frame_type: FrameType::Command,
                sequence,
                packet_total: total,
                packet_index: index,
                service_id,
                payload: chunk.to_vec(),
            }
            .encode()
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "built {} frames seq={} svc={} payload_len={}",
        frames.len(),
        sequence,
        service_id,
        payload.len()
    );
    Ok(frames)
}

/// Parse and validate one frame.
pub fn parse_frame(buf: &[u8]) -> Result<Frame, ProtocolError> {
    Frame::parse(buf)
}
