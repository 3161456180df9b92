//! G2 Display Glasses BLE Protocol
//!
//! This crate provides the wire codec and session state machine for talking to
//! G2 display glasses over Bluetooth LE. It performs no I/O: outbound commands
//! become byte buffers to write, inbound notifications are byte buffers to
//! hand back in.
//!
//! # Protocol Overview
//!
//! Every write and notification carries one CRC-protected frame (see
//! [`Frame`]). Frames are routed by a two-byte service ID; their payloads are
//! sequences of tag/value records. A connection starts with a fixed seven-frame
//! authentication handshake, after which commands draw sequence numbers and
//! message IDs from a per-connection [`SessionSequencer`].
//!
//! Frames sent by the glasses are one of:
//!
//! - **Auth responses** on the auth services
//! - **Gestures** from the touch bar
//! - **Speech transcripts** from the on-board speech recogniser
//! - Anything else, passed through as opaque records
//!
//! # Example
//!
//! ```rust,ignore
//! use g2_protocol::{teleprompter_plan, InboundDecoder, ProtocolSession, ScrollMode};
//!
//! let mut session = ProtocolSession::default();
//! for command in teleprompter_plan("Hello from the glasses", ScrollMode::Manual) {
//!     for frame in session.next_outbound_frames(&command)? {
//!         link.write(&frame)?;
//!     }
//! }
//!
//! let mut decoder = InboundDecoder::new();
//! if let Some(event) = decoder.deliver_bytes(&notification)? {
//!     println!("{:?}", event);
//! }
//! ```

mod assembler;
mod auth;
mod commands;
mod constants;
mod crc;
mod error;
mod events;
mod frame;
mod paginate;
mod sequencer;
mod session;
mod types;
mod varint;
mod wire;

pub use assembler::*;
pub use auth::*;
pub use commands::*;
pub use constants::*;
pub use crc::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use paginate::*;
pub use sequencer::*;
pub use session::*;
pub use types::*;
pub use varint::*;
pub use wire::*;
