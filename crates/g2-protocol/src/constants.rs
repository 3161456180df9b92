//! Protocol constants
//!
//! Frame layout values, service-ID categories, display geometry and the fixed
//! values used by the authentication handshake. Everything here was captured
//! from device traffic; several values have no confirmed meaning.

// ============================================================================
// Frame Layout
// ============================================================================

/// First byte of every frame.
pub const FRAME_MAGIC: u8 = 0xAA;
/// Frame type byte for host → glasses commands.
pub const FRAME_TYPE_COMMAND: u8 = 0x21;
/// Frame type byte for glasses → host responses and notifications.
pub const FRAME_TYPE_RESPONSE: u8 = 0x12;

/// Size of the fixed frame header.
pub const HEADER_LEN: usize = 8;
/// Size of the trailing CRC.
pub const CRC_LEN: usize = 2;
/// Smallest possible frame (header + CRC, empty payload).
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CRC_LEN;

/// Largest payload a single frame can carry. The length byte holds payload + CRC.
pub const MAX_FRAME_PAYLOAD: usize = u8::MAX as usize - CRC_LEN;

/// Default payload chunk size for multi-packet messages.
///
/// A 247-byte ATT MTU leaves 244 writable bytes, minus the 10 bytes of framing.
pub const DEFAULT_MAX_PACKET_PAYLOAD: usize = 234;

// ============================================================================
// CRC / Varint
// ============================================================================

/// CRC-16/CCITT initial register value.
pub const CRC16_INIT: u16 = 0xFFFF;
/// CRC-16/CCITT generator polynomial.
pub const CRC16_POLY: u16 = 0x1021;

/// A u64 never needs more than 10 base-128 groups.
pub const MAX_VARINT_LEN: usize = 10;

// ============================================================================
// Service Categories (first service-ID byte)
// ============================================================================

/// Gesture notifications from the touch bars.
pub const SVC_GESTURE: u8 = 0x01;
/// Display wake.
pub const SVC_DISPLAY_WAKE: u8 = 0x04;
/// Teleprompter content stream.
pub const SVC_TELEPROMPTER: u8 = 0x06;
/// Dashboard widgets.
pub const SVC_DASHBOARD: u8 = 0x07;
/// Device information.
pub const SVC_DEVICE_INFO: u8 = 0x09;
/// On-device speech-to-text ("conversate").
pub const SVC_CONVERSATE: u8 = 0x0B;
/// Task list.
pub const SVC_TASKS: u8 = 0x0C;
/// Device configuration.
pub const SVC_CONFIGURATION: u8 = 0x0D;
/// Display configuration.
pub const SVC_DISPLAY_CONFIG: u8 = 0x0E;
/// Secondary speech-to-text channel.
pub const SVC_CONVERSATE_ALT: u8 = 0x11;
/// Commit.
pub const SVC_COMMIT: u8 = 0x20;
/// Authentication control and sync.
pub const SVC_AUTH: u8 = 0x80;
/// Display trigger; also carries gesture notifications.
pub const SVC_DISPLAY_TRIGGER: u8 = 0x81;

/// Subcategory used by control-plane services.
pub const SUB_CONTROL: u8 = 0x00;
/// Subcategory used by gesture notifications.
pub const SUB_GESTURE: u8 = 0x01;
/// Subcategory used by data-plane services.
pub const SUB_DATA: u8 = 0x20;

// ============================================================================
// Command Types (field 1 of every payload)
// ============================================================================

/// Display wake request.
pub const CMD_TYPE_DISPLAY_WAKE: u64 = 1;
/// Display configuration blob.
pub const CMD_TYPE_DISPLAY_CONFIG: u64 = 2;
/// Teleprompter initialisation.
pub const CMD_TYPE_TELEPROMPTER_INIT: u64 = 1;
/// One page of teleprompter content.
pub const CMD_TYPE_CONTENT_PAGE: u64 = 3;
/// End of teleprompter content.
pub const CMD_TYPE_CONTENT_COMPLETE: u64 = 4;
/// Gesture notification configuration.
pub const CMD_TYPE_GESTURE_CONFIG: u64 = 7;
/// Sync trigger sent on the auth service after content.
pub const CMD_TYPE_SYNC_TRIGGER: u64 = 14;
/// Marker the firmware requires after page 9.
pub const CMD_TYPE_MID_STREAM_MARKER: u64 = 255;

/// Auth capability query.
pub const AUTH_TYPE_CAPABILITY_QUERY: u64 = 4;
/// Auth capability response.
pub const AUTH_TYPE_CAPABILITY_RESPONSE: u64 = 5;
/// Auth time sync.
pub const AUTH_TYPE_TIME_SYNC: u64 = 128;

// ============================================================================
// Display Geometry
// ============================================================================

/// Characters per display line.
pub const LINE_WIDTH: usize = 25;
/// Lines per display page.
pub const LINES_PER_PAGE: usize = 10;
/// The firmware expects at least this many pages per content stream.
pub const MIN_PAGES: usize = 14;
/// Index of the last page before the mid-stream marker must be sent.
pub const MID_STREAM_MARKER_AFTER_PAGE: usize = 9;

/// Numerator of the content-height formula.
pub const CONTENT_HEIGHT_SCALE: u64 = 2665;
/// Denominator of the content-height formula.
pub const CONTENT_HEIGHT_BASE_LINES: u64 = 140;

/// Minimum spacing between content pages on the wire.
pub const MIN_PAGE_SPACING_MS: u64 = 50;

// ============================================================================
// Gestures
// ============================================================================

/// Single tap.
pub const GESTURE_TAP: u8 = 0x01;
/// Double tap.
pub const GESTURE_DOUBLE_TAP: u8 = 0x02;
/// Swipe towards the front of the temple.
pub const GESTURE_SWIPE_FORWARD: u8 = 0x03;
/// Swipe towards the back of the temple.
pub const GESTURE_SWIPE_BACKWARD: u8 = 0x04;
/// Long press.
pub const GESTURE_LONG_PRESS: u8 = 0x05;

/// Only this value byte confirms a gesture.
pub const GESTURE_CONFIRMED: u8 = 0x01;

// ============================================================================
// Authentication
// ============================================================================

/// Number of frames in the handshake.
pub const AUTH_STEP_COUNT: usize = 7;

/// Delay between consecutive handshake frames.
pub const AUTH_INTER_PACKET_DELAY_MS: u64 = 100;
/// Delay after the last handshake frame before the session is usable.
pub const AUTH_SETTLE_DELAY_MS: u64 = 500;

/// Message IDs used by handshake steps 1 through 7.
pub const AUTH_MESSAGE_IDS: [u32; AUTH_STEP_COUNT] = [0x0C, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x13];

/// Transaction identifier embedded in both time-sync steps.
pub const AUTH_TRANSACTION_ID: [u8; 10] = [0xE8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];

/// First sequence number after the handshake.
pub const POST_AUTH_SEQUENCE: u8 = 8;
/// First message ID after the handshake.
pub const POST_AUTH_MESSAGE_ID: u32 = 0x14;

// ============================================================================
// Display Configuration
// ============================================================================

/// Display configuration captured from the companion app. Meaning unknown.
pub const DISPLAY_CONFIG_BLOB: [u8; 57] = [
    0x08, 0x01, 0x12, 0x13, 0x08, 0x02, 0x10, 0x90, 0x4E, 0x1D, 0x00, 0xE0, 0x94, 0x44, 0x25,
    0x00, 0x00, 0x00, 0x00, 0x28, 0x00, 0x30, 0x00, 0x12, 0x12, 0x08, 0x03, 0x10, 0x0D, 0x1D,
    0x00, 0x40, 0x8D, 0x44, 0x25, 0x00, 0x00, 0x00, 0x00, 0x28, 0x00, 0x30, 0x00, 0x12, 0x04,
    0x08, 0x04, 0x10, 0x00, 0x12, 0x04, 0x08, 0x05, 0x10, 0x00, 0x18, 0x00,
];
