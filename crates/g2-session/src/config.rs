//! Session configuration.
//!
//! Timing and sizing knobs for a session, loaded from YAML. Display geometry
//! and service IDs are fixed by the firmware and live in `g2_protocol`
//! constants instead.

use std::path::Path;
use std::time::Duration;

use g2_protocol::{
    ScrollMode, AUTH_INTER_PACKET_DELAY_MS, AUTH_SETTLE_DELAY_MS, DEFAULT_MAX_PACKET_PAYLOAD,
    MAX_FRAME_PAYLOAD, MIN_PAGE_SPACING_MS,
};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Configuration for a [`GlassesSession`](crate::GlassesSession).
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// connect_timeout_ms: 10000
/// scroll_mode: auto
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Wait between handshake frames (milliseconds). Never shorter than 100.
    pub inter_packet_delay_ms: u64,

    /// Wait after the last handshake frame (milliseconds). Never shorter than 500.
    pub settle_delay_ms: u64,

    /// Budget for the whole handshake (milliseconds).
    pub connect_timeout_ms: u64,

    /// Wait after each content page (milliseconds). Never shorter than 50.
    pub page_delay_ms: u64,

    /// Largest payload per frame before a message is split.
    /// Defaults to what fits a 247-byte ATT MTU.
    pub max_packet_payload: usize,

    /// Invalid frames kept for inspection; 0 disables the log.
    pub diagnostic_log_capacity: usize,

    /// Decoded events buffered for the application.
    pub event_channel_capacity: usize,

    /// Scrolling used by `show_text`.
    pub scroll_mode: ScrollMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            inter_packet_delay_ms: AUTH_INTER_PACKET_DELAY_MS,
            settle_delay_ms: AUTH_SETTLE_DELAY_MS,
            connect_timeout_ms: 15_000,
            page_delay_ms: MIN_PAGE_SPACING_MS,
            max_packet_payload: DEFAULT_MAX_PACKET_PAYLOAD,
            diagnostic_log_capacity: 256,
            event_channel_capacity: 64,
            scroll_mode: ScrollMode::Manual,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the protocol or the runtime cannot work with.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.max_packet_payload == 0 || self.max_packet_payload > MAX_FRAME_PAYLOAD {
            return Err(SessionError::Config(format!(
                "max_packet_payload must be 1..={}, got {}",
                MAX_FRAME_PAYLOAD, self.max_packet_payload
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(SessionError::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(SessionError::Config(
                "event_channel_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Handshake inter-frame wait, clamped to the protocol minimum.
    pub fn inter_packet_delay(&self) -> Duration {
        Duration::from_millis(self.inter_packet_delay_ms.max(AUTH_INTER_PACKET_DELAY_MS))
    }

    /// Handshake settle wait, clamped to the protocol minimum.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.max(AUTH_SETTLE_DELAY_MS))
    }

    /// Content page wait, clamped to the protocol minimum.
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms.max(MIN_PAGE_SPACING_MS))
    }

    /// Budget for the whole handshake.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
