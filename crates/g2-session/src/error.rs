//! Session error types.

use g2_protocol::{AuthFailure, ProtocolError};
use thiserror::Error;

/// Errors surfaced to the owner of a [`GlassesSession`](crate::GlassesSession).
///
/// The `Display` text is meant to be shown to the user as the reason a
/// connection attempt or command failed.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A frame or command was rejected by the codec.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The handshake did not complete.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    /// The link is down or the handshake has not completed on it.
    #[error("no authenticated connection to the glasses")]
    NotConnected,

    /// The transport side of the link has gone away.
    #[error("link to the glasses is closed")]
    LinkClosed,

    /// A configuration value is out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid YAML for [`SessionConfig`](crate::SessionConfig).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
