//! G2 Glasses Session Manager
//!
//! Async wrapper around [`g2_protocol`] for one BLE connection to a pair of G2
//! display glasses.
//!
//! The send side is a [`GlassesSession`]: it authenticates, then sends
//! commands one at a time under a lock. The receive side is a separate task
//! started with [`spawn_receiver`] that turns notifications into
//! [`DecodedEvent`](g2_protocol::DecodedEvent)s. Both ends talk to the
//! transport through a [`BleLink`].
//!
//! # Example
//!
//! ```rust,ignore
//! use g2_session::{spawn_receiver, BleLink, GlassesSession, LinkMonitor, SessionConfig};
//!
//! let config = SessionConfig::load("g2.yaml")?;
//! let (link, peer) = BleLink::pair(64);
//! // hand `peer` to the BLE transport adapter
//!
//! let (writer, link_events) = link.split();
//! let monitor = LinkMonitor::new();
//! let mut receiver = spawn_receiver(
//!     link_events,
//!     monitor.clone(),
//!     config.event_channel_capacity,
//!     config.diagnostic_log_capacity,
//! );
//! let session = GlassesSession::new(writer, monitor, config)?;
//!
//! session.connect().await?;
//! session.show_text("Hello from the glasses").await?;
//! while let Some(event) = receiver.events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

pub mod config;
pub mod error;
pub mod handshake;
pub mod link;
pub mod manager;
pub mod metrics;
pub mod receiver;

pub use config::SessionConfig;
pub use error::SessionError;
pub use handshake::{drive_handshake, handshake_duration};
pub use link::{BleLink, LinkEvent, LinkMonitor, LinkPeer, LinkStatus, LinkWriter};
pub use manager::GlassesSession;
pub use receiver::{spawn_receiver, DiagnosticEntry, DiagnosticLog, ReceiverHandle};
