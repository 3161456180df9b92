//! BLE link abstraction.
//!
//! The session never touches Bluetooth directly. A transport adapter (or a
//! simulator, or a test) sits on the other end of a pair of channels: frames
//! the session writes come out of [`LinkPeer::recv_write`], and notifications
//! and connection changes go in through [`LinkPeer::notify`],
//! [`LinkPeer::connected`] and [`LinkPeer::disconnected`].

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::error::SessionError;

// ============================================================================
// Types
// ============================================================================

/// Something the transport reports to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link came up.
    Connected,
    /// The link went down.
    Disconnected(String),
    /// A notification arrived on the notify characteristic.
    Notification(Vec<u8>),
}

/// Whether the link is currently usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Connected; frames can be written.
    Up,
    /// Disconnected, with the transport's reason.
    Down(String),
}

/// Session side of a link, before it is split between sender and receiver.
pub struct BleLink {
    writer: LinkWriter,
    events: mpsc::Receiver<LinkEvent>,
}

impl BleLink {
    /// Create a link and the transport-side peer that drives it.
    pub fn pair(capacity: usize) -> (BleLink, LinkPeer) {
        let (write_tx, write_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let link = BleLink {
            writer: LinkWriter { tx: write_tx },
            events: event_rx,
        };
        let peer = LinkPeer {
            writes: write_rx,
            events: event_tx,
        };
        (link, peer)
    }

    /// Separate the write half (for the session) from the event half (for the
    /// receiver task).
    pub fn split(self) -> (LinkWriter, mpsc::Receiver<LinkEvent>) {
        (self.writer, self.events)
    }
}

/// Write half of a link.
#[derive(Debug, Clone)]
pub struct LinkWriter {
    tx: mpsc::Sender<Vec<u8>>,
}

impl LinkWriter {
    /// Queue one frame for writing.
    ///
    /// Waits while the transport is backed up; fails once it has gone away.
    pub async fn write(&self, frame: Vec<u8>) -> Result<(), SessionError> {
        self.tx.send(frame).await.map_err(|_| SessionError::LinkClosed)
    }

    /// Whether the transport side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Transport side of a link.
pub struct LinkPeer {
    writes: mpsc::Receiver<Vec<u8>>,
    events: mpsc::Sender<LinkEvent>,
}

impl LinkPeer {
    /// Next frame the session wrote, or `None` once the session is gone.
    pub async fn recv_write(&mut self) -> Option<Vec<u8>> {
        self.writes.recv().await
    }

    /// A frame the session wrote, if one is waiting.
    pub fn try_recv_write(&mut self) -> Option<Vec<u8>> {
        self.writes.try_recv().ok()
    }

    /// Deliver a notification.
    pub async fn notify(&self, bytes: Vec<u8>) -> Result<(), SessionError> {
        self.send(LinkEvent::Notification(bytes)).await
    }

    /// Report that the link came up.
    pub async fn connected(&self) -> Result<(), SessionError> {
        self.send(LinkEvent::Connected).await
    }

    /// Report that the link went down.
    pub async fn disconnected(&self, reason: impl Into<String>) -> Result<(), SessionError> {
        self.send(LinkEvent::Disconnected(reason.into())).await
    }

    /// Stop accepting writes, as a transport would after a write failure.
    pub fn close_writes(&mut self) {
        self.writes.close();
    }

    async fn send(&self, event: LinkEvent) -> Result<(), SessionError> {
        self.events.send(event).await.map_err(|_| SessionError::LinkClosed)
    }
}

// ============================================================================
// Link status
// ============================================================================

/// Shared, lock-free view of the link status.
///
/// The receiver task updates it as connection events arrive; the session
/// checks it before writing and watches it during the handshake so a
/// disconnect aborts the attempt without waiting for the session lock.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    status: Arc<watch::Sender<LinkStatus>>,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        LinkMonitor {
            status: Arc::new(watch::Sender::new(LinkStatus::Up)),
        }
    }
}

impl LinkMonitor {
    /// A monitor that starts with the link up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the link up. Does not notify watchers if it already was.
    pub fn up(&self) {
        self.status.send_if_modified(|status| {
            if *status == LinkStatus::Up {
                false
            } else {
                *status = LinkStatus::Up;
                true
            }
        });
    }

    /// Mark the link down with `reason`.
    pub fn down(&self, reason: impl Into<String>) {
        self.status.send_replace(LinkStatus::Down(reason.into()));
    }

    /// Current status.
    pub fn status(&self) -> LinkStatus {
        self.status.borrow().clone()
    }

    /// Whether the link is currently up.
    pub fn is_up(&self) -> bool {
        *self.status.borrow() == LinkStatus::Up
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }
}

/// Resolve once `status` reports the link down, with the reason.
pub(crate) async fn link_lost(status: &mut watch::Receiver<LinkStatus>) -> String {
    loop {
        let down = match &*status.borrow_and_update() {
            LinkStatus::Down(reason) => Some(reason.clone()),
            LinkStatus::Up => None,
        };
        if let Some(reason) = down {
            return reason;
        }
        if status.changed().await.is_err() {
            // Monitor dropped: the status can no longer change.
            return std::future::pending().await;
        }
    }
}
