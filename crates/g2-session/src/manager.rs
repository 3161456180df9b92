//! Session manager.
//!
//! [`GlassesSession`] owns the send side of one connection. Every operation
//! takes the session lock for its whole duration, so a multi-frame operation
//! (the handshake, a teleprompter stream) is never interleaved with another
//! command and sequence numbers are never reused.

use std::sync::Arc;

use g2_protocol::{teleprompter_plan, AuthState, Command, ProtocolSession};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::handshake::drive_handshake;
use crate::link::{link_lost, LinkMonitor, LinkStatus, LinkWriter};
use crate::metrics::metric_defs;

struct SessionInner {
    protocol: ProtocolSession,
    writer: LinkWriter,
    status: watch::Receiver<LinkStatus>,
    /// Whether `protocol` last saw the link up.
    link_up: bool,
}

impl SessionInner {
    /// Bring `protocol` in line with the link status. Returns whether the link
    /// is usable.
    ///
    /// A change that ends in `Up` while we still believed the link up means it
    /// dropped and came back in between, which also ends the connection.
    fn sync_link(&mut self) -> bool {
        let changed = self.status.has_changed().unwrap_or(false);
        let current = self.status.borrow_and_update().clone();
        match current {
            LinkStatus::Up => {
                if changed && self.link_up {
                    self.protocol.on_disconnected("link restarted");
                }
                self.link_up = true;
            }
            LinkStatus::Down(reason) => {
                if self.link_up {
                    self.protocol.on_disconnected(&reason);
                    self.link_up = false;
                }
            }
        }
        self.link_up && !self.writer.is_closed()
    }

    /// The link is up and this connection is authenticated.
    fn ensure_ready(&mut self) -> Result<(), SessionError> {
        if !self.sync_link() || !self.protocol.is_authenticated() {
            return Err(SessionError::NotConnected);
        }
        Ok(())
    }

    /// Write `frames` in order, stopping at the first one that would go out
    /// after the connection they were numbered for has ended.
    async fn write_frames(&mut self, frames: Vec<Vec<u8>>, service: String) -> Result<usize, SessionError> {
        let count = frames.len();
        for frame in frames {
            self.ensure_ready()?;
            trace!("write {}", hex::encode(&frame));
            self.writer.write(frame).await?;
            metrics::counter!(metric_defs::FRAMES_SENT.name, "service" => service.clone()).increment(1);
        }
        Ok(count)
    }
}

/// One connection to a pair of glasses.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct GlassesSession {
    inner: Arc<Mutex<SessionInner>>,
    monitor: LinkMonitor,
    config: Arc<SessionConfig>,
}

impl GlassesSession {
    /// Create a session writing through `writer`.
    ///
    /// `monitor` must be the one given to the receiver task for this link.
    pub fn new(writer: LinkWriter, monitor: LinkMonitor, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let protocol = ProtocolSession::new(config.max_packet_payload)?;
        Ok(GlassesSession {
            inner: Arc::new(Mutex::new(SessionInner {
                protocol,
                writer,
                status: monitor.subscribe(),
                link_up: monitor.is_up(),
            })),
            monitor,
            config: Arc::new(config),
        })
    }

    /// Configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Link status shared with the receiver task.
    pub fn monitor(&self) -> &LinkMonitor {
        &self.monitor
    }

    /// Authenticate using the current wall-clock time.
    pub async fn connect(&self) -> Result<(), SessionError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.connect_at(now).await
    }

    /// Authenticate, embedding `unix_timestamp` in the time-sync frames.
    ///
    /// Resets the counters and runs the full handshake under the connect
    /// timeout. A failure leaves the handshake `Failed` until the next call.
    pub async fn connect_at(&self, unix_timestamp: u64) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        if !inner.sync_link() {
            return Err(SessionError::NotConnected);
        }

        info!("starting handshake");
        let mut status = self.monitor.subscribe();
        let SessionInner {
            protocol, writer, ..
        } = &mut *inner;
        let handshake = protocol.on_connected(unix_timestamp)?;
        drive_handshake(handshake, writer, &mut status, &self.config).await?;
        Ok(())
    }

    /// Send one command. Returns the number of frames written.
    pub async fn send(&self, command: &Command) -> Result<usize, SessionError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_ready()?;
        let frames = inner.protocol.next_outbound_frames(command)?;
        debug!("sending {} ({} frame(s))", command.name(), frames.len());
        inner
            .write_frames(frames, command.service_id().to_string())
            .await
    }

    /// Put `text` on the teleprompter. Returns the number of pages sent.
    ///
    /// The whole stream goes out under one lock, with the configured page
    /// delay after every content page. If the link drops part way, the rest
    /// of the stream is abandoned and `NotConnected` is returned.
    pub async fn show_text(&self, text: &str) -> Result<usize, SessionError> {
        let plan = teleprompter_plan(text, self.config.scroll_mode);
        let page_delay = self.config.page_delay();

        let mut inner = self.inner.lock().await;
        inner.ensure_ready()?;
        let mut status = self.monitor.subscribe();

        let mut pages = 0;
        for command in &plan {
            inner.ensure_ready()?;
            let frames = inner.protocol.next_outbound_frames(command)?;
            inner
                .write_frames(frames, command.service_id().to_string())
                .await?;
            if matches!(command, Command::ContentPage { .. }) {
                pages += 1;
                tokio::select! {
                    _ = tokio::time::sleep(page_delay) => {}
                    reason = link_lost(&mut status) => {
                        warn!("link lost after {} pages: {}", pages, reason);
                        inner.sync_link();
                        return Err(SessionError::NotConnected);
                    }
                }
            }
        }
        info!("teleprompter stream sent: {} pages", pages);
        Ok(pages)
    }

    /// The transport reported the link up. Call [`connect`](Self::connect) next.
    pub fn on_connected(&self) {
        self.monitor.up();
    }

    /// The transport reported the link down.
    ///
    /// Aborts a running handshake immediately, then resets the counters once
    /// the session lock is free.
    pub async fn on_disconnected(&self, reason: &str) {
        warn!("link lost: {}", reason);
        self.monitor.down(reason);
        let mut inner = self.inner.lock().await;
        inner.sync_link();
    }

    /// Handshake state of the current connection.
    pub async fn auth_state(&self) -> AuthState {
        let mut inner = self.inner.lock().await;
        inner.sync_link();
        inner.protocol.auth_state()
    }

}
