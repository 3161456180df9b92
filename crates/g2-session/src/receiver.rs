//! Inbound notification handling.
//!
//! The receiver runs as its own task so notifications keep flowing while the
//! session is busy sending (a long teleprompter stream holds the session lock
//! for seconds). It shares nothing with the send path except the
//! [`LinkMonitor`].

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use g2_protocol::{DecodedEvent, InboundDecoder, ProtocolError};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::link::{LinkEvent, LinkMonitor};
use crate::metrics::metric_defs;

// ============================================================================
// Diagnostic log
// ============================================================================

/// One dropped inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    /// When the frame arrived.
    pub received_at: DateTime<Utc>,
    /// Error kind, e.g. `crc_mismatch`.
    pub kind: &'static str,
    /// Full error message.
    pub detail: String,
    /// The raw notification, hex encoded.
    pub raw_hex: String,
}

/// Bounded log of invalid frames, oldest dropped first.
///
/// Frame errors never reach the application as errors; this is where they go
/// instead, for protocol debugging.
#[derive(Debug)]
pub struct DiagnosticLog {
    capacity: usize,
    entries: Mutex<VecDeque<DiagnosticEntry>>,
}

impl DiagnosticLog {
    /// A log holding at most `capacity` entries. Zero disables it.
    pub fn new(capacity: usize) -> Self {
        DiagnosticLog {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record a dropped frame.
    pub fn record(&self, error: &ProtocolError, raw: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        let entry = DiagnosticEntry {
            received_at: Utc::now(),
            kind: error.kind(),
            detail: error.to_string(),
            raw_hex: hex::encode(raw),
        };
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copy of the current entries, oldest first.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no frame has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

// ============================================================================
// Receiver task
// ============================================================================

/// Handle to a running receiver task.
pub struct ReceiverHandle {
    /// Decoded events, in arrival order.
    pub events: mpsc::Receiver<DecodedEvent>,
    /// Frames that were dropped as invalid.
    pub diagnostics: Arc<DiagnosticLog>,
    task: JoinHandle<()>,
}

impl ReceiverHandle {
    /// Stop the task.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the task to finish (when the link or the event consumer goes away).
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                warn!("receiver task failed: {}", e);
            }
        }
    }
}

/// Spawn the inbound side of a session.
///
/// Connection changes update `monitor`; notifications are validated, reassembled
/// and decoded, and the resulting events are sent on a channel of
/// `event_capacity`. The task ends when the link's event stream ends or the
/// event receiver is dropped.
pub fn spawn_receiver(
    link_events: mpsc::Receiver<LinkEvent>,
    monitor: LinkMonitor,
    event_capacity: usize,
    diagnostic_capacity: usize,
) -> ReceiverHandle {
    let (tx, rx) = mpsc::channel(event_capacity.max(1));
    let diagnostics = Arc::new(DiagnosticLog::new(diagnostic_capacity));
    let task = tokio::spawn(run_receiver(link_events, monitor, tx, diagnostics.clone()));
    ReceiverHandle {
        events: rx,
        diagnostics,
        task,
    }
}

async fn run_receiver(
    mut link_events: mpsc::Receiver<LinkEvent>,
    monitor: LinkMonitor,
    tx: mpsc::Sender<DecodedEvent>,
    diagnostics: Arc<DiagnosticLog>,
) {
    let mut decoder = InboundDecoder::new();

    while let Some(event) = link_events.recv().await {
        match event {
            LinkEvent::Connected => {
                info!("link up");
                decoder.reset();
                monitor.up();
            }
            LinkEvent::Disconnected(reason) => {
                info!("link down: {}", reason);
                decoder.reset();
                monitor.down(reason);
            }
            LinkEvent::Notification(bytes) => {
                metrics::counter!(metric_defs::FRAMES_RECEIVED.name).increment(1);
                trace!("notification: {}", hex::encode(&bytes));
                match decoder.deliver_bytes(&bytes) {
                    Ok(Some(event)) => {
                        metrics::counter!(metric_defs::EVENTS_DECODED.name, "kind" => event.kind())
                            .increment(1);
                        if tx.send(event).await.is_err() {
                            debug!("event consumer gone, stopping receiver");
                            return;
                        }
                    }
                    Ok(None) => {
                        trace!("partial message, {} pending", decoder.pending());
                    }
                    Err(e) => {
                        metrics::counter!(metric_defs::FRAMES_DROPPED.name, "reason" => e.kind())
                            .increment(1);
                        diagnostics.record(&e, &bytes);
                    }
                }
            }
        }
    }

    monitor.down("link closed");
    debug!("link event stream ended");
}
