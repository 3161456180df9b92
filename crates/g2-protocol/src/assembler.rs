//! Reassembly of multi-packet messages.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::frame::Frame;
use crate::types::ServiceId;

/// Partial messages kept at once; the oldest is dropped beyond this.
pub const MAX_PENDING_MESSAGES: usize = 8;

#[derive(Debug)]
struct PartialMessage {
    sequence: u8,
    service_id: ServiceId,
    template: Frame,
    parts: Vec<Option<Vec<u8>>>,
    received: usize,
}

impl PartialMessage {
    fn start(frame: &Frame) -> Self {
        PartialMessage {
            sequence: frame.sequence,
            service_id: frame.service_id,
            template: Frame {
                payload: Vec::new(),
                ..frame.clone()
            },
            parts: vec![None; frame.packet_total as usize],
            received: 0,
        }
    }

    fn matches(&self, frame: &Frame) -> bool {
        self.sequence == frame.sequence && self.service_id == frame.service_id
    }

    fn is_complete(&self) -> bool {
        self.received == self.parts.len()
    }

    fn into_frame(self) -> Frame {
        let payload = self.parts.into_iter().flatten().flatten().collect();
        Frame {
            packet_total: 1,
            packet_index: 1,
            payload,
            ..self.template
        }
    }
}

/// Joins frames that share a sequence number and service into one logical frame.
///
/// Owned by the inbound side; holds no state shared with the send path.
#[derive(Debug, Default)]
pub struct MessageAssembler {
    pending: VecDeque<PartialMessage>,
}

impl MessageAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        MessageAssembler {
            pending: VecDeque::new(),
        }
    }

    /// Add a validated frame.
    ///
    /// Returns the complete message once every packet has arrived. Single-packet
    /// frames come straight back.
    pub fn push(&mut self, frame: Frame) -> Option<Frame> {
        if !frame.is_multi_packet() {
            return Some(frame);
        }

        let position = self.pending.iter().position(|p| p.matches(&frame));
        let position = match position {
            Some(i) if self.pending[i].parts.len() == frame.packet_total as usize => i,
            Some(i) => {
                debug!(
                    "packet total changed for seq={} svc={}, restarting assembly",
                    frame.sequence, frame.service_id
                );
                self.pending[i] = PartialMessage::start(&frame);
                i
            }
            None => {
                if self.pending.len() == MAX_PENDING_MESSAGES {
                    if let Some(evicted) = self.pending.pop_front() {
                        warn!(
                            "dropping incomplete message seq={} svc={} ({}/{} packets)",
                            evicted.sequence,
                            evicted.service_id,
                            evicted.received,
                            evicted.parts.len()
                        );
                    }
                }
                self.pending.push_back(PartialMessage::start(&frame));
                self.pending.len() - 1
            }
        };

        let partial = &mut self.pending[position];
        let slot = &mut partial.parts[frame.packet_index as usize - 1];
        if slot.is_none() {
            partial.received += 1;
        } else {
            debug!(
                "duplicate packet {} for seq={} svc={}",
                frame.packet_index, frame.sequence, frame.service_id
            );
        }
        *slot = Some(frame.payload);

        if partial.is_complete() {
            self.pending.remove(position).map(PartialMessage::into_frame)
        } else {
            None
        }
    }

    /// Number of incomplete messages held.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop every incomplete message.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
