//! Authentication handshake.
//!
//! Seven fixed frames are written in order with sequence numbers 1..=7,
//! 100 ms apart, followed by a 500 ms settle. The glasses send no per-step
//! acknowledgement that the handshake waits for, so `Complete` means "all
//! frames transmitted", not "accepted by the glasses".
//!
//! This module is the state machine only; waiting and writing belong to the
//! caller.

use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use crate::constants::*;
use crate::error::{AuthFailure, ProtocolError};
use crate::frame::build_frame;
use crate::types::ServiceId;
use crate::wire::FieldWriter;

/// Progress of one handshake attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum AuthState {
    /// Nothing written yet.
    NotStarted,
    /// Frames 1..=n have been written.
    StepSent(u8),
    /// All frames written and the settle delay elapsed.
    Complete,
    /// Terminal until a new handshake is started.
    Failed(#[serde(serialize_with = "serialize_failure")] AuthFailure),
}

fn serialize_failure<S: serde::Serializer>(failure: &AuthFailure, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(failure)
}

/// One frame to write and how long to wait afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStep {
    /// 1-based step number (also the frame's sequence number).
    pub step: u8,
    /// Encoded frame.
    pub frame: Vec<u8>,
    /// Wait after writing, before the next step (or before completing).
    pub delay_after: Duration,
}

/// Forward-only handshake state machine.
#[derive(Debug, Clone)]
pub struct AuthHandshake {
    state: AuthState,
    frames: Vec<Vec<u8>>,
}

impl AuthHandshake {
    /// Prepare a handshake embedding `unix_timestamp` (seconds).
    pub fn new(unix_timestamp: u64) -> Result<Self, ProtocolError> {
        Ok(AuthHandshake {
            state: AuthState::NotStarted,
            frames: build_auth_frames(unix_timestamp)?,
        })
    }

    /// Current state.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Whether the attempt has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, AuthState::Complete | AuthState::Failed(_))
    }

    fn steps_sent(&self) -> usize {
        match self.state {
            AuthState::NotStarted => 0,
            AuthState::StepSent(n) => n as usize,
            AuthState::Complete | AuthState::Failed(_) => AUTH_STEP_COUNT,
        }
    }

    /// The next frame to write, or `None` once all are sent or the attempt ended.
    pub fn next_step(&self) -> Option<AuthStep> {
        if self.is_terminal() {
            return None;
        }
        let sent = self.steps_sent();
        let frame = self.frames.get(sent)?.clone();
        let step = sent as u8 + 1;
        let delay_ms = if sent + 1 == AUTH_STEP_COUNT {
            AUTH_SETTLE_DELAY_MS
        } else {
            AUTH_INTER_PACKET_DELAY_MS
        };
        Some(AuthStep {
            step,
            frame,
            delay_after: Duration::from_millis(delay_ms),
        })
    }

    /// Record that the frame from [`next_step`](Self::next_step) was written.
    pub fn mark_sent(&mut self) {
        if self.is_terminal() || self.steps_sent() >= AUTH_STEP_COUNT {
            warn!("mark_sent ignored in state {:?}", self.state);
            return;
        }
        let step = self.steps_sent() as u8 + 1;
        debug!("auth step {}/{} sent", step, AUTH_STEP_COUNT);
        self.state = AuthState::StepSent(step);
    }

    /// Move to `Complete` once every frame was sent and the settle delay passed.
    ///
    /// Returns `false` (and changes nothing) if frames are still outstanding or
    /// the attempt already ended.
    pub fn complete(&mut self) -> bool {
        if self.state == AuthState::StepSent(AUTH_STEP_COUNT as u8) {
            self.state = AuthState::Complete;
            true
        } else {
            false
        }
    }

    /// Move an in-progress attempt to `Failed`.
    ///
    /// Returns `false` if the attempt had already ended.
    pub fn fail(&mut self, failure: AuthFailure) -> bool {
        if self.is_terminal() {
            return false;
        }
        warn!("auth failed in state {:?}: {}", self.state, failure);
        self.state = AuthState::Failed(failure);
        true
    }
}

fn capability_query(message_id: u32) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.varint(1, AUTH_TYPE_CAPABILITY_QUERY)
        .varint(2, message_id as u64)
        .message(3, |m| {
            m.varint(1, 1).varint(2, 4);
        });
    w.finish()
}

fn capability_response(message_id: u32, value: u64) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.varint(1, AUTH_TYPE_CAPABILITY_RESPONSE)
        .varint(2, message_id as u64)
        .message(4, |m| {
            m.varint(1, value);
        });
    w.finish()
}

fn time_sync(message_id: u32, unix_timestamp: u64) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.varint(1, AUTH_TYPE_TIME_SYNC)
        .varint(2, message_id as u64)
        .message(128, |m| {
            // The transaction ID is replayed verbatim as the field 2 value.
            m.varint(1, unix_timestamp)
                .key(2, crate::wire::WIRE_VARINT)
                .raw(&AUTH_TRANSACTION_ID);
        });
    w.finish()
}

/// Build the seven handshake frames.
pub fn build_auth_frames(unix_timestamp: u64) -> Result<Vec<Vec<u8>>, ProtocolError> {
    let ids = AUTH_MESSAGE_IDS;
    let steps: [(ServiceId, Vec<u8>); AUTH_STEP_COUNT] = [
        (ServiceId::AUTH_CONTROL, capability_query(ids[0])),
        (ServiceId::AUTH_DATA, capability_response(ids[1], 2)),
        (ServiceId::AUTH_DATA, time_sync(ids[2], unix_timestamp)),
        (ServiceId::AUTH_CONTROL, capability_query(ids[3])),
        (ServiceId::AUTH_CONTROL, capability_query(ids[4])),
        (ServiceId::AUTH_DATA, capability_response(ids[5], 1)),
        (ServiceId::AUTH_DATA, time_sync(ids[6], unix_timestamp)),
    ];

    steps
        .iter()
        .zip(1u8..)
        .map(|((service_id, payload), sequence)| build_frame(sequence, *service_id, payload))
        .collect()
}
