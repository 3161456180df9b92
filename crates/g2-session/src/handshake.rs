//! Async driver for the authentication handshake.
//!
//! Walks a [`AuthHandshake`] to completion over a [`LinkWriter`], sleeping
//! between frames. The whole run is bounded by the connect timeout and aborts
//! as soon as the link is reported down. Once a frame is written the
//! following wait is not cut short by anything but those two.

use std::time::Duration;

use g2_protocol::{AuthFailure, AuthHandshake, AUTH_STEP_COUNT};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::link::{link_lost, LinkStatus, LinkWriter};
use crate::metrics::metric_defs;

/// Run `handshake` to `Complete` or `Failed`.
///
/// On failure the handshake is left in `Failed` and the reason is returned.
pub async fn drive_handshake(
    handshake: &mut AuthHandshake,
    writer: &LinkWriter,
    status: &mut watch::Receiver<LinkStatus>,
    config: &SessionConfig,
) -> Result<(), AuthFailure> {
    let started = Instant::now();
    let budget = config.connect_timeout();

    let outcome = tokio::time::timeout(budget, async {
        tokio::select! {
            result = send_steps(handshake, writer, config) => result,
            reason = link_lost(status) => Err(AuthFailure::Disconnected { reason }),
        }
    })
    .await
    .unwrap_or_else(|_| {
        Err(AuthFailure::Timeout {
            elapsed_ms: budget.as_millis() as u64,
        })
    });

    match outcome {
        Ok(()) => {
            handshake.complete();
            let elapsed = started.elapsed();
            info!("handshake transmitted in {} ms", elapsed.as_millis());
            metrics::counter!(metric_defs::AUTH_COMPLETED.name).increment(1);
            metrics::histogram!(metric_defs::AUTH_DURATION.name).record(elapsed.as_secs_f64() * 1000.0);
            Ok(())
        }
        Err(failure) => {
            warn!("handshake failed: {}", failure);
            metrics::counter!(metric_defs::AUTH_FAILED.name, "reason" => failure_label(&failure))
                .increment(1);
            handshake.fail(failure.clone());
            Err(failure)
        }
    }
}

async fn send_steps(
    handshake: &mut AuthHandshake,
    writer: &LinkWriter,
    config: &SessionConfig,
) -> Result<(), AuthFailure> {
    while let Some(step) = handshake.next_step() {
        trace!("auth step {} bytes: {}", step.step, hex::encode(&step.frame));
        writer
            .write(step.frame)
            .await
            .map_err(|e| AuthFailure::TransportFailure {
                step: step.step,
                reason: e.to_string(),
            })?;
        handshake.mark_sent();
        metrics::counter!(metric_defs::FRAMES_SENT.name, "service" => "auth").increment(1);

        let configured = if step.step as usize == AUTH_STEP_COUNT {
            config.settle_delay()
        } else {
            config.inter_packet_delay()
        };
        let wait = step.delay_after.max(configured);
        debug!("auth step {}/{} sent, waiting {:?}", step.step, AUTH_STEP_COUNT, wait);
        tokio::time::sleep(wait).await;
    }
    Ok(())
}

fn failure_label(failure: &AuthFailure) -> &'static str {
    match failure {
        AuthFailure::Timeout { .. } => "timeout",
        AuthFailure::TransportFailure { .. } => "transport",
        AuthFailure::Disconnected { .. } => "disconnected",
    }
}

/// Minimum time a successful handshake takes with `config`.
pub fn handshake_duration(config: &SessionConfig) -> Duration {
    config.inter_packet_delay() * (AUTH_STEP_COUNT as u32 - 1) + config.settle_delay()
}
