//! Metric declarations.
//!
//! Each metric is declared once as a [`Metric`] constant so names and labels
//! cannot drift between call sites. No recorder is installed here; without
//! one the `metrics` macros are no-ops.
//!
//! ```rust,ignore
//! use g2_session::metrics::{describe_metrics, metric_defs};
//!
//! describe_metrics();
//! metrics::counter!(metric_defs::FRAMES_SENT.name).increment(1);
//! ```

use metrics::{describe_counter, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A histogram for recording distributions.
    Histogram,
}

/// A metric declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "g2.link.frames_sent").
    pub name: &'static str,
    /// Counter or histogram.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement.
    pub unit: Unit,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a counter metric counting events.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: Unit::Count,
            labels: &[],
        }
    }

    /// Creates a histogram metric.
    pub const fn histogram(name: &'static str, unit: Unit) -> Self {
        Self {
            name,
            kind: MetricKind::Histogram,
            description: "",
            unit,
            labels: &[],
        }
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, self.unit, self.description),
            MetricKind::Histogram => describe_histogram!(self.name, self.unit, self.description),
        }
    }
}

/// All metrics recorded by the session layer.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Link
    // ========================================================================

    pub const FRAMES_SENT: Metric = Metric::counter("g2.link.frames_sent")
        .with_description("Frames written to the glasses")
        .with_labels(&["service"]);

    pub const FRAMES_RECEIVED: Metric = Metric::counter("g2.link.frames_received")
        .with_description("Notifications received from the glasses");

    pub const FRAMES_DROPPED: Metric = Metric::counter("g2.link.frames_dropped")
        .with_description("Inbound frames dropped as invalid")
        .with_labels(&["reason"]);

    // ========================================================================
    // Events
    // ========================================================================

    pub const EVENTS_DECODED: Metric = Metric::counter("g2.events.decoded")
        .with_description("Inbound messages decoded into events")
        .with_labels(&["kind"]);

    // ========================================================================
    // Authentication
    // ========================================================================

    pub const AUTH_COMPLETED: Metric = Metric::counter("g2.auth.completed")
        .with_description("Handshakes fully transmitted");

    pub const AUTH_FAILED: Metric = Metric::counter("g2.auth.failed")
        .with_description("Handshakes that ended in failure")
        .with_labels(&["reason"]);

    pub const AUTH_DURATION: Metric = Metric::histogram("g2.auth.duration_ms", Unit::Milliseconds)
        .with_description("Time from first handshake frame to completion");

    /// Every metric above.
    pub const ALL: &[Metric] = &[
        FRAMES_SENT,
        FRAMES_RECEIVED,
        FRAMES_DROPPED,
        EVENTS_DECODED,
        AUTH_COMPLETED,
        AUTH_FAILED,
        AUTH_DURATION,
    ];
}

/// Registers descriptions for every metric. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_unique() {
        let names: HashSet<_> = metric_defs::ALL.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }

    #[test]
    fn test_metric_names_namespaced() {
        for metric in metric_defs::ALL {
            assert!(metric.name.starts_with("g2."), "{}", metric.name);
            assert!(!metric.description.is_empty(), "{}", metric.name);
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
