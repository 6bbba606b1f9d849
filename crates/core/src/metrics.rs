//! Metrics definitions for the transfer client.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`. Without an installed
//! recorder every call is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "transfers_submitted_total",
        "Total number of transfers handed to the node"
    );
    describe_counter!(
        "transfer_outcomes_total",
        "Total number of resolved transfers by outcome"
    );
    describe_counter!(
        "tx_status_updates_total",
        "Total number of transaction status notifications by status"
    );
    describe_gauge!(
        "fee_estimate_planck",
        "Most recent estimated partial fee in planck"
    );
    describe_histogram!(
        "finalization_duration_seconds",
        "Time from submission to a terminal outcome in seconds"
    );
}

/// Record a transfer submission.
pub fn record_transfer_submitted() {
    counter!("transfers_submitted_total").increment(1);
}

/// Record a resolved transfer.
///
/// # Arguments
/// * `outcome` - "success", "failed" or "transport_error"
pub fn record_transfer_outcome(outcome: &'static str) {
    counter!("transfer_outcomes_total", "outcome" => outcome).increment(1);
}

/// Record a status notification.
pub fn record_status_update(status: &'static str) {
    counter!("tx_status_updates_total", "status" => status).increment(1);
}

/// Record a fee estimate.
pub fn record_fee_estimate(fee: u128) {
    gauge!("fee_estimate_planck").set(fee as f64);
}

/// A timer that records the submission-to-outcome duration when dropped.
pub struct FinalizationTimer {
    start: Instant,
}

impl FinalizationTimer {
    /// Start a new timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for FinalizationTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FinalizationTimer {
    fn drop(&mut self) {
        histogram!("finalization_duration_seconds").record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
        with_local_recorder,
    };
    use std::sync::Mutex;

    /// Notes which kind of metric each key was registered as.
    #[derive(Default)]
    struct KindRecorder {
        registered: Mutex<Vec<(String, &'static str)>>,
    }

    impl KindRecorder {
        fn note(&self, key: &Key, kind: &'static str) {
            self.registered
                .lock()
                .unwrap()
                .push((key.name().to_string(), kind));
        }

        fn kind_of(&self, name: &str) -> Option<&'static str> {
            self.registered
                .lock()
                .unwrap()
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, kind)| *kind)
        }
    }

    impl Recorder for KindRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            self.note(key, "counter");
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            self.note(key, "gauge");
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            self.note(key, "histogram");
            Histogram::noop()
        }
    }

    #[test]
    fn test_metric_kinds() {
        let recorder = KindRecorder::default();
        with_local_recorder(&recorder, || {
            record_fee_estimate(1_234);
            record_transfer_submitted();
            record_transfer_outcome("success");
            drop(FinalizationTimer::new());
        });

        assert_eq!(recorder.kind_of("fee_estimate_planck"), Some("gauge"));
        assert_eq!(recorder.kind_of("transfers_submitted_total"), Some("counter"));
        assert_eq!(recorder.kind_of("transfer_outcomes_total"), Some("counter"));
        assert_eq!(
            recorder.kind_of("finalization_duration_seconds"),
            Some("histogram")
        );
    }
}
