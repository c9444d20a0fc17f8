//! Incremental metric reporting from a running trial back to the driver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// One batch of scalar metrics reported at a trial iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    /// Iteration index within the trial (monotonic per objective).
    pub iteration: u64,
    /// Metric name to scalar value.
    pub values: HashMap<String, f64>,
}

/// Cloneable handle an objective uses to stream metrics to the orchestrator.
///
/// Reporting is fire-and-forget: if the driver has stopped listening the
/// report is silently dropped, never an error the objective must handle.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<MetricReport>,
}

impl Reporter {
    /// Create a reporter together with the receiving end the driver drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MetricReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report a batch of metrics for one iteration.
    pub fn report(&self, iteration: u64, values: HashMap<String, f64>) {
        let _ = self.tx.send(MetricReport { iteration, values });
    }

    /// Convenience for the common single-metric case.
    pub fn report_one(&self, iteration: u64, metric: &str, value: f64) {
        let mut values = HashMap::new();
        values.insert(metric.to_string(), value);
        self.report(iteration, values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_arrive_in_order() {
        let (reporter, mut rx) = Reporter::channel();
        reporter.report_one(0, "loss", 1.0);
        reporter.report_one(1, "loss", 0.5);
        drop(reporter);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.iteration, 0);
        assert_eq!(first.values["loss"], 1.0);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.iteration, 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn reporting_after_receiver_drop_is_silent() {
        let (reporter, rx) = Reporter::channel();
        drop(rx);
        // Must not panic or error.
        reporter.report_one(0, "loss", 1.0);
    }
}
