//! # hl-tune
//!
//! Trial orchestration for Hyperloom: runs objective functions against
//! suggested configurations under a parallelism cap, collects incrementally
//! reported metrics over a one-way channel, and summarizes the best
//! configuration found by a chosen metric and optimization mode.

mod driver;
mod objective;
mod report;
mod trial;

pub use driver::Tuner;
pub use objective::{Objective, ObjectiveFn};
pub use report::{MetricReport, Reporter};
pub use trial::{ExperimentAnalysis, Trial, TrialResult, TrialStatus, TuneConfig};
