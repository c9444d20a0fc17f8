//! Trial tracking and run summaries.

use chrono::{DateTime, Utc};
use hl_types::{Mode, ParamMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Top-level configuration for one tuning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneConfig {
    /// Run name used in logs and the final summary.
    pub name: String,

    /// Metric name the run optimizes (e.g. "mean_loss").
    pub metric: String,

    /// Direction of optimization.
    pub mode: Mode,

    /// Total trial budget: the number of configurations to evaluate.
    pub num_samples: usize,

    /// How many trials may run concurrently.
    pub max_concurrent: usize,

    /// Seed for the orchestrator's own sampling (inline search space).
    pub seed: Option<u64>,
}

impl TuneConfig {
    pub fn new(name: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric: metric.into(),
            mode: Mode::Min,
            num_samples: 16,
            max_concurrent: 4,
            seed: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// A single trial: one configuration evaluated by the objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub trial_number: usize,
    pub parameters: ParamMap,
    pub status: TrialStatus,
    pub result: Option<TrialResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Trial {
    pub fn new(trial_number: usize, parameters: ParamMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            trial_number,
            parameters,
            status: TrialStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, result: TrialResult) {
        self.status = TrialStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result of a completed trial. `objective` is the last reported value of
/// the run's configured metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: Uuid,
    pub objective: f64,
    /// Last iteration index the objective reported.
    pub iterations: u64,
    /// All metrics from the final report.
    pub metrics: HashMap<String, f64>,
    pub parameters: ParamMap,
    /// Wall-clock evaluation time in fractional seconds.
    pub duration_seconds: Option<f64>,
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Aggregate outcome of a tuning run: every trial plus the best result
/// under the configured metric and mode. The only artifact that outlives
/// the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentAnalysis {
    pub name: String,
    pub metric: String,
    pub mode: Mode,
    pub trials: Vec<Trial>,
    pub best_trial: Option<TrialResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExperimentAnalysis {
    pub fn new(config: &TuneConfig) -> Self {
        Self {
            name: config.name.clone(),
            metric: config.metric.clone(),
            mode: config.mode,
            trials: Vec::new(),
            best_trial: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record a finished trial, updating the best result if it improves.
    pub fn record(&mut self, trial: Trial) {
        if let Some(result) = &trial.result {
            let improved = match &self.best_trial {
                None => true,
                Some(best) => self.mode.is_better(result.objective, best.objective),
            };
            if improved {
                self.best_trial = Some(result.clone());
            }
        }
        self.trials.push(trial);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// The best configuration found, if any trial completed.
    pub fn best_config(&self) -> Option<&ParamMap> {
        self.best_trial.as_ref().map(|t| &t.parameters)
    }

    /// The best objective value found, if any trial completed.
    pub fn best_score(&self) -> Option<f64> {
        self.best_trial.as_ref().map(|t| t.objective)
    }

    pub fn num_completed(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| t.status == TrialStatus::Completed)
            .count()
    }

    pub fn num_failed(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| t.status == TrialStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_types::ParamValue;

    fn result_with(objective: f64) -> TrialResult {
        TrialResult {
            trial_id: Uuid::new_v4(),
            objective,
            iterations: 100,
            metrics: HashMap::new(),
            parameters: ParamMap::new(),
            duration_seconds: Some(1.5),
        }
    }

    fn completed_trial(number: usize, objective: f64) -> Trial {
        let mut trial = Trial::new(number, ParamMap::new());
        trial.mark_running();
        let mut result = result_with(objective);
        result.trial_id = trial.id;
        trial.mark_completed(result);
        trial
    }

    #[test]
    fn trial_lifecycle() {
        let mut params = ParamMap::new();
        params.insert("width".into(), ParamValue::Int(4));

        let mut trial = Trial::new(1, params.clone());
        assert_eq!(trial.status, TrialStatus::Pending);
        assert!(trial.started_at.is_none());

        trial.mark_running();
        assert_eq!(trial.status, TrialStatus::Running);
        assert!(trial.started_at.is_some());

        let mut result = result_with(1.8);
        result.trial_id = trial.id;
        result.parameters = params;
        trial.mark_completed(result);
        assert_eq!(trial.status, TrialStatus::Completed);
        assert!(trial.finished_at.is_some());
        assert_eq!(trial.result.as_ref().unwrap().objective, 1.8);
    }

    #[test]
    fn trial_failure() {
        let mut trial = Trial::new(0, ParamMap::new());
        trial.mark_running();
        trial.mark_failed("objective panicked".into());
        assert_eq!(trial.status, TrialStatus::Failed);
        assert_eq!(trial.error.as_deref(), Some("objective panicked"));
    }

    #[test]
    fn best_trial_tracking_minimize() {
        let config = TuneConfig::new("min_run", "mean_loss");
        let mut analysis = ExperimentAnalysis::new(&config);

        analysis.record(completed_trial(0, 0.15));
        assert_eq!(analysis.best_score(), Some(0.15));

        analysis.record(completed_trial(1, 0.05));
        assert_eq!(analysis.best_score(), Some(0.05));

        // Worse result should not replace
        analysis.record(completed_trial(2, 0.40));
        assert_eq!(analysis.best_score(), Some(0.05));
        assert_eq!(analysis.num_completed(), 3);
    }

    #[test]
    fn best_trial_tracking_maximize() {
        let config = TuneConfig::new("max_run", "accuracy").with_mode(Mode::Max);
        let mut analysis = ExperimentAnalysis::new(&config);

        analysis.record(completed_trial(0, 0.80));
        analysis.record(completed_trial(1, 0.95));
        analysis.record(completed_trial(2, 0.70));
        assert_eq!(analysis.best_score(), Some(0.95));
    }

    #[test]
    fn failed_trials_do_not_produce_a_best() {
        let config = TuneConfig::new("failing", "mean_loss");
        let mut analysis = ExperimentAnalysis::new(&config);

        let mut trial = Trial::new(0, ParamMap::new());
        trial.mark_running();
        trial.mark_failed("boom".into());
        analysis.record(trial);

        assert!(analysis.best_trial.is_none());
        assert_eq!(analysis.num_failed(), 1);
        assert_eq!(analysis.num_completed(), 0);
    }

    #[test]
    fn config_builder_chain() {
        let config = TuneConfig::new("toy", "mean_loss")
            .with_mode(Mode::Min)
            .with_num_samples(10)
            .with_max_concurrent(8)
            .with_seed(7);
        assert_eq!(config.num_samples, 10);
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.seed, Some(7));
    }
}
