//! The search driver: wires an objective, a search space, and a suggestion
//! engine together and runs the trial budget under a parallelism cap.

use hl_search::{SearchSpace, Searcher};
use hl_types::{HlResult, SpaceError, TuneError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::objective::Objective;
use crate::report::{MetricReport, Reporter};
use crate::trial::{ExperimentAnalysis, Trial, TrialResult, TuneConfig};

/// Orchestrates one tuning run.
///
/// Parameters come from two places: the inline [`SearchSpace`] resolved by
/// the driver itself, and the engine's own space (whatever the [`Searcher`]
/// was built over). Each trial's configuration is the union of both; a name
/// declared in both places is rejected before any trial launches.
pub struct Tuner {
    config: TuneConfig,
    space: SearchSpace,
    searcher: Box<dyn Searcher>,
}

impl Tuner {
    pub fn new(config: TuneConfig, space: SearchSpace, searcher: Box<dyn Searcher>) -> Self {
        Self {
            config,
            space,
            searcher,
        }
    }

    /// Run up to `num_samples` trials and summarize the best configuration.
    ///
    /// Trials run concurrently up to `max_concurrent`. Each completion is
    /// reported back to the engine before the next suggestion is requested,
    /// so adaptive engines learn as the run progresses. Failed trials are
    /// recorded and never retried.
    pub async fn run(mut self, objective: Arc<dyn Objective>) -> HlResult<ExperimentAnalysis> {
        if self.config.num_samples == 0 {
            return Err(TuneError::ZeroBudget.into());
        }
        self.space.validate()?;
        self.searcher.validate()?;

        let inline: HashSet<String> = self.space.names().into_iter().collect();
        for name in self.searcher.param_names() {
            if inline.contains(&name) {
                return Err(SpaceError::DuplicateParameter { name }.into());
            }
        }

        info!(
            run = %self.config.name,
            metric = %self.config.metric,
            mode = %self.config.mode,
            samples = self.config.num_samples,
            engine = self.searcher.name(),
            "starting tuning run"
        );

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut analysis = ExperimentAnalysis::new(&self.config);
        let mut join_set: JoinSet<Trial> = JoinSet::new();
        let budget = self.config.num_samples;
        let cap = self.config.max_concurrent.max(1);
        let mut launched = 0usize;

        loop {
            // Fill free slots. An empty suggestion batch here is not final:
            // a throttled engine may produce more once a trial reports.
            while join_set.len() < cap && launched < budget {
                let Some(suggested) = self.searcher.suggest(1).pop() else {
                    break;
                };
                let mut parameters = self.space.sample(launched, &mut rng);
                parameters.extend(suggested);
                debug!(trial = launched, ?parameters, "launching trial");

                let trial = Trial::new(launched, parameters);
                join_set.spawn(run_trial(
                    trial,
                    Arc::clone(&objective),
                    self.config.metric.clone(),
                ));
                launched += 1;
            }

            // Nothing in flight and nothing launchable: the run is over.
            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok(trial) => {
                    match &trial.result {
                        Some(result) => {
                            info!(
                                trial = trial.trial_number,
                                objective = result.objective,
                                "trial completed"
                            );
                            self.searcher.report(&trial.parameters, result.objective);
                        }
                        None => {
                            warn!(
                                trial = trial.trial_number,
                                error = trial.error.as_deref().unwrap_or("unknown"),
                                "trial failed"
                            );
                            self.searcher.on_trial_error(&trial.parameters);
                        }
                    }
                    analysis.record(trial);
                }
                Err(e) => {
                    // The wrapper task itself died; objective panics are
                    // caught inside run_trial, so this is unexpected.
                    warn!(error = %e, "trial task aborted");
                }
            }
        }

        analysis.finish();
        if analysis.num_completed() == 0 {
            return Err(TuneError::NoTrialsCompleted {
                run_name: self.config.name.clone(),
            }
            .into());
        }

        info!(
            run = %self.config.name,
            completed = analysis.num_completed(),
            failed = analysis.num_failed(),
            best = analysis.best_score().unwrap_or(f64::NAN),
            "tuning run finished"
        );
        Ok(analysis)
    }
}

/// Evaluate one configuration: drive the objective, drain its metric stream,
/// and derive the trial outcome from the final report.
async fn run_trial(mut trial: Trial, objective: Arc<dyn Objective>, metric: String) -> Trial {
    trial.mark_running();
    let timer = Instant::now();

    let (reporter, mut rx) = Reporter::channel();
    let config = trial.parameters.clone();
    let handle = tokio::spawn(async move { objective.run(config, reporter).await });

    // The stream closes when the objective drops its reporter.
    let mut last: Option<MetricReport> = None;
    while let Some(report) = rx.recv().await {
        last = Some(report);
    }

    let outcome = match handle.await {
        Ok(result) => result,
        Err(e) => Err(TuneError::ObjectiveFailed {
            message: format!("objective panicked: {e}"),
        }
        .into()),
    };

    match outcome {
        Ok(()) => match last {
            Some(report) => match report.values.get(&metric).copied() {
                Some(objective_value) => {
                    let result = TrialResult {
                        trial_id: trial.id,
                        objective: objective_value,
                        iterations: report.iteration,
                        metrics: report.values,
                        parameters: trial.parameters.clone(),
                        duration_seconds: Some(timer.elapsed().as_secs_f64()),
                    };
                    trial.mark_completed(result);
                }
                None => trial.mark_failed(TuneError::MetricMissing { metric }.to_string()),
            },
            None => trial.mark_failed(TuneError::MetricMissing { metric }.to_string()),
        },
        Err(e) => trial.mark_failed(e.to_string()),
    }

    trial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveFn;
    use crate::trial::TrialStatus;
    use hl_search::{AlgorithmSpace, ConcurrencyLimiter, RacosSearch, RandomSearch};
    use hl_types::{HlError, Mode, ParamValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// The toy objective from the tutorial scenario:
    /// f(step, width, height) = (0.1 + width*step/100)^-1 + height*0.1
    fn toy_score(step: u64, width: f64, height: f64) -> f64 {
        1.0 / (0.1 + width * step as f64 / 100.0) + height * 0.1
    }

    fn toy_objective(steps: u64) -> Arc<dyn Objective> {
        Arc::new(ObjectiveFn::new(move |config, reporter| async move {
            let width = config
                .get("width")
                .and_then(ParamValue::as_f64)
                .unwrap_or(0.0);
            let height = config
                .get("height")
                .and_then(ParamValue::as_f64)
                .unwrap_or(0.0);
            for step in 1..=steps {
                reporter.report_one(step, "mean_loss", toy_score(step, width, height));
            }
            Ok(())
        }))
    }

    fn toy_space() -> AlgorithmSpace {
        AlgorithmSpace::new()
            .add_discrete("width", 0, 10, true)
            .add_continuous("height", -10.0, 10.0, 1e-2)
    }

    #[tokio::test]
    async fn budget_is_never_exceeded() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let objective = Arc::new(ObjectiveFn::new(move |_config, reporter| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                reporter.report_one(0, "mean_loss", 1.0);
                Ok(())
            }
        }));

        let space = SearchSpace::new().add_int("x", 0, 100);
        let config = TuneConfig::new("budget", "mean_loss").with_num_samples(5);
        let searcher = Box::new(RandomSearch::with_seed(space, 3));

        let analysis = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 5);
        assert_eq!(analysis.trials.len(), 5);
    }

    #[tokio::test]
    async fn concurrency_stays_under_the_cap() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (running_h, peak_h) = (Arc::clone(&running), Arc::clone(&peak));

        let objective = Arc::new(ObjectiveFn::new(move |_config, reporter| {
            let running = Arc::clone(&running_h);
            let peak = Arc::clone(&peak_h);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                reporter.report_one(0, "mean_loss", 1.0);
                Ok(())
            }
        }));

        let space = SearchSpace::new().add_int("x", 0, 100);
        let config = TuneConfig::new("capped", "mean_loss")
            .with_num_samples(6)
            .with_max_concurrent(2);
        let searcher = Box::new(RandomSearch::with_seed(space, 5));

        Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn best_config_keys_are_the_union_of_both_spaces() {
        let inline = SearchSpace::new().add_quniform("height", -10.0, 10.0, 0.01);
        let algorithm = AlgorithmSpace::new().add_discrete("width", 0, 10, true);
        let searcher = Box::new(RacosSearch::with_seed(algorithm, Mode::Min, 11));
        let config = TuneConfig::new("union", "mean_loss")
            .with_num_samples(4)
            .with_seed(11);

        let analysis = Tuner::new(config, inline, searcher)
            .run(toy_objective(10))
            .await
            .unwrap();

        let best = analysis.best_config().unwrap();
        let mut keys: Vec<&str> = best.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["height", "width"]);
    }

    #[tokio::test]
    async fn duplicate_declaration_fails_fast() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let objective = Arc::new(ObjectiveFn::new(move |_config, _reporter| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        let inline = SearchSpace::new().add_int("width", 0, 10);
        let algorithm = AlgorithmSpace::new().add_discrete("width", 0, 10, true);
        let searcher = Box::new(RacosSearch::with_seed(algorithm, Mode::Min, 1));
        let config = TuneConfig::new("conflict", "mean_loss").with_num_samples(4);

        let err = Tuner::new(config, inline, searcher)
            .run(objective)
            .await
            .unwrap_err();

        match err {
            HlError::Space(SpaceError::DuplicateParameter { name }) => assert_eq!(name, "width"),
            other => panic!("expected duplicate-parameter error, got {other}"),
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_algorithm_space_fails_before_any_trial() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let objective = Arc::new(ObjectiveFn::new(move |_config, _reporter| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        // Inverted bounds: sampling this range would panic inside the engine.
        let algorithm = AlgorithmSpace::new().add_continuous("height", 10.0, -10.0, 0.01);
        let searcher = Box::new(RacosSearch::with_seed(algorithm, Mode::Min, 1));
        let config = TuneConfig::new("inverted", "mean_loss").with_num_samples(4);

        let err = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap_err();

        match err {
            HlError::Space(SpaceError::InvalidRange { name, .. }) => assert_eq!(name, "height"),
            other => panic!("expected invalid-range error, got {other}"),
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn durations_record_fractional_seconds() {
        let objective = Arc::new(ObjectiveFn::new(|_config, reporter| async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            reporter.report_one(0, "mean_loss", 1.0);
            Ok(())
        }));

        let space = SearchSpace::new().add_int("x", 0, 1);
        let config = TuneConfig::new("timed", "mean_loss").with_num_samples(1);
        let searcher = Box::new(RandomSearch::with_seed(space, 4));

        let analysis = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap();

        let duration = analysis
            .best_trial
            .as_ref()
            .and_then(|t| t.duration_seconds)
            .unwrap();
        assert!(
            duration >= 0.02,
            "sub-second duration was truncated: {duration}"
        );
    }

    #[tokio::test]
    async fn best_score_is_no_worse_than_any_completed_trial() {
        let searcher = Box::new(RacosSearch::with_seed(toy_space(), Mode::Min, 21));
        let config = TuneConfig::new("converge", "mean_loss")
            .with_num_samples(12)
            .with_seed(21);

        let analysis = Tuner::new(config, SearchSpace::new(), searcher)
            .run(toy_objective(100))
            .await
            .unwrap();

        let best = analysis.best_score().unwrap();
        for trial in &analysis.trials {
            if let Some(result) = &trial.result {
                assert!(best <= result.objective);
            }
        }
    }

    #[tokio::test]
    async fn toy_scenario_matches_the_formula_at_the_final_step() {
        let searcher = Box::new(ConcurrencyLimiter::new(
            RacosSearch::with_seed(toy_space(), Mode::Min, 33),
            8,
        ));
        let config = TuneConfig::new("toy", "mean_loss")
            .with_num_samples(10)
            .with_max_concurrent(8)
            .with_seed(33);

        let analysis = Tuner::new(config, SearchSpace::new(), searcher)
            .run(toy_objective(100))
            .await
            .unwrap();

        let best = analysis.best_trial.as_ref().unwrap();
        let width = best.parameters["width"].as_f64().unwrap();
        let height = best.parameters["height"].as_f64().unwrap();
        assert!((0.0..=10.0).contains(&width));
        assert!((-10.0..=10.0).contains(&height));
        assert_eq!(best.iterations, 100);
        assert!((best.objective - toy_score(100, width, height)).abs() < 1e-9);
        assert_eq!(analysis.trials.len(), 10);
    }

    #[tokio::test]
    async fn missing_metric_fails_every_trial() {
        let objective = Arc::new(ObjectiveFn::new(|_config, reporter| async move {
            reporter.report_one(0, "some_other_metric", 1.0);
            Ok(())
        }));

        let space = SearchSpace::new().add_int("x", 0, 3);
        let config = TuneConfig::new("missing", "mean_loss").with_num_samples(3);
        let searcher = Box::new(RandomSearch::with_seed(space, 2));

        let err = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap_err();
        match err {
            HlError::Tune(TuneError::NoTrialsCompleted { run_name }) => {
                assert_eq!(run_name, "missing")
            }
            other => panic!("expected no-trials error, got {other}"),
        }
    }

    #[tokio::test]
    async fn failures_are_recorded_and_never_retried() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let objective = Arc::new(ObjectiveFn::new(move |config, reporter| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let x = config.get("x").and_then(ParamValue::as_i64).unwrap_or(0);
                if x % 2 == 1 {
                    return Err(TuneError::ObjectiveFailed {
                        message: "odd widths diverge".to_string(),
                    }
                    .into());
                }
                reporter.report_one(0, "mean_loss", x as f64);
                Ok(())
            }
        }));

        let space = SearchSpace::new().add_int("x", 0, 9);
        let config = TuneConfig::new("flaky", "mean_loss").with_num_samples(8);
        let searcher = Box::new(RandomSearch::with_seed(space, 13));

        let analysis = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 8);
        assert_eq!(analysis.trials.len(), 8);
        assert_eq!(
            analysis.num_completed() + analysis.num_failed(),
            analysis.trials.len()
        );
        for trial in &analysis.trials {
            if trial.status == TrialStatus::Failed {
                assert!(trial.error.as_deref().unwrap_or("").contains("diverge"));
            }
        }
    }

    #[tokio::test]
    async fn grid_engine_exhaustion_ends_the_run_early() {
        let objective = Arc::new(ObjectiveFn::new(|config, reporter| async move {
            let x = config.get("x").and_then(ParamValue::as_f64).unwrap_or(0.0);
            reporter.report_one(0, "mean_loss", x);
            Ok(())
        }));

        // 4 grid points, but a budget of 10: only 4 trials should run.
        let space = SearchSpace::new().add_int("x", 1, 4);
        let config = TuneConfig::new("exhausted", "mean_loss").with_num_samples(10);
        let searcher = Box::new(hl_search::GridSearch::new(space, 2));

        let analysis = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap();

        assert_eq!(analysis.trials.len(), 4);
        assert_eq!(analysis.best_score(), Some(1.0));
    }

    #[tokio::test]
    async fn zero_budget_is_rejected() {
        let objective = Arc::new(ObjectiveFn::new(|_c, _r| async move { Ok(()) }));
        let space = SearchSpace::new().add_int("x", 0, 1);
        let config = TuneConfig::new("empty", "mean_loss").with_num_samples(0);
        let searcher = Box::new(RandomSearch::with_seed(space, 0));

        let err = Tuner::new(config, SearchSpace::new(), searcher)
            .run(objective)
            .await
            .unwrap_err();
        assert!(matches!(err, HlError::Tune(TuneError::ZeroBudget)));
    }
}
