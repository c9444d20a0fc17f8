//! End-to-end demo: minimize a toy loss surface with the racing searcher.
//!
//! The objective iterates 100 steps, reporting
//! `(0.1 + width * step / 100)^-1 + height * 0.1` at each step with a small
//! simulated delay, and the driver runs 10 trials, at most 8 concurrently.
//!
//! Run with: `cargo run --example toy_sweep`

use std::sync::Arc;
use std::time::Duration;

use hl_search::{AlgorithmSpace, ConcurrencyLimiter, RacosSearch, SearchSpace};
use hl_tune::{ObjectiveFn, TuneConfig, Tuner};
use hl_types::{Mode, ParamValue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let objective = Arc::new(ObjectiveFn::new(|config, reporter| async move {
        let width = config
            .get("width")
            .and_then(ParamValue::as_f64)
            .unwrap_or(0.0);
        let height = config
            .get("height")
            .and_then(ParamValue::as_f64)
            .unwrap_or(0.0);

        for step in 1..=100u64 {
            // Stand-in for a real training iteration.
            tokio::time::sleep(Duration::from_millis(10)).await;
            let loss = 1.0 / (0.1 + width * step as f64 / 100.0) + height * 0.1;
            reporter.report_one(step, "mean_loss", loss);
        }
        Ok(())
    }));

    // Both dimensions are owned by the search algorithm, so the inline
    // space stays empty; declaring a parameter in both places is an error.
    let space = AlgorithmSpace::new()
        .add_discrete("width", 0, 10, true)
        .add_continuous("height", -10.0, 10.0, 1e-2);
    let searcher = Box::new(ConcurrencyLimiter::new(
        RacosSearch::new(space, Mode::Min),
        8,
    ));

    let config = TuneConfig::new("toy_sweep", "mean_loss")
        .with_mode(Mode::Min)
        .with_num_samples(10)
        .with_max_concurrent(8);

    let analysis = Tuner::new(config, SearchSpace::new(), searcher)
        .run(objective)
        .await?;

    let best = analysis
        .best_config()
        .expect("a successful run always has a best configuration");
    println!("best configuration: {}", serde_json::to_string_pretty(best)?);
    println!(
        "best mean_loss: {:.4} over {} trials",
        analysis.best_score().unwrap_or(f64::NAN),
        analysis.trials.len()
    );

    Ok(())
}
