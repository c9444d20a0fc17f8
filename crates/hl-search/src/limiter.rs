//! Concurrency-limiting wrapper around any [`Searcher`].

use hl_types::{HlResult, ParamMap};
use tracing::debug;

use crate::strategy::Searcher;

/// Caps the number of outstanding configurations an engine may have in
/// flight. A suggestion occupies a slot until its objective is reported
/// back, so a wrapped engine never races ahead of the trial executor.
pub struct ConcurrencyLimiter<S> {
    inner: S,
    max_concurrent: usize,
    in_flight: usize,
}

impl<S: Searcher> ConcurrencyLimiter<S> {
    pub fn new(inner: S, max_concurrent: usize) -> Self {
        Self {
            inner,
            max_concurrent: max_concurrent.max(1),
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl<S: Searcher> Searcher for ConcurrencyLimiter<S> {
    fn suggest(&mut self, count: usize) -> Vec<ParamMap> {
        let free = self.max_concurrent.saturating_sub(self.in_flight);
        let granted = count.min(free);
        if granted < count {
            debug!(
                in_flight = self.in_flight,
                max = self.max_concurrent,
                "limiter throttling suggestions"
            );
        }
        let batch = self.inner.suggest(granted);
        self.in_flight += batch.len();
        batch
    }

    fn report(&mut self, params: &ParamMap, objective: f64) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.inner.report(params, objective);
    }

    fn on_trial_error(&mut self, params: &ParamMap) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.inner.on_trial_error(params);
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn param_names(&self) -> Vec<String> {
        self.inner.param_names()
    }

    fn validate(&self) -> HlResult<()> {
        self.inner.validate()
    }
}
