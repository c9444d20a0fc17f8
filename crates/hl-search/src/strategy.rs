//! Suggestion-engine trait and the non-adaptive strategies.

use hl_types::{HlResult, ParamMap, ParamValue};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::space::{ParamKind, SearchSpace};

/// Common trait for all point-suggestion engines.
pub trait Searcher: Send + Sync {
    /// Generate the next batch of configurations to evaluate. Returning fewer
    /// than `count` (or none) signals the engine has nothing to offer right
    /// now; an engine with a finite space is exhausted once it returns an
    /// empty batch with no suggestions outstanding.
    fn suggest(&mut self, count: usize) -> Vec<ParamMap>;

    /// Report a completed trial's objective so adaptive engines can learn.
    fn report(&mut self, _params: &ParamMap, _objective: f64) {}

    /// Notify the engine that a suggested configuration failed to produce an
    /// objective. No value is learned, but wrappers release bookkeeping.
    fn on_trial_error(&mut self, _params: &ParamMap) {}

    /// Human-readable engine name.
    fn name(&self) -> &str;

    /// Names of the parameters this engine resolves itself. The driver uses
    /// this to reject overlap with the inline search space.
    fn param_names(&self) -> Vec<String>;

    /// Check the engine's own space declaration. The driver calls this once
    /// before any suggestion is drawn, so a bad range surfaces as an error
    /// instead of a sampling panic mid-run.
    fn validate(&self) -> HlResult<()> {
        Ok(())
    }
}

// ---- Random search ----

/// Independent random sampling across an inline search space.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: SearchSpace,
    rng: StdRng,
    drawn: usize,
}

impl RandomSearch {
    pub fn new(space: SearchSpace) -> Self {
        Self {
            space,
            rng: StdRng::from_entropy(),
            drawn: 0,
        }
    }

    pub fn with_seed(space: SearchSpace, seed: u64) -> Self {
        Self {
            space,
            rng: StdRng::seed_from_u64(seed),
            drawn: 0,
        }
    }
}

impl Searcher for RandomSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParamMap> {
        (0..count)
            .map(|_| {
                let params = self.space.sample(self.drawn, &mut self.rng);
                self.drawn += 1;
                params
            })
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }

    fn param_names(&self) -> Vec<String> {
        self.space.names()
    }

    fn validate(&self) -> HlResult<()> {
        self.space.validate()
    }
}

// ---- Grid search ----

/// Exhaustive grid search over discrete parameter combinations.
#[derive(Debug, Clone)]
pub struct GridSearch {
    space: SearchSpace,
    cursor: usize,
    combos: Vec<ParamMap>,
}

impl GridSearch {
    /// Build the full grid up front. Continuous dimensions are expanded to
    /// `float_steps` evenly spaced points; quantized dimensions use their
    /// natural step grid.
    pub fn new(space: SearchSpace, float_steps: usize) -> Self {
        let combos = Self::build_grid(&space, float_steps);
        Self {
            space,
            cursor: 0,
            combos,
        }
    }

    fn build_grid(space: &SearchSpace, float_steps: usize) -> Vec<ParamMap> {
        let mut axes: Vec<Vec<(&str, ParamValue)>> = Vec::new();

        for param in &space.parameters {
            let values: Vec<ParamValue> = match &param.kind {
                ParamKind::FloatRange { low, high } => {
                    let steps = float_steps.max(2);
                    (0..steps)
                        .map(|i| {
                            let t = i as f64 / (steps - 1) as f64;
                            ParamValue::Float(low + t * (high - low))
                        })
                        .collect()
                }
                ParamKind::IntRange { low, high } => {
                    (*low..=*high).map(ParamValue::Int).collect()
                }
                ParamKind::QuantizedUniform { low, high, step } => {
                    let points = (((high - low) / step).floor() as usize) + 1;
                    (0..points)
                        .map(|i| ParamValue::Float((low + i as f64 * step).min(*high)))
                        .collect()
                }
                ParamKind::Choice { values } | ParamKind::Grid { values } => values
                    .iter()
                    .map(|v| ParamValue::Json(v.clone()))
                    .collect(),
            };
            axes.push(
                values
                    .into_iter()
                    .map(|v| (param.name.as_str(), v))
                    .collect(),
            );
        }

        // Cartesian product
        let mut result: Vec<ParamMap> = vec![ParamMap::new()];
        for axis in &axes {
            let mut next = Vec::with_capacity(result.len() * axis.len());
            for existing in &result {
                for (name, value) in axis {
                    let mut combo = existing.clone();
                    combo.insert(name.to_string(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }

        result
    }

    pub fn remaining(&self) -> usize {
        self.combos.len() - self.cursor
    }
}

impl Searcher for GridSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParamMap> {
        let end = (self.cursor + count).min(self.combos.len());
        let batch = self.combos[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }

    fn name(&self) -> &str {
        "grid"
    }

    fn param_names(&self) -> Vec<String> {
        self.space.names()
    }

    fn validate(&self) -> HlResult<()> {
        self.space.validate()
    }
}
