//! Zeroth-order racing searcher over an algorithm-owned space.
//!
//! Model-free black-box optimization: only sampled objective values are used,
//! no gradients. The engine warms up with uniform draws, then alternates
//! between global exploration and perturbation of the best observed points,
//! with noise shaped by each dimension's declared precision or ordering.

use hl_types::{HlResult, Mode, ParamMap, ParamValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dimension::{AlgorithmSpace, Dimension};
use crate::space::quantize;
use crate::strategy::Searcher;

/// Tuning knobs for [`RacosSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RacosConfig {
    /// Uniform random draws before any exploitation starts.
    pub init_samples: usize,
    /// Probability of exploiting (perturbing a positive point) after warmup.
    pub exploit_prob: f64,
    /// How many of the best observations form the positive set.
    pub positive_size: usize,
}

impl Default for RacosConfig {
    fn default() -> Self {
        Self {
            init_samples: 4,
            exploit_prob: 0.8,
            positive_size: 2,
        }
    }
}

/// Racing-style zeroth-order search engine.
pub struct RacosSearch {
    space: AlgorithmSpace,
    mode: Mode,
    config: RacosConfig,
    observations: Vec<(ParamMap, f64)>,
    rng: StdRng,
    suggested: usize,
}

impl RacosSearch {
    pub fn new(space: AlgorithmSpace, mode: Mode) -> Self {
        Self::with_config(space, mode, RacosConfig::default())
    }

    pub fn with_config(space: AlgorithmSpace, mode: Mode, config: RacosConfig) -> Self {
        Self {
            space,
            mode,
            config,
            observations: Vec::new(),
            rng: StdRng::from_entropy(),
            suggested: 0,
        }
    }

    pub fn with_seed(space: AlgorithmSpace, mode: Mode, seed: u64) -> Self {
        let mut search = Self::new(space, mode);
        search.rng = StdRng::seed_from_u64(seed);
        search
    }

    /// Uniform draw across every dimension.
    fn explore(&mut self) -> ParamMap {
        let mut params = ParamMap::new();
        for (name, dim) in &self.space.dimensions {
            params.insert(name.clone(), dim.sample(&mut self.rng));
        }
        params
    }

    /// Perturb one of the positive (best observed) points.
    fn exploit(&mut self) -> ParamMap {
        let base = match self.pick_positive() {
            Some(params) => params,
            None => return self.explore(),
        };

        let mut perturbed = ParamMap::new();
        for (name, dim) in &self.space.dimensions {
            let base_val = base.get(name);
            let value = match (dim, base_val) {
                (Dimension::Continuous { low, high, precision }, Some(ParamValue::Float(v))) => {
                    let range = high - low;
                    let noise = self.rng.gen_range(-0.1..=0.1) * range;
                    ParamValue::Float(quantize(v + noise, *low, *high, *precision))
                }
                (
                    Dimension::Discrete {
                        low,
                        high,
                        ordered: true,
                    },
                    Some(ParamValue::Int(v)),
                ) => {
                    let delta: i64 = self.rng.gen_range(-2..=2);
                    ParamValue::Int((v + delta).clamp(*low, *high))
                }
                // Unordered discrete values have no meaningful neighbors:
                // either keep the value or resample the whole set.
                (
                    Dimension::Discrete {
                        low,
                        high,
                        ordered: false,
                    },
                    Some(ParamValue::Int(v)),
                ) => {
                    if self.rng.gen::<f64>() < 0.5 {
                        ParamValue::Int(*v)
                    } else {
                        ParamValue::Int(self.rng.gen_range(*low..=*high))
                    }
                }
                (Dimension::Grid { values }, Some(ParamValue::Json(v))) => {
                    if self.rng.gen::<f64>() < 0.5 {
                        ParamValue::Json(v.clone())
                    } else {
                        let idx = self.rng.gen_range(0..values.len());
                        ParamValue::Json(values[idx].clone())
                    }
                }
                // Missing or mismatched base value: fall back to a fresh draw.
                (dim, _) => dim.sample(&mut self.rng),
            };
            perturbed.insert(name.clone(), value);
        }

        perturbed
    }

    /// Choose a random member of the positive set (best-k by mode).
    fn pick_positive(&mut self) -> Option<ParamMap> {
        if self.observations.is_empty() {
            return None;
        }
        let mut ranked: Vec<usize> = (0..self.observations.len()).collect();
        ranked.sort_by(|&a, &b| {
            let (oa, ob) = (self.observations[a].1, self.observations[b].1);
            let ord = oa.partial_cmp(&ob).unwrap_or(std::cmp::Ordering::Equal);
            match self.mode {
                Mode::Min => ord,
                Mode::Max => ord.reverse(),
            }
        });
        let k = self.config.positive_size.max(1).min(ranked.len());
        let idx = ranked[self.rng.gen_range(0..k)];
        Some(self.observations[idx].0.clone())
    }
}

impl Searcher for RacosSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParamMap> {
        (0..count)
            .map(|_| {
                let warming_up = self.suggested < self.config.init_samples;
                self.suggested += 1;
                if warming_up
                    || self.observations.is_empty()
                    || self.rng.gen::<f64>() >= self.config.exploit_prob
                {
                    debug!(engine = self.name(), "exploring");
                    self.explore()
                } else {
                    debug!(engine = self.name(), "exploiting positive set");
                    self.exploit()
                }
            })
            .collect()
    }

    fn report(&mut self, params: &ParamMap, objective: f64) {
        self.observations.push((params.clone(), objective));
    }

    fn name(&self) -> &str {
        "racos"
    }

    fn param_names(&self) -> Vec<String> {
        self.space.names()
    }

    fn validate(&self) -> HlResult<()> {
        self.space.validate()
    }
}
