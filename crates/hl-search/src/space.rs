//! Inline search-space declarations consumed by the orchestration layer.

use hl_types::{HlResult, ParamMap, ParamValue, SpaceError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single parameter dimension in the inline search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. "width").
    pub name: String,
    /// The kind of search range.
    pub kind: ParamKind,
}

/// Describes how a parameter is sampled by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Continuous uniform range [low, high].
    FloatRange { low: f64, high: f64 },
    /// Integer range [low, high] inclusive.
    IntRange { low: i64, high: i64 },
    /// Uniform range quantized to multiples of `step`.
    QuantizedUniform { low: f64, high: f64, step: f64 },
    /// Categorical choices, drawn uniformly at random.
    Choice { values: Vec<serde_json::Value> },
    /// Fixed grid of explicit values, cycled deterministically by trial number.
    Grid { values: Vec<serde_json::Value> },
}

/// The inline search space: an ordered list of parameter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub parameters: Vec<ParameterDef>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add_float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParamKind::FloatRange { low, high },
        });
        self
    }

    pub fn add_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParamKind::IntRange { low, high },
        });
        self
    }

    pub fn add_quniform(mut self, name: impl Into<String>, low: f64, high: f64, step: f64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParamKind::QuantizedUniform { low, high, step },
        });
        self
    }

    pub fn add_choice(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParamKind::Choice { values },
        });
        self
    }

    pub fn add_grid(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParamKind::Grid { values },
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Names of all declared parameters, in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// Check ranges, steps, value lists, and name uniqueness.
    pub fn validate(&self) -> HlResult<()> {
        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(SpaceError::DuplicateParameter {
                    name: param.name.clone(),
                }
                .into());
            }
            match &param.kind {
                ParamKind::FloatRange { low, high } => {
                    if low >= high {
                        return Err(SpaceError::InvalidRange {
                            name: param.name.clone(),
                            low: *low,
                            high: *high,
                        }
                        .into());
                    }
                }
                ParamKind::IntRange { low, high } => {
                    if low > high {
                        return Err(SpaceError::InvalidRange {
                            name: param.name.clone(),
                            low: *low as f64,
                            high: *high as f64,
                        }
                        .into());
                    }
                }
                ParamKind::QuantizedUniform { low, high, step } => {
                    if low >= high {
                        return Err(SpaceError::InvalidRange {
                            name: param.name.clone(),
                            low: *low,
                            high: *high,
                        }
                        .into());
                    }
                    if *step <= 0.0 {
                        return Err(SpaceError::InvalidStep {
                            name: param.name.clone(),
                            step: *step,
                        }
                        .into());
                    }
                }
                ParamKind::Choice { values } | ParamKind::Grid { values } => {
                    if values.is_empty() {
                        return Err(SpaceError::EmptyValues {
                            name: param.name.clone(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    /// Draw a configuration for trial `trial_number`.
    ///
    /// Ranges and choices sample randomly; grid parameters cycle round-robin
    /// by trial number so every grid value is visited.
    pub fn sample(&self, trial_number: usize, rng: &mut impl Rng) -> ParamMap {
        let mut params = ParamMap::new();
        for param in &self.parameters {
            let value = match &param.kind {
                ParamKind::FloatRange { low, high } => {
                    ParamValue::Float(rng.gen_range(*low..=*high))
                }
                ParamKind::IntRange { low, high } => ParamValue::Int(rng.gen_range(*low..=*high)),
                ParamKind::QuantizedUniform { low, high, step } => {
                    let raw: f64 = rng.gen_range(*low..=*high);
                    ParamValue::Float(quantize(raw, *low, *high, *step))
                }
                ParamKind::Choice { values } => {
                    let idx = rng.gen_range(0..values.len());
                    ParamValue::Json(values[idx].clone())
                }
                ParamKind::Grid { values } => {
                    ParamValue::Json(values[trial_number % values.len()].clone())
                }
            };
            params.insert(param.name.clone(), value);
        }
        params
    }

    /// Total number of grid points (returns `None` if any parameter is
    /// continuous without a natural grid).
    pub fn grid_size(&self) -> Option<usize> {
        let mut total: usize = 1;
        for param in &self.parameters {
            let dim_size = match &param.kind {
                ParamKind::IntRange { low, high } => (high - low + 1) as usize,
                ParamKind::QuantizedUniform { low, high, step } => {
                    (((high - low) / step).floor() as usize) + 1
                }
                ParamKind::Choice { values } | ParamKind::Grid { values } => values.len(),
                // Continuous dimensions need explicit step count — not grid-able by default.
                ParamKind::FloatRange { .. } => return None,
            };
            total = total.checked_mul(dim_size)?;
        }
        Some(total)
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

/// Round `value` to the nearest multiple of `step` from `low`, clamped to the range.
pub(crate) fn quantize(value: f64, low: f64, high: f64, step: f64) -> f64 {
    let snapped = low + ((value - low) / step).round() * step;
    snapped.clamp(low, high)
}
