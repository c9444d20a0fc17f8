//! Explicit dimension triples handed directly to a search algorithm.
//!
//! This is the second declaration form: instead of inline distribution
//! descriptors resolved by the orchestrator, each dimension is described to
//! the algorithm as (range, precision), (range, ordered-flag), or an explicit
//! value list. Parameters declared here must be withheld from the inline
//! [`crate::SearchSpace`].

use hl_types::{HlResult, ParamValue, SpaceError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::space::quantize;

/// One dimension of an algorithm-owned search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    /// Continuous range sampled at multiples of `precision`.
    Continuous { low: f64, high: f64, precision: f64 },
    /// Integer range; `ordered` marks whether neighboring values are related
    /// (ordinal) or the set is unordered.
    Discrete { low: i64, high: i64, ordered: bool },
    /// Explicit grid of values.
    Grid { values: Vec<serde_json::Value> },
}

/// A search space owned by the algorithm: named dimension triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSpace {
    pub dimensions: Vec<(String, Dimension)>,
}

impl AlgorithmSpace {
    pub fn new() -> Self {
        Self {
            dimensions: Vec::new(),
        }
    }

    pub fn add_continuous(
        mut self,
        name: impl Into<String>,
        low: f64,
        high: f64,
        precision: f64,
    ) -> Self {
        self.dimensions
            .push((name.into(), Dimension::Continuous { low, high, precision }));
        self
    }

    pub fn add_discrete(
        mut self,
        name: impl Into<String>,
        low: i64,
        high: i64,
        ordered: bool,
    ) -> Self {
        self.dimensions
            .push((name.into(), Dimension::Discrete { low, high, ordered }));
        self
    }

    pub fn add_grid(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.dimensions.push((name.into(), Dimension::Grid { values }));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.dimensions.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn validate(&self) -> HlResult<()> {
        if self.dimensions.is_empty() {
            return Err(SpaceError::Empty.into());
        }
        let mut seen = HashSet::new();
        for (name, dim) in &self.dimensions {
            if !seen.insert(name.as_str()) {
                return Err(SpaceError::DuplicateParameter { name: name.clone() }.into());
            }
            match dim {
                Dimension::Continuous { low, high, precision } => {
                    if low >= high {
                        return Err(SpaceError::InvalidRange {
                            name: name.clone(),
                            low: *low,
                            high: *high,
                        }
                        .into());
                    }
                    if *precision <= 0.0 {
                        return Err(SpaceError::InvalidStep {
                            name: name.clone(),
                            step: *precision,
                        }
                        .into());
                    }
                }
                Dimension::Discrete { low, high, .. } => {
                    if low > high {
                        return Err(SpaceError::InvalidRange {
                            name: name.clone(),
                            low: *low as f64,
                            high: *high as f64,
                        }
                        .into());
                    }
                }
                Dimension::Grid { values } => {
                    if values.is_empty() {
                        return Err(SpaceError::EmptyValues { name: name.clone() }.into());
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for AlgorithmSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Dimension {
    /// Draw a uniform random value from this dimension.
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match self {
            Self::Continuous { low, high, precision } => {
                let raw: f64 = rng.gen_range(*low..=*high);
                ParamValue::Float(quantize(raw, *low, *high, *precision))
            }
            Self::Discrete { low, high, .. } => ParamValue::Int(rng.gen_range(*low..=*high)),
            Self::Grid { values } => {
                let idx = rng.gen_range(0..values.len());
                ParamValue::Json(values[idx].clone())
            }
        }
    }
}
