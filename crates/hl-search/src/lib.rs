//! # hl-search
//!
//! Search space declarations and point-suggestion engines for Hyperloom.
//!
//! Provides two ways to declare tunable parameters — inline distribution
//! descriptors consumed by the orchestration layer, and explicit dimension
//! triples owned by a search algorithm — plus the suggestion strategies that
//! consume them (random, grid, and the zeroth-order racing searcher) and a
//! concurrency-limiting wrapper.

mod dimension;
mod limiter;
mod racos;
mod space;
mod strategy;

pub use dimension::{AlgorithmSpace, Dimension};
pub use limiter::ConcurrencyLimiter;
pub use racos::{RacosConfig, RacosSearch};
pub use space::{ParamKind, ParameterDef, SearchSpace};
pub use strategy::{GridSearch, RandomSearch, Searcher};
