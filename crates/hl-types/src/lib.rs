//! Core types shared across the Hyperloom workspace: parameter values,
//! optimization modes, and the error hierarchy.

pub mod errors;
pub mod mode;
pub mod params;

pub use errors::{HlError, HlResult, SpaceError, TuneError};
pub use mode::Mode;
pub use params::{ParamMap, ParamValue};
