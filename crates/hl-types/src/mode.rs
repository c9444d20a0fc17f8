//! Optimization direction for a tuning run.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether the driver is minimizing or maximizing the objective metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Min,
    Max,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Min
    }
}

impl Mode {
    /// True when `candidate` improves on `incumbent` under this mode.
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Min => candidate < incumbent,
            Self::Max => candidate > incumbent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl FromStr for Mode {
    type Err = crate::HlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(crate::HlError::Config(format!(
                "unknown optimization mode '{other}' (expected \"min\" or \"max\")"
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_follows_direction() {
        assert!(Mode::Min.is_better(0.5, 1.0));
        assert!(!Mode::Min.is_better(1.5, 1.0));
        assert!(Mode::Max.is_better(1.5, 1.0));
        assert!(!Mode::Max.is_better(0.5, 1.0));
    }

    #[test]
    fn parses_from_wire_strings() {
        assert_eq!("min".parse::<Mode>().unwrap(), Mode::Min);
        assert_eq!("max".parse::<Mode>().unwrap(), Mode::Max);
        assert!("ascending".parse::<Mode>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Min).unwrap(), "\"min\"");
        let back: Mode = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(back, Mode::Max);
    }
}
