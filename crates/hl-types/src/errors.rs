use thiserror::Error;

/// Main error type for the Hyperloom system
#[derive(Error, Debug)]
pub enum HlError {
    #[error("Search space error: {0}")]
    Space(#[from] SpaceError),

    #[error("Tuning error: {0}")]
    Tune(#[from] TuneError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Search-space declaration errors
#[derive(Error, Debug)]
pub enum SpaceError {
    #[error("Parameter '{name}' is declared more than once")]
    DuplicateParameter { name: String },

    #[error("Parameter '{name}' has an invalid range: low {low} >= high {high}")]
    InvalidRange { name: String, low: f64, high: f64 },

    #[error("Parameter '{name}' has a non-positive step: {step}")]
    InvalidStep { name: String, step: f64 },

    #[error("Parameter '{name}' declares an empty value list")]
    EmptyValues { name: String },

    #[error("Search space declares no parameters")]
    Empty,
}

/// Trial-orchestration errors
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Objective never reported metric '{metric}'")]
    MetricMissing { metric: String },

    #[error("Objective failed: {message}")]
    ObjectiveFailed { message: String },

    #[error("No trials completed for run '{run_name}'")]
    NoTrialsCompleted { run_name: String },

    #[error("Trial budget must be at least 1")]
    ZeroBudget,
}

/// Result type alias for Hyperloom operations
pub type HlResult<T> = Result<T, HlError>;
