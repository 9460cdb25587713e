use thiserror::Error;

/// Errors surfaced to callers of the forecast engine and performance tracker.
///
/// None of these are retried internally and no partial results accompany them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Horizon {horizon} is outside the supported range 1..={max}")]
    InvalidHorizon { horizon: u32, max: u32 },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model '{model}' failed at step {step}: {reason}")]
    GenerationError {
        model: String,
        step: u32,
        reason: String,
    },

    #[error("Invalid currency pair: {0}")]
    InvalidPair(String),

    #[error("Performance snapshot error: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Snapshot(err.to_string())
    }
}
