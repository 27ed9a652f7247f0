// =============================================================================
// Validation errors
// =============================================================================
//
// Raised at the boundary, before any indicator runs. A series that is merely
// too short for a window is NOT an error; those indices carry the NaN
// sentinel instead.

use thiserror::Error;

/// Configuration or candle-input failure detected by [`crate::engine::analyze`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid regression length {length}: must be >= 2")]
    InvalidLength { length: usize },

    #[error("invalid vwap window {window}: must be >= 1")]
    InvalidVwapWindow { window: usize },

    #[error("invalid {name} {value}: must be >= 1")]
    InvalidAverageLength { name: &'static str, value: usize },

    #[error("invalid band multiplier {name}={value}: must be finite and >= 0")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("candle {index}: field {field} is not finite")]
    NonFiniteValue { index: usize, field: &'static str },

    #[error("candle {index}: high {high} is below low {low}")]
    HighBelowLow { index: usize, high: f64, low: f64 },

    #[error("candle {index}: open/close outside the [low, high] range")]
    OpenCloseOutsideRange { index: usize },

    #[error("candle {index}: negative volume {volume}")]
    NegativeVolume { index: usize, volume: f64 },

    #[error("candle {index}: open time {current} does not follow {previous}")]
    NonMonotonicTime {
        index: usize,
        previous: i64,
        current: i64,
    },
}

/// Result alias for boundary validation.
pub type Result<T> = std::result::Result<T, ValidationError>;
