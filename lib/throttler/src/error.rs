use std::time::Duration;

use thiserror::Error;

/// Errors raised while building a strategy or a controller.
///
/// Once a controller exists, none of its operations can fail, so this is the
/// only error surface the crate has.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid batch size limits, lower limit {lower} must be less than upper limit {upper}")]
    InvalidBatchSizeLimits { lower: u64, upper: u64 },

    #[error("invalid item size limits, lower limit {lower} must be less than upper limit {upper}")]
    InvalidItemSizeLimits { lower: u64, upper: u64 },

    #[error("upper threshold {upper} must be greater than lower threshold {lower}")]
    InvalidThresholds { lower: u64, upper: u64 },

    #[error("threshold of the pid controller must be positive")]
    ZeroThreshold,

    #[error("pid configuration is required for pid controller")]
    MissingPidConfig,

    #[error("pid {name} gain must be finite and non-negative, got {value}")]
    InvalidGain { name: &'static str, value: f64 },

    #[error("pid integral_max must be finite and positive, got {0}")]
    InvalidIntegralMax(f64),

    #[error("pid output_max must be between 0 and 1, got {0}")]
    InvalidOutputMax(f64),

    #[error("pid sample_time must be positive, got {0:?}")]
    InvalidSampleTime(Duration),

    #[error("unsupported throttle controller type: {0}")]
    UnknownStrategy(String),
}
