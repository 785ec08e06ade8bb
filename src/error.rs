use crate::interpolate::InterpolationError;
use crate::level::UnknownSeverity;

/// Error type returned by every fallible operation in this crate.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error(transparent)]
    UnknownSeverity(#[from] UnknownSeverity),

    #[error("message interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    #[error("invalid value {value:?} for setting {key}")]
    InvalidSetting { key: String, value: String },

    /// The sink rejected a write or flush. Never retried here.
    #[error("sink write failed: {0}")]
    Sink(#[from] std::io::Error),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}
