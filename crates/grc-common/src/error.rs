//! Error types for OpenGRC

use thiserror::Error;

/// OpenGRC error type
#[derive(Error, Debug)]
pub enum GrcError {
    /// Rating outside the 1..=5 ordinal scale
    #[error("invalid rating {0}: must be between 1 and 5")]
    InvalidRating(u8),

    /// Required field left empty on create/update
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Enum-like field received a value outside its domain
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Field being parsed
        field: &'static str,
        /// Offending input
        value: String,
    },

    /// Date pair out of order (e.g. due date before start date)
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// Control id outside the Annex A catalog
    #[error("unknown control: {0}")]
    UnknownControl(String),

    /// Field update rejected because the control is excluded from scope
    #[error("control {0} is marked not applicable")]
    ControlNotApplicable(String),

    /// Export format not supported
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for OpenGRC
pub type GrcResult<T> = Result<T, GrcError>;
