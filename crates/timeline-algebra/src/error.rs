//! Error types for timeline-algebra operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlgebraError {
    /// An operation that needs a closed window received an unbounded side.
    #[error("Bounds error: {0}")]
    Bounds(String),

    /// A slice bound could not be converted to integer seconds.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// Two operands were combined with an operator that has no meaning for them.
    #[error("Composition error: {0}")]
    Composition(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid interval: start {start} must be before end {end}")]
    InvalidInterval { start: i64, end: i64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AlgebraError>;
