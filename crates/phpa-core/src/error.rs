//! Error types for the forecaster input contract.

use thiserror::Error;

/// Result type alias for input parsing and validation.
pub type InputResult<T> = Result<T, InputError>;

/// Errors raised while reading a forecaster payload.
///
/// Every variant is fatal for the invocation: nothing is computed and no
/// result is written.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no standard input provided")]
    Empty,

    #[error("invalid JSON provided: {0}")]
    Malformed(String),

    #[error("invalid JSON provided: {0}")]
    Schema(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u32),
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Data => InputError::Schema(e.to_string()),
            Category::Io | Category::Syntax | Category::Eof => InputError::Malformed(e.to_string()),
        }
    }
}
