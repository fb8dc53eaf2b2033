//! Error types for the model store.

use thiserror::Error;

/// Result type alias for model store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during model store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open model store: {0}")]
    Open(String),

    #[error("model store is locked by another process: {0}")]
    Busy(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("stored model is corrupt: {0}")]
    Corrupt(String),

    #[error("no model stored under '{0}'; train one first")]
    ModelNotFound(String),
}
