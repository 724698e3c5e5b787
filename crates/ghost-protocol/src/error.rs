//! Protocol-level errors.

use thiserror::Error;

/// Errors raised while decoding service payloads.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload was not valid JSON of the expected shape
    #[error("Failed to parse payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Service answered with an application error
    #[error("{0}")]
    Backend(String),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
