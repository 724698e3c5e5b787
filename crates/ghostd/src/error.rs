//! Error types for the contacts service.

use ghost_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the contacts service and its stores.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Reading or writing a data file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The chat snapshot could not be read. Transient; retried next refresh.
    #[error("chat source unavailable: {0}")]
    Unavailable(String),

    /// A data file held malformed JSON.
    #[error("malformed {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("avatar not found: {0}")]
    AvatarNotFound(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ServiceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures worth retrying on the next tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io { .. })
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ServiceError::Unavailable("gone".to_string()).is_transient());
        assert!(!ServiceError::AvatarNotFound("x".to_string()).is_transient());

        let protocol: ServiceError = ProtocolError::Backend("nope".to_string()).into();
        assert!(!protocol.is_transient());
    }
}
