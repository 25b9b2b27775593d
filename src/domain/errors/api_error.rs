//! Catalog API error taxonomy.

use thiserror::Error;

/// Error returned by the catalog REST surface.
///
/// The variant decides the retry behavior: client and validation errors are
/// final, transient errors are retried by the cache before being surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 4xx response; never retried.
    #[error("{message}")]
    Client { status: u16, message: String },

    /// Request body rejected by the server (detail array); never retried.
    #[error("{message}")]
    Validation { message: String },

    /// Network failure or 5xx response; retried with a fixed delay.
    #[error("{message}")]
    Transient { message: String },
}

impl ApiError {
    /// Creates a client error for a 4xx status.
    #[must_use]
    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Returns whether the cache may retry the request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns the HTTP status for client errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ApiError::transient("connection reset").is_retryable());
        assert!(!ApiError::client(404, "not found").is_retryable());
        assert!(!ApiError::validation("name too long").is_retryable());
    }

    #[test]
    fn test_status_only_on_client_errors() {
        assert_eq!(ApiError::client(403, "forbidden").status(), Some(403));
        assert_eq!(ApiError::transient("timeout").status(), None);
    }
}
