//! Analysis error taxonomy with retry classification.
//!
//! Every failure of a single backend round trip is an [`AnalysisError`].
//! Callers query `retry_category()` / `is_retriable()` instead of matching on
//! message text.
//!
//! | Category   | Variants                        | Retriable |
//! |------------|---------------------------------|-----------|
//! | Connection | `Unavailable`, `Transport`      | yes       |
//! | Backend    | `Backend { status, body }`      | no        |
//! | Protocol   | `MalformedResponse`             | no        |
//!
//! Parser degradation is deliberately absent: missing labels in a reply
//! default individual fields and never surface as an error.

use std::fmt;

use requirements::IllegalTransition;
use thiserror::Error;

/// Classification used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Backend unreachable or the connection failed mid-request.
    Connection,
    /// Backend answered with a non-success status.
    Backend,
    /// Backend answered 2xx with a body that is not the expected JSON.
    Protocol,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::Connection)
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Backend => write!(f, "backend"),
            Self::Protocol => write!(f, "protocol"),
        }
    }
}

/// Failure of one analysis round trip.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Liveness probe failed before the completion was attempted.
    #[error("Inference backend is not available at {base_url}; check that it is running")]
    Unavailable { base_url: String },

    /// Network-level failure during the completion request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP response.
    #[error("Backend error: {status} - {body}")]
    Backend { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Unavailable { .. } | Self::Transport(_) => RetryCategory::Connection,
            Self::Backend { .. } => RetryCategory::Backend,
            Self::MalformedResponse(_) => RetryCategory::Protocol,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Misuse of the batch orchestrator.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("a batch run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_class_is_retriable() {
        let err = AnalysisError::Transport("connection refused".into());
        assert!(err.is_retriable());
        assert_eq!(err.retry_category(), RetryCategory::Connection);

        let err = AnalysisError::Unavailable {
            base_url: "http://localhost:11434".into(),
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn backend_error_is_terminal() {
        let err = AnalysisError::Backend {
            status: 503,
            body: "connection pool exhausted".into(),
        };
        // classification is by variant, never by body text
        assert!(!err.is_retriable());
        assert_eq!(err.to_string(), "Backend error: 503 - connection pool exhausted");
    }

    #[test]
    fn malformed_response_is_terminal() {
        let err = AnalysisError::MalformedResponse("expected value".into());
        assert_eq!(err.retry_category(), RetryCategory::Protocol);
        assert!(!err.is_retriable());
    }

    #[test]
    fn unavailable_message_names_base_url() {
        let err = AnalysisError::Unavailable {
            base_url: "http://gpu-01:11434".into(),
        };
        assert!(err.to_string().contains("http://gpu-01:11434"));
    }
}
