//! Match execution error types
//!
//! Failures carry a structured kind set at the point the original error is
//! caught. The worker pool only ever inspects the kind, never error text.

use thiserror::Error;

/// Classification of a match execution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Database/connectivity failure: connection refused, timeout, pool
    /// exhaustion. Feeds the circuit breaker.
    TransientConnectivity,

    /// Business-logic failure inside a single match. Recorded, never
    /// retried at this layer, does not affect the breaker.
    BusinessLogic,

    /// Anything else, including worker panics
    Unknown,
}

/// Error from the match service collaborator
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Connectivity failure: {0}")]
    Transient(String),

    #[error("Match execution failed ({status}): {message}")]
    Execution { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl MatchError {
    /// Classify this error for circuit breaker accounting
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::Transient(_) => ErrorKind::TransientConnectivity,
            MatchError::Execution { status, .. } => match status {
                // Gateway timeouts and unavailable upstreams are the HTTP
                // face of an exhausted or unreachable database.
                429 | 502 | 503 | 504 => ErrorKind::TransientConnectivity,
                400..=499 => ErrorKind::BusinessLogic,
                _ => ErrorKind::Unknown,
            },
            MatchError::Network(err) => {
                if err.is_connect() || err.is_timeout() {
                    ErrorKind::TransientConnectivity
                } else {
                    ErrorKind::Unknown
                }
            }
            MatchError::InvalidResponse(_) => ErrorKind::Unknown,
        }
    }

    /// Check if this failure should count against the circuit breaker
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientConnectivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kind() {
        let err = MatchError::Transient("connection refused".to_string());
        assert_eq!(err.kind(), ErrorKind::TransientConnectivity);
        assert!(err.is_transient());
    }

    #[test]
    fn test_execution_status_classification() {
        // Unavailable upstream counts as connectivity
        for status in [429, 502, 503, 504] {
            let err = MatchError::Execution {
                status,
                message: "upstream".to_string(),
            };
            assert_eq!(err.kind(), ErrorKind::TransientConnectivity, "status {status}");
        }

        // Application-level rejections are business failures
        let err = MatchError::Execution {
            status: 422,
            message: "match already played".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::BusinessLogic);
        assert!(!err.is_transient());

        // Plain server errors stay unknown
        let err = MatchError::Execution {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_invalid_response_is_unknown() {
        let err = MatchError::InvalidResponse("not JSON".to_string());
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }
}
