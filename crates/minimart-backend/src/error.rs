//! # Backend Error Types
//!
//! What can go wrong between the till and the ERP.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Backend Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Transport    │  │    Rejection    │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Transport      │  │  Rejected       │  │  Decode                 │ │
//! │  │  Timeout        │  │  (non-2xx with  │  │  (2xx body we could     │ │
//! │  │                 │  │   ERP message)  │  │   not understand)       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Configuration  │   Raised before any request is sent.              │
//! │  │  InvalidConfig  │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these is retried automatically. A rejected or failed request
//! never changes local state.

use thiserror::Error;

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never got a response (DNS, connection refused, TLS).
    #[error("{method}: request failed: {message}")]
    Transport { method: String, message: String },

    /// No response within the configured timeout.
    #[error("{method}: no response after {seconds} seconds")]
    Timeout { method: String, seconds: u64 },

    // =========================================================================
    // Rejection
    // =========================================================================
    /// The ERP answered with an error status.
    ///
    /// `message` is the ERP's own explanation when it sent one
    /// (e.g. "No submitted invoices found for this shift.").
    #[error("{message}")]
    Rejected {
        method: String,
        status: u16,
        message: String,
    },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// A success response whose body did not have the expected shape.
    #[error("{method}: unexpected response: {reason}")]
    Decode { method: String, reason: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    pub fn rejected(method: &str, status: u16, message: impl Into<String>) -> Self {
        BackendError::Rejected {
            method: method.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn decode(method: &str, reason: impl std::fmt::Display) -> Self {
        BackendError::Decode {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the request may have failed for reasons unrelated to
    /// its content, so asking again later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Transport { .. } | BackendError::Timeout { .. }
        )
    }

    /// The backend method the error came from, if any.
    pub fn method(&self) -> Option<&str> {
        match self {
            BackendError::Transport { method, .. }
            | BackendError::Timeout { method, .. }
            | BackendError::Rejected { method, .. }
            | BackendError::Decode { method, .. } => Some(method),
            BackendError::InvalidConfig(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_shows_erp_message() {
        let err = BackendError::rejected("close_pos_shift", 417, "No submitted invoices found for this shift.");
        assert_eq!(err.to_string(), "No submitted invoices found for this shift.");
        assert_eq!(err.method(), Some("close_pos_shift"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        let timeout = BackendError::Timeout {
            method: "create_invoice".to_string(),
            seconds: 30,
        };
        assert!(timeout.is_transient());
        assert_eq!(timeout.to_string(), "create_invoice: no response after 30 seconds");

        assert!(!BackendError::InvalidConfig("x".into()).is_transient());
    }
}
