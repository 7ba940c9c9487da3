//! # Session Error Type
//!
//! The one error type the cashier-facing layer sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Flow in MiniMart POS                          │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► SessionError ──► code() + message │
//! │  reqwest / JSON ──► BackendError ┘         │                            │
//! │                                            ▼                            │
//! │                                  terminal prints "[OUT_OF_STOCK] ..."   │
//! │                                                                         │
//! │  Nothing is fatal: after any error the session is in the state it was   │
//! │  in before the failed operation.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use minimart_backend::BackendError;
use minimart_core::CoreError;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A local rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The backend failed or rejected the request.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend did not create the opening entry. The shift may still
    /// exist; re-query with `check_status` before trying again.
    #[error("Could not open shift: {0}")]
    ShiftCreation(BackendError),

    /// The terminal configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Machine-readable error codes for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ShiftNotOpen,
    ShiftAlreadyOpen,
    SessionEnded,
    OutOfStock,
    InsufficientStock,
    NotFound,
    EmptyCart,
    InsufficientPayment,
    PaymentMethod,
    ValidationError,
    ShiftCreation,
    BackendRejected,
    BackendUnavailable,
    BackendProtocol,
    Config,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::ShiftNotOpen => "SHIFT_NOT_OPEN",
            ErrorCode::ShiftAlreadyOpen => "SHIFT_ALREADY_OPEN",
            ErrorCode::SessionEnded => "SESSION_ENDED",
            ErrorCode::OutOfStock => "OUT_OF_STOCK",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::EmptyCart => "EMPTY_CART",
            ErrorCode::InsufficientPayment => "INSUFFICIENT_PAYMENT",
            ErrorCode::PaymentMethod => "PAYMENT_METHOD",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ShiftCreation => "SHIFT_CREATION",
            ErrorCode::BackendRejected => "BACKEND_REJECTED",
            ErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ErrorCode::BackendProtocol => "BACKEND_PROTOCOL",
            ErrorCode::Config => "CONFIG",
        };
        f.write_str(code)
    }
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::Core(err) => match err {
                CoreError::ShiftNotOpen => ErrorCode::ShiftNotOpen,
                CoreError::ShiftAlreadyOpen { .. } => ErrorCode::ShiftAlreadyOpen,
                CoreError::SessionEnded => ErrorCode::SessionEnded,
                CoreError::OutOfStock { .. } => ErrorCode::OutOfStock,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::LineNotFound { .. } | CoreError::ItemNotFound(_) => ErrorCode::NotFound,
                CoreError::EmptyCart => ErrorCode::EmptyCart,
                CoreError::InsufficientPayment { .. } => ErrorCode::InsufficientPayment,
                CoreError::UnknownPaymentMethod { .. } => ErrorCode::PaymentMethod,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            SessionError::Backend(err) => match err {
                BackendError::Rejected { .. } => ErrorCode::BackendRejected,
                BackendError::Transport { .. } | BackendError::Timeout { .. } => {
                    ErrorCode::BackendUnavailable
                }
                BackendError::Decode { .. } => ErrorCode::BackendProtocol,
                BackendError::InvalidConfig(_) => ErrorCode::Config,
            },
            SessionError::ShiftCreation(_) => ErrorCode::ShiftCreation,
            SessionError::Config(_) => ErrorCode::Config,
        }
    }

    /// Returns true if the cashier can carry on with this session.
    ///
    /// Only an ended session and a broken configuration need a restart.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.code(), ErrorCode::SessionEnded | ErrorCode::Config)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimart_core::{Money, Quantity};

    #[test]
    fn test_codes() {
        let err: SessionError = CoreError::OutOfStock {
            item_code: "SKU1".into(),
            available: Quantity::ZERO,
            requested: Quantity::ONE,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::OutOfStock);
        assert_eq!(err.code().to_string(), "OUT_OF_STOCK");
        assert!(err.is_recoverable());

        let err: SessionError = BackendError::Timeout {
            method: "create_invoice".into(),
            seconds: 30,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::BackendUnavailable);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unrecoverable() {
        assert!(!SessionError::from(CoreError::SessionEnded).is_recoverable());
        assert!(!SessionError::Config("bad toml".into()).is_recoverable());
    }

    #[test]
    fn test_messages_pass_through() {
        let err: SessionError = CoreError::InsufficientPayment {
            due: Money::from_cents(10000),
            tendered: Money::from_cents(8000),
        }
        .into();
        assert_eq!(err.to_string(), "Insufficient payment: due 100.00, tendered 80.00");

        let err = SessionError::ShiftCreation(BackendError::rejected(
            "create_opening_entry",
            417,
            "POS Opening Entry already open",
        ));
        assert_eq!(err.to_string(), "Could not open shift: POS Opening Entry already open");
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        // serde name and Display agree
        for code in [ErrorCode::ShiftNotOpen, ErrorCode::BackendUnavailable, ErrorCode::EmptyCart] {
            let value = toml::Value::try_from(SerializeWrap { code }).unwrap();
            assert_eq!(value["code"].as_str().unwrap(), code.to_string());
        }
    }

    #[derive(Serialize)]
    struct SerializeWrap {
        code: ErrorCode,
    }
}
