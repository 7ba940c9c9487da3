//! # Error Types
//!
//! Domain-specific error types for minimart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  minimart-core errors (this file)                                      │
//! │  ├── CoreError        - Engine rule violations (stock, shift, payment) │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  minimart-backend errors (separate crate)                              │
//! │  └── BackendError     - Transport / rejection from the ERP             │
//! │                                                                         │
//! │  minimart-session errors                                               │
//! │  └── SessionError     - What the cashier UI sees                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → Presentation       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is recoverable: the operation that raised it left the
//! engine exactly as it was before the call.

use thiserror::Error;

use crate::money::{Money, Quantity};

// =============================================================================
// Core Error
// =============================================================================

/// Transaction engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A sale operation was attempted without an open shift.
    #[error("No POS shift is open")]
    ShiftNotOpen,

    /// `open` was requested while a shift is already running.
    #[error("Shift {opening_entry} is already open")]
    ShiftAlreadyOpen { opening_entry: String },

    /// The shift was closed; this session can no longer be used.
    #[error("Shift has been closed, start a new session")]
    SessionEnded,

    /// Scanning an item would take its stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan SKU1 (stock badge: 0)
    ///      │
    ///      ▼
    /// OutOfStock { item_code: "SKU1", available: 0, requested: 1 }
    ///      │
    ///      ▼
    /// UI shows: "Out of stock!"
    /// ```
    #[error("{item_code} is out of stock: available {available}, requested {requested}")]
    OutOfStock {
        item_code: String,
        available: Quantity,
        requested: Quantity,
    },

    /// A quantity increase would take stock below zero.
    #[error("Insufficient stock for {item_code}: available {available}, requested {requested}")]
    InsufficientStock {
        item_code: String,
        available: Quantity,
        requested: Quantity,
    },

    /// Cart index does not point at a line.
    #[error("Cart has no line at position {index} ({len} lines)")]
    LineNotFound { index: usize, len: usize },

    /// Finalize was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Tendered amount does not cover the amount due.
    #[error("Insufficient payment: due {due}, tendered {tendered}")]
    InsufficientPayment { due: Money, tendered: Money },

    /// Payment method is not enabled on the shift's POS profile.
    #[error("Payment method '{method}' is not available (allowed: {allowed:?})")]
    UnknownPaymentMethod { method: String, allowed: Vec<String> },

    /// No item with this code or barcode.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when cashier input doesn't meet requirements.
/// Used for early validation before engine logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is above its allowed maximum.
    #[error("{field} cannot exceed {max}")]
    TooLarge { field: String, max: i64 },

    /// Arithmetic on the value would leave the representable range.
    #[error("{field} is too large to compute")]
    Overflow { field: String },

    /// Invalid format (e.g., a quantity that is not a number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfStock {
            item_code: "SKU1".to_string(),
            available: Quantity::new(dec!(0)),
            requested: Quantity::ONE,
        };
        assert_eq!(
            err.to_string(),
            "SKU1 is out of stock: available 0, requested 1"
        );

        let err = CoreError::InsufficientPayment {
            due: Money::new(dec!(100)),
            tendered: Money::new(dec!(80)),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment: due 100.00, tendered 80.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::MustNotBeNegative {
            field: "opening amount".to_string(),
        };
        assert_eq!(err.to_string(), "opening amount must not be negative");

        let err = ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity cannot exceed 999");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item_code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
