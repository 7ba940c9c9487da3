//! # Validation Module
//!
//! Input validation for cashier-entered values.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal input                                               │
//! │  └── Raw text from the scan box / quantity field / payment dialog     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Parse numbers as Decimal (never as float)                         │
//! │  └── Reject empty codes and negative amounts                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine rules (stock, shift, payment)                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Backend (authoritative stock check, ledger posting)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Quantity};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an ERP document name (item code, invoice name).
pub const MAX_NAME_LENGTH: usize = 140;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item code.
///
/// ```rust
/// use minimart_core::validation::validate_item_code;
///
/// assert!(validate_item_code("COKE-330").is_ok());
/// assert!(validate_item_code("  ").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    validate_name("item_code", code)
}

/// Validates an invoice name before asking the backend to void it.
pub fn validate_invoice_name(name: &str) -> ValidationResult<()> {
    validate_name("invoice_name", name)
}

/// Validates and trims a scanned barcode.
///
/// ## Returns
/// The trimmed barcode; scanners often append whitespace or a newline.
pub fn validate_barcode(barcode: &str) -> ValidationResult<String> {
    let barcode = barcode.trim();
    validate_name("barcode", barcode)?;
    Ok(barcode.to_string())
}

fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a quantity typed into a cart line.
///
/// Unlike a lenient float parse, garbage input is an error rather than
/// zero: a typo must never silently remove the line.
///
/// ```rust
/// use minimart_core::validation::parse_quantity;
///
/// assert!(parse_quantity("0.5").is_ok());
/// assert!(parse_quantity("0").is_ok());   // removes the line downstream
/// assert!(parse_quantity("1,5").is_err());
/// assert!(parse_quantity("1000").is_err());
/// ```
pub fn parse_quantity(input: &str) -> ValidationResult<Quantity> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    let quantity = input
        .parse::<Quantity>()
        .map_err(|e| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: e.to_string(),
        })?;

    validate_quantity_limit(quantity)?;
    Ok(quantity)
}

/// Validates that a line quantity is at most `MAX_ITEM_QUANTITY`.
///
/// Only the upper bound: zero and below mean "remove the line".
pub fn validate_quantity_limit(quantity: Quantity) -> ValidationResult<()> {
    if quantity > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Parses an amount typed into the payment or opening dialog.
pub fn parse_amount(field: &str, input: &str) -> ValidationResult<Money> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let amount = input
        .parse::<Money>()
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })?;

    validate_non_negative(field, amount)?;
    Ok(amount)
}

/// Validates that an amount is zero or more.
///
/// Used for opening float, tendered cash and prices (free items are fine).
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock reservation delta.
pub fn validate_delta(delta: Quantity) -> ValidationResult<()> {
    if !delta.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity delta".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_item_code() {
        assert!(validate_item_code("COKE-330").is_ok());
        assert!(validate_item_code("Rice 25kg").is_ok());

        assert!(validate_item_code("").is_err());
        assert!(validate_item_code("   ").is_err());
        assert!(validate_item_code(&"A".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_barcode_trims() {
        assert_eq!(validate_barcode(" 4800016644290\n").unwrap(), "4800016644290");
        assert!(validate_barcode("\n").is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2").unwrap(), Quantity::from_units(2));
        assert_eq!(parse_quantity(" 0.25 ").unwrap(), Quantity::new(dec!(0.25)));
        assert_eq!(parse_quantity("-1").unwrap(), Quantity::from_units(-1));

        assert!(matches!(
            parse_quantity(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_quantity("two"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_parse_quantity_caps_at_max_item_quantity() {
        assert_eq!(parse_quantity("999").unwrap(), Quantity::from_units(999));
        assert!(matches!(
            parse_quantity("999.5"),
            Err(ValidationError::TooLarge { max: 999, .. })
        ));
        // Decimal::MAX parses fine but must never reach the cart
        assert!(matches!(
            parse_quantity("79228162514264337593543950335"),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(
            parse_amount("tendered", "150.00").unwrap(),
            Money::from_cents(15000)
        );
        assert!(matches!(
            parse_amount("tendered", "-5"),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
        assert!(parse_amount("tendered", "lots").is_err());
    }

    #[test]
    fn test_validate_delta() {
        assert!(validate_delta(Quantity::ONE).is_ok());
        assert!(validate_delta(Quantity::new(dec!(0.1))).is_ok());
        assert!(validate_delta(Quantity::ZERO).is_err());
        assert!(validate_delta(Quantity::from_units(-1)).is_err());
    }
}
