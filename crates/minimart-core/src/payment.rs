//! # Payment Reconciliation
//!
//! Checks a tender against the cart and builds what the backend needs to
//! create the invoice.
//!
//! ## Finalize Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Finalize a Sale                                  │
//! │                                                                         │
//! │  prepare()  ◄── THIS MODULE (pure)                                     │
//! │   1. cart empty?            → EmptyCart                                │
//! │   2. tendered < amount due? → InsufficientPayment                      │
//! │   3. change = tendered − amount due                                    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  CheckoutDraft ──► create_invoice (backend, async)                     │
//! │      │                  │                                               │
//! │      │           rejected → draft dropped, cart untouched              │
//! │      ▼                                                                  │
//! │  complete(invoice_id) ──► FinalizedSale ──► cart cleared by caller     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cart::CartEngine;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, FinalizedSale, ShiftProfile};
use crate::validation::validate_non_negative;

/// Payload of the backend's invoice-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub lines: Vec<CartLine>,
    pub customer: String,
    pub mode_of_payment: String,
    pub amount_paid: Money,
}

/// A validated checkout waiting for the backend's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDraft {
    pub request: InvoiceRequest,
    /// Amount due at currency precision.
    pub total: Money,
    pub change: Money,
}

impl CheckoutDraft {
    /// Turns the draft into the immutable sale record once the backend
    /// has assigned an invoice id.
    pub fn complete(self, invoice_id: String, completed_at: DateTime<Utc>) -> FinalizedSale {
        FinalizedSale {
            invoice_id,
            lines: self.request.lines,
            total: self.total,
            amount_paid: self.request.amount_paid,
            change: self.change,
            customer: self.request.customer,
            payment_method: self.request.mode_of_payment,
            completed_at,
        }
    }
}

/// What the cashier must collect: the cart total at currency precision.
pub fn amount_due(cart: &CartEngine) -> Money {
    cart.total().round_currency()
}

/// Change owed for a tender, or `None` if the tender is short.
pub fn change_for(due: Money, tendered: Money) -> Option<Money> {
    (tendered >= due).then(|| tendered - due)
}

/// Validates a tender and snapshots the cart into a checkout draft.
///
/// ## Arguments
/// * `payment_method` - `None` picks the profile's default method
/// * `customer` - `None` or blank picks the profile's default customer
///
/// ## Errors
/// - `EmptyCart` if there is nothing to sell
/// - `InsufficientPayment` if `tendered` is below the amount due
/// - `UnknownPaymentMethod` if the method is not enabled on the profile
/// - `Validation` if `tendered` is negative
pub fn prepare(
    cart: &CartEngine,
    tendered: Money,
    payment_method: Option<&str>,
    customer: Option<&str>,
    profile: &ShiftProfile,
) -> CoreResult<CheckoutDraft> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    validate_non_negative("tendered amount", tendered)?;

    let due = amount_due(cart);
    let change = change_for(due, tendered).ok_or(CoreError::InsufficientPayment { due, tendered })?;

    let allowed = profile.allowed_payment_methods();
    let method = payment_method
        .map(str::trim)
        .unwrap_or_else(|| profile.default_payment_method());
    if !allowed.iter().any(|m| m == method) {
        return Err(CoreError::UnknownPaymentMethod {
            method: method.to_string(),
            allowed,
        });
    }

    let customer = customer
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| profile.default_customer());

    debug!(%due, %tendered, %change, method, customer, "Checkout prepared");

    Ok(CheckoutDraft {
        request: InvoiceRequest {
            lines: cart.lines().to_vec(),
            customer: customer.to_string(),
            mode_of_payment: method.to_string(),
            amount_paid: tendered,
        },
        total: due,
        change,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
