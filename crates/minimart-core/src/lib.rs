//! # minimart-core: Transaction Engine for MiniMart POS
//!
//! The in-memory heart of the till: cart, stock reservation, payment
//! arithmetic and the shift state machine. No I/O happens here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       MiniMart POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/terminal                                │   │
//! │  │    scan ──► cart ──► pay ──► receipt ──► void ──► close        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            minimart-session (async orchestration)               │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────┐  ┌────────────▼───────────────┐   │
//! │  │  ★ minimart-core (THIS CRATE) ★ │  │   minimart-backend         │   │
//! │  │                                 │  │   PosBackend / Frappe HTTP │   │
//! │  │  Till                           │  └────────────────────────────┘   │
//! │  │   ├── ShiftLifecycle            │                                   │
//! │  │   ├── CartEngine ─► StockCache  │                                   │
//! │  │   ├── payment::prepare          │                                   │
//! │  │   └── TransactionHistory        │                                   │
//! │  │                                 │                                   │
//! │  │  NO I/O • NO ASYNC • DECIMALS   │                                   │
//! │  └─────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, CartLine, Shift, FinalizedSale, ...)
//! - [`money`] - Decimal `Money` and `Quantity`
//! - [`error`] - Domain error types
//! - [`validation`] - Cashier input parsing and checks
//! - [`stock`] - Optimistic stock estimate
//! - [`cart`] - Cart lines and their stock reservations
//! - [`payment`] - Tender checks and checkout drafts
//! - [`shift`] - Shift state machine
//! - [`history`] - Last sale, recent invoices, void release
//! - [`till`] - One session's state behind a single object
//!
//! ## Design Principles
//!
//! 1. **Decimal Money**: prices and quantities are `rust_decimal`, never floats
//! 2. **All or Nothing**: a rejected operation leaves every structure unchanged
//! 3. **No Globals**: a `Till` is created per session and dropped at close
//!
//! ## Example Usage
//!
//! ```rust
//! use minimart_core::{CatalogItem, Money, Quantity, StockCache, CartEngine};
//!
//! let mut stock = StockCache::new();
//! let mut cart = CartEngine::new();
//! let soda = CatalogItem {
//!     item_code: "SODA".to_string(),
//!     item_name: "Soda 330ml".to_string(),
//!     price: Money::from_cents(2500),
//!     actual_qty: Some(Quantity::from_units(1)),
//!     image: None,
//! };
//! stock.seed(soda.stock_entry());
//!
//! cart.add_item(&mut stock, &soda).unwrap();
//! assert!(cart.add_item(&mut stock, &soda).is_err()); // last one is gone
//! assert_eq!(cart.total(), Money::from_cents(2500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod history;
pub mod money;
pub mod payment;
pub mod shift;
pub mod stock;
pub mod till;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartEngine, LineChange};
pub use error::{CoreError, CoreResult, ValidationError};
pub use history::{TransactionHistory, DEFAULT_RECENT_LIMIT};
pub use money::{Money, Quantity};
pub use payment::{CheckoutDraft, InvoiceRequest};
pub use shift::{ShiftLifecycle, ShiftState};
pub use stock::StockCache;
pub use till::{ClosedShift, Till};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock at or below this many units shows the low-stock badge.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Catches a slipped keypad (typing 1000 instead of 10) and keeps every
/// line total far inside `Decimal` range, tracked item or not.
pub const MAX_ITEM_QUANTITY: i64 = 999;
