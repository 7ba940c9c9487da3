//! # Domain Types
//!
//! Core domain types used throughout MiniMart POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │    CartLine     │   │ FinalizedSale   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  item_code      │──►│  item_code      │──►│  invoice_id     │       │
//! │  │  item_name      │   │  unit_price     │   │  lines          │       │
//! │  │  price          │   │  quantity       │   │  total / change │       │
//! │  │  actual_qty     │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockEntry     │   │  ShiftProfile   │   │ RecentInvoice   │       │
//! │  │  item_code      │   │  pos_profile    │   │  name           │       │
//! │  │  available_qty  │   │  payment_methods│   │  grand_total    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `CartLine` freezes name and price when the item is scanned; a
//! `FinalizedSale` freezes the whole cart when the invoice is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Quantity};

/// Customer used when neither the cashier nor the POS profile names one.
pub const GUEST_CUSTOMER: &str = "Guest";

/// Payment method offered when the POS profile lists none.
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash";

// =============================================================================
// Catalog
// =============================================================================

/// A sellable item as returned by the catalog or a barcode lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item code - the cart key.
    pub item_code: String,

    /// Display name shown to cashier and on receipt.
    pub item_name: String,

    /// Selling price from the profile's price list.
    pub price: Money,

    /// Stock on hand at snapshot time. `None` for barcode lookups.
    pub actual_qty: Option<Quantity>,

    /// Image URL for the product grid.
    pub image: Option<String>,
}

impl CatalogItem {
    /// Returns the stock entry this item seeds, if it carries a quantity.
    pub fn stock_entry(&self) -> Option<StockEntry> {
        self.actual_qty.map(|available_quantity| StockEntry {
            item_code: self.item_code.clone(),
            available_quantity,
        })
    }

    /// Case-insensitive match on name or code, as the product search box does.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        keyword.is_empty()
            || self.item_name.to_lowercase().contains(&keyword)
            || self.item_code.to_lowercase().contains(&keyword)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Client-side estimate of sellable stock for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub item_code: String,
    pub available_quantity: Quantity,
}

/// Display band for a stock estimate (the badge colour on the product grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Above the low-stock threshold.
    Plenty,
    /// Some left, at or below the threshold.
    Low,
    /// Nothing left.
    Out,
}

impl StockLevel {
    /// Classifies an available quantity against a low-stock threshold.
    pub fn classify(available: Quantity, low_threshold: Quantity) -> Self {
        if available > low_threshold {
            StockLevel::Plenty
        } else if available.is_positive() {
            StockLevel::Low
        } else {
            StockLevel::Out
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A line in the cart.
///
/// ## Invariants
/// - `quantity > 0` while the line exists
/// - `unit_price` is frozen at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_code: String,
    pub item_name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl CartLine {
    /// Creates a one-unit line from a catalog item, capturing its price.
    pub fn from_item(item: &CatalogItem) -> Self {
        CartLine {
            item_code: item.item_code.clone(),
            item_name: item.item_name.clone(),
            unit_price: item.price,
            quantity: Quantity::ONE,
        }
    }

    /// Unit price × quantity, exact.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

// =============================================================================
// Shift
// =============================================================================

/// POS profile settings reported by the backend, with or without an open shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftProfile {
    pub pos_profile: String,
    pub company: String,
    pub customer_default: Option<String>,
    /// Enabled modes of payment, in profile order.
    pub payment_methods: Vec<String>,
}

impl ShiftProfile {
    /// The payment method preselected in the payment dialog.
    pub fn default_payment_method(&self) -> &str {
        self.payment_methods
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
    }

    /// Methods the cashier may choose from.
    pub fn allowed_payment_methods(&self) -> Vec<String> {
        if self.payment_methods.is_empty() {
            vec![DEFAULT_PAYMENT_METHOD.to_string()]
        } else {
            self.payment_methods.clone()
        }
    }

    /// Customer used when the cashier does not pick one.
    pub fn default_customer(&self) -> &str {
        self.customer_default
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(GUEST_CUSTOMER)
    }
}

/// Result of querying the backend for the cashier's current shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftStatus {
    /// Open opening entry, if any.
    pub opening_entry: Option<String>,
    pub profile: ShiftProfile,
}

/// An open cash-drawer shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub opening_entry_id: Option<String>,
    pub opening_amount: Money,
    pub profile: ShiftProfile,
}

impl Shift {
    pub fn pos_profile(&self) -> &str {
        &self.profile.pos_profile
    }

    pub fn company(&self) -> &str {
        &self.profile.company
    }
}

// =============================================================================
// Sales
// =============================================================================

/// An immutable record of a sale the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedSale {
    pub invoice_id: String,
    /// Cart contents at finalize time.
    pub lines: Vec<CartLine>,
    /// Amount due (cart total at currency precision).
    pub total: Money,
    pub amount_paid: Money,
    pub change: Money,
    pub customer: String,
    pub payment_method: String,
    pub completed_at: DateTime<Utc>,
}

/// An invoice in the shift's recent list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentInvoice {
    pub name: String,
    pub grand_total: Money,
    pub customer: String,
    pub creation: Option<String>,
}

impl RecentInvoice {
    /// Short number shown in the list (`ACC-PSINV-2024-00042` → `00042`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('-').next().unwrap_or(&self.name)
    }
}

/// A line the backend put back on the shelf when voiding an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasedLine {
    pub item_code: String,
    pub qty: Quantity,
}

/// Receipt content for the last sale. Rendering happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub company: String,
    pub invoice_id: String,
    pub lines: Vec<CartLine>,
    pub total: Money,
    pub paid: Money,
    pub change: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
