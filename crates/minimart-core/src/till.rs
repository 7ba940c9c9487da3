//! # Till
//!
//! One cashier session's in-memory state: shift, stock estimate, cart and
//! history, behind a single object with no globals.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Till                                      │
//! │                                                                         │
//! │   ShiftLifecycle ──gates──► CartEngine ──reserve/release──► StockCache  │
//! │                                 │                               ▲       │
//! │                            total()                              │       │
//! │                                 ▼                               │       │
//! │                          payment::prepare                       │       │
//! │                                 │                               │       │
//! │                     complete_checkout()                         │       │
//! │                                 ▼                               │       │
//! │                        TransactionHistory ──apply_void──────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous. The async session performs the backend
//! round trip between `prepare_checkout` and `complete_checkout` (and
//! between the `check_can_*` calls and their `mark_*` counterparts) while
//! holding the till exclusively.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cart::{CartEngine, LineChange};
use crate::error::{CoreError, CoreResult};
use crate::history::TransactionHistory;
use crate::money::{Money, Quantity};
use crate::payment::{self, CheckoutDraft};
use crate::shift::{ShiftLifecycle, ShiftState};
use crate::stock::StockCache;
use crate::types::{
    CatalogItem, FinalizedSale, Receipt, RecentInvoice, ReleasedLine, Shift, ShiftStatus,
    StockEntry, StockLevel,
};
use crate::validation::validate_non_negative;

/// What a successful close leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedShift {
    pub shift: Shift,
    /// Lines that were still in the cart. They are dropped without
    /// releasing stock.
    pub abandoned_lines: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Till {
    lifecycle: ShiftLifecycle,
    stock: StockCache,
    cart: CartEngine,
    history: TransactionHistory,
    catalog: Vec<CatalogItem>,
}

impl Till {
    /// Creates a till with a closed shift and an empty cache.
    pub fn new(recent_limit: usize) -> Self {
        Self {
            history: TransactionHistory::new(recent_limit),
            ..Self::default()
        }
    }

    // =========================================================================
    // Shift
    // =========================================================================

    pub fn shift_state(&self) -> &ShiftState {
        self.lifecycle.state()
    }

    pub fn shift(&self) -> Option<&Shift> {
        self.lifecycle.shift()
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle.is_open()
    }

    /// Opening entry of the open shift, if the backend assigned one.
    pub fn opening_entry(&self) -> Option<&str> {
        self.lifecycle.shift()?.opening_entry_id.as_deref()
    }

    /// Returns the open shift, or `ShiftNotOpen`.
    pub fn require_open(&self) -> CoreResult<&Shift> {
        self.lifecycle.require_open()
    }

    /// Checks that a shift may be opened with this float.
    pub fn check_can_open(&self, opening_amount: Money) -> CoreResult<()> {
        self.lifecycle.check_can_open()?;
        validate_non_negative("opening amount", opening_amount)?;
        Ok(())
    }

    /// Records a shift the backend just created.
    pub fn mark_open(&mut self, shift: Shift) -> CoreResult<&Shift> {
        validate_non_negative("opening amount", shift.opening_amount)?;
        self.lifecycle.mark_open(shift)
    }

    /// Adopts an already-open shift reported by the backend.
    pub fn resume(&mut self, status: &ShiftStatus) -> CoreResult<Option<&Shift>> {
        self.lifecycle.resume(status)
    }

    /// Checks that the open shift may be closed and returns it.
    pub fn check_can_close(&self) -> CoreResult<&Shift> {
        self.lifecycle.check_can_close()
    }

    /// Records a confirmed close. The cart is abandoned: dropped with no
    /// stock release.
    pub fn mark_closed(&mut self, closing_entry: Option<String>) -> CoreResult<ClosedShift> {
        let shift = self.lifecycle.mark_closed(closing_entry)?;
        let abandoned_lines = self.cart.line_count();
        self.cart.clear();
        if abandoned_lines > 0 {
            info!(abandoned_lines, "Cart abandoned at shift close");
        }
        Ok(ClosedShift {
            shift,
            abandoned_lines,
        })
    }

    // =========================================================================
    // Catalog & Stock
    // =========================================================================

    /// Loads a catalog snapshot and reseeds the stock cache from it.
    pub fn seed_catalog(&mut self, items: Vec<CatalogItem>) {
        self.stock
            .seed(items.iter().filter_map(CatalogItem::stock_entry));
        self.catalog = items;
        debug!(items = self.catalog.len(), "Catalog loaded");
    }

    /// Replaces the stock cache with fresh server numbers. The catalog and
    /// cart are left alone.
    pub fn apply_stock_sync(&mut self, entries: Vec<StockEntry>) {
        self.stock.seed(entries);
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    /// Catalog items matching a search keyword, in catalog order.
    pub fn search<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a CatalogItem> + 'a {
        self.catalog.iter().filter(move |item| item.matches(keyword))
    }

    pub fn catalog_item(&self, item_code: &str) -> Option<&CatalogItem> {
        self.catalog.iter().find(|item| item.item_code == item_code)
    }

    pub fn stock(&self) -> &StockCache {
        &self.stock
    }

    pub fn stock_level(&self, item_code: &str, low_threshold: Quantity) -> Option<StockLevel> {
        self.stock.level(item_code, low_threshold)
    }

    // =========================================================================
    // Cart (all gated on an open shift)
    // =========================================================================

    pub fn add_item(&mut self, item: &CatalogItem) -> CoreResult<usize> {
        self.lifecycle.require_open()?;
        self.cart.add_item(&mut self.stock, item)
    }

    /// Adds an item from the loaded catalog by code.
    pub fn add_by_code(&mut self, item_code: &str) -> CoreResult<usize> {
        self.lifecycle.require_open()?;
        let item = self
            .catalog
            .iter()
            .find(|item| item.item_code == item_code)
            .ok_or_else(|| CoreError::ItemNotFound(item_code.to_string()))?;
        self.cart.add_item(&mut self.stock, item)
    }

    pub fn update_quantity(&mut self, index: usize, delta: Quantity) -> CoreResult<LineChange> {
        self.lifecycle.require_open()?;
        self.cart.update_quantity(&mut self.stock, index, delta)
    }

    pub fn set_quantity(&mut self, index: usize, quantity: Quantity) -> CoreResult<LineChange> {
        self.lifecycle.require_open()?;
        self.cart.set_quantity(&mut self.stock, index, quantity)
    }

    pub fn remove_line(&mut self, index: usize) -> CoreResult<()> {
        self.lifecycle.require_open()?;
        self.cart.remove_line(&mut self.stock, index).map(|_| ())
    }

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// Cart total at currency precision.
    pub fn amount_due(&self) -> Money {
        payment::amount_due(&self.cart)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Validates a tender against the current cart.
    pub fn prepare_checkout(
        &self,
        tendered: Money,
        payment_method: Option<&str>,
        customer: Option<&str>,
    ) -> CoreResult<CheckoutDraft> {
        let shift = self.lifecycle.require_open()?;
        payment::prepare(&self.cart, tendered, payment_method, customer, &shift.profile)
    }

    /// Records a sale the backend accepted and clears the cart. Stock is
    /// not touched: the reserved units have left the shelf.
    pub fn complete_checkout(
        &mut self,
        draft: CheckoutDraft,
        invoice_id: String,
        completed_at: DateTime<Utc>,
    ) -> CoreResult<&FinalizedSale> {
        self.lifecycle.require_open()?;

        let sale = draft.complete(invoice_id, completed_at);
        info!(
            invoice_id = %sale.invoice_id,
            total = %sale.total,
            change = %sale.change,
            "Sale finalized"
        );

        self.cart.clear();
        Ok(self.history.record(sale))
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn last_sale(&self) -> Option<&FinalizedSale> {
        self.history.last_sale()
    }

    pub fn recent_invoices(&self) -> &[RecentInvoice] {
        self.history.recent()
    }

    pub fn recent_limit(&self) -> usize {
        self.history.recent_limit()
    }

    pub fn replace_recent(&mut self, invoices: Vec<RecentInvoice>) {
        self.history.replace_recent(invoices);
    }

    /// Applies a void the backend confirmed.
    pub fn apply_void(&mut self, invoice_name: &str, released: &[ReleasedLine]) -> Quantity {
        self.history.apply_void(invoice_name, released, &mut self.stock)
    }

    /// Receipt data for the last sale.
    pub fn receipt(&self) -> Option<Receipt> {
        let company = self.lifecycle.shift().map(Shift::company).unwrap_or_default();
        self.history.receipt(company)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShiftProfile;

    fn profile() -> ShiftProfile {
        ShiftProfile {
            pos_profile: "Main Counter".to_string(),
            company: "MiniMart".to_string(),
            customer_default: None,
            payment_methods: vec!["Cash".to_string()],
        }
    }

    fn item(code: &str, cents: i64, qty: i64) -> CatalogItem {
        CatalogItem {
            item_code: code.to_string(),
            item_name: format!("Item {code}"),
            price: Money::from_cents(cents),
            actual_qty: Some(Quantity::from_units(qty)),
            image: None,
        }
    }

    fn open_till() -> Till {
        let mut till = Till::new(10);
        till.seed_catalog(vec![item("SKU1", 5000, 3), item("SKU2", 2000, 10)]);
        till.mark_open(Shift {
            opening_entry_id: Some("POS-OPE-0001".to_string()),
            opening_amount: Money::from_cents(100000),
            profile: profile(),
        })
        .unwrap();
        till
    }

    #[test]
    fn test_closed_till_rejects_cart_operations() {
        let mut till = Till::new(10);
        till.seed_catalog(vec![item("SKU1", 5000, 3)]);

        assert_eq!(till.add_by_code("SKU1").unwrap_err(), CoreError::ShiftNotOpen);
        assert_eq!(
            till.update_quantity(0, Quantity::ONE).unwrap_err(),
            CoreError::ShiftNotOpen
        );
        assert_eq!(
            till.prepare_checkout(Money::from_cents(100), None, None)
                .unwrap_err(),
            CoreError::ShiftNotOpen
        );
        assert_eq!(till.stock().lookup("SKU1"), Some(Quantity::from_units(3)));
    }

    #[test]
    fn test_open_rejects_negative_float() {
        let till = Till::new(10);
        assert!(matches!(
            till.check_can_open(Money::from_cents(-1)),
            Err(CoreError::Validation(_))
        ));
        assert!(till.check_can_open(Money::ZERO).is_ok());
    }

    #[test]
    fn test_sale_round_trip() {
        let mut till = open_till();
        till.add_by_code("SKU1").unwrap();
        till.add_by_code("SKU1").unwrap();
        assert_eq!(till.stock().lookup("SKU1"), Some(Quantity::from_units(1)));

        let draft = till
            .prepare_checkout(Money::from_cents(15000), None, None)
            .unwrap();
        assert_eq!(draft.change, Money::from_cents(5000));

        let sale = till
            .complete_checkout(draft, "INV-1".to_string(), Utc::now())
            .unwrap();
        assert_eq!(sale.total, Money::from_cents(10000));

        assert!(till.cart().is_empty());
        // sold units stay out of the estimate
        assert_eq!(till.stock().lookup("SKU1"), Some(Quantity::from_units(1)));
        assert_eq!(till.receipt().unwrap().company, "MiniMart");
    }

    #[test]
    fn test_void_restores_stock() {
        let mut till = open_till();
        till.add_by_code("SKU2").unwrap();
        let draft = till
            .prepare_checkout(Money::from_cents(2000), None, None)
            .unwrap();
        till.complete_checkout(draft, "INV-7".to_string(), Utc::now())
            .unwrap();
        assert_eq!(till.stock().lookup("SKU2"), Some(Quantity::from_units(9)));

        till.apply_void(
            "INV-7",
            &[ReleasedLine {
                item_code: "SKU2".to_string(),
                qty: Quantity::ONE,
            }],
        );

        assert_eq!(till.stock().lookup("SKU2"), Some(Quantity::from_units(10)));
        assert!(till.last_sale().is_none());
    }

    #[test]
    fn test_close_abandons_cart_without_release() {
        let mut till = open_till();
        till.add_by_code("SKU1").unwrap();

        let closed = till.mark_closed(Some("POS-CLO-0001".to_string())).unwrap();

        assert_eq!(closed.abandoned_lines, 1);
        assert!(till.cart().is_empty());
        assert_eq!(till.stock().lookup("SKU1"), Some(Quantity::from_units(2)));
        assert_eq!(till.add_by_code("SKU1").unwrap_err(), CoreError::ShiftNotOpen);
        assert_eq!(
            till.check_can_open(Money::ZERO).unwrap_err(),
            CoreError::SessionEnded
        );
    }

    #[test]
    fn test_stock_sync_overwrites_estimate_only() {
        let mut till = open_till();
        till.add_by_code("SKU1").unwrap();

        till.apply_stock_sync(vec![StockEntry {
            item_code: "SKU1".to_string(),
            available_quantity: Quantity::from_units(50),
        }]);

        assert_eq!(till.stock().lookup("SKU1"), Some(Quantity::from_units(50)));
        assert_eq!(till.stock().lookup("SKU2"), None);
        assert_eq!(till.cart().line_count(), 1);
        assert_eq!(till.catalog().len(), 2);
    }

    #[test]
    fn test_huge_typed_quantity_on_untracked_item_keeps_till_usable() {
        let mut till = open_till();
        let loose = CatalogItem {
            actual_qty: None,
            ..item("LOOSE", 1000, 0)
        };
        till.add_item(&loose).unwrap();

        let typed = crate::validation::parse_quantity("79228162514264337593543950335");
        assert!(typed.is_err());
        assert!(till
            .set_quantity(0, Quantity::new(rust_decimal::Decimal::MAX))
            .is_err());

        assert_eq!(till.amount_due(), Money::from_cents(1000));
    }

    #[test]
    fn test_search_and_unknown_code() {
        let mut till = open_till();
        assert_eq!(till.search("sku2").count(), 1);
        assert_eq!(till.search("").count(), 2);
        assert!(matches!(
            till.add_by_code("NOPE"),
            Err(CoreError::ItemNotFound(_))
        ));
    }
}
