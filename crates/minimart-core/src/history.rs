//! # Transaction History
//!
//! The last finalized sale (for reprint) and the shift's recent invoices
//! (for void).
//!
//! ## Void Flow
//! ```text
//! void_invoice(name) ──► backend returns released lines
//!                              │
//!                              ▼
//!                  apply_void(name, released, stock)
//!                    ├── stock.release(code, qty) per line
//!                    ├── forget last_sale if it was this invoice
//!                    └── drop the invoice from the recent list
//! ```
//!
//! The released lines come from the backend, not from local memory, so an
//! invoice finalized before this session started releases correctly too.

use tracing::debug;

use crate::money::Quantity;
use crate::stock::StockCache;
use crate::types::{FinalizedSale, Receipt, RecentInvoice, ReleasedLine};

/// Number of recent invoices kept when no limit is configured.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHistory {
    last_sale: Option<FinalizedSale>,
    recent: Vec<RecentInvoice>,
    recent_limit: usize,
}

impl Default for TransactionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_LIMIT)
    }
}

impl TransactionHistory {
    /// Creates an empty history keeping at most `recent_limit` invoices.
    pub fn new(recent_limit: usize) -> Self {
        Self {
            last_sale: None,
            recent: Vec::new(),
            recent_limit: recent_limit.max(1),
        }
    }

    /// Remembers a sale the backend accepted.
    pub fn record(&mut self, sale: FinalizedSale) -> &FinalizedSale {
        debug!(invoice_id = %sale.invoice_id, total = %sale.total, "Sale recorded");
        self.last_sale.insert(sale)
    }

    pub fn last_sale(&self) -> Option<&FinalizedSale> {
        self.last_sale.as_ref()
    }

    /// Replaces the recent list with a fresh backend snapshot.
    pub fn replace_recent(&mut self, invoices: Vec<RecentInvoice>) {
        self.recent = invoices;
        self.recent.truncate(self.recent_limit);
    }

    pub fn recent(&self) -> &[RecentInvoice] {
        &self.recent
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Applies a confirmed void: puts the released quantities back and
    /// forgets the invoice locally.
    ///
    /// ## Returns
    /// Total quantity released to the stock cache.
    pub fn apply_void(
        &mut self,
        invoice_name: &str,
        released: &[ReleasedLine],
        stock: &mut StockCache,
    ) -> Quantity {
        for line in released {
            stock.release(&line.item_code, line.qty);
        }

        if self
            .last_sale
            .as_ref()
            .is_some_and(|sale| sale.invoice_id == invoice_name)
        {
            self.last_sale = None;
        }
        self.recent.retain(|inv| inv.name != invoice_name);

        let total: Quantity = released.iter().map(|l| l.qty).sum();
        debug!(invoice_name, lines = released.len(), released = %total, "Void applied");
        total
    }

    /// Receipt data for the last sale, if any.
    pub fn receipt(&self, company: &str) -> Option<Receipt> {
        self.last_sale.as_ref().map(|sale| Receipt {
            company: company.to_string(),
            invoice_id: sale.invoice_id.clone(),
            lines: sale.lines.clone(),
            total: sale.total,
            paid: sale.amount_paid,
            change: sale.change,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{CartLine, StockEntry};
    use chrono::Utc;

    fn sale(id: &str) -> FinalizedSale {
        FinalizedSale {
            invoice_id: id.to_string(),
            lines: vec![CartLine {
                item_code: "SKU1".to_string(),
                item_name: "Product".to_string(),
                unit_price: Money::from_cents(5000),
                quantity: Quantity::from_units(2),
            }],
            total: Money::from_cents(10000),
            amount_paid: Money::from_cents(15000),
            change: Money::from_cents(5000),
            customer: "Guest".to_string(),
            payment_method: "Cash".to_string(),
            completed_at: Utc::now(),
        }
    }

    fn recent(name: &str) -> RecentInvoice {
        RecentInvoice {
            name: name.to_string(),
            grand_total: Money::from_cents(10000),
            customer: "Guest".to_string(),
            creation: None,
        }
    }

    #[test]
    fn test_void_releases_exactly_the_sold_quantity() {
        let mut stock = StockCache::new();
        stock.seed(vec![StockEntry {
            item_code: "SKU1".to_string(),
            available_quantity: Quantity::from_units(1),
        }]);
        let mut history = TransactionHistory::default();
        history.record(sale("INV-1"));
        history.replace_recent(vec![recent("INV-1"), recent("INV-0")]);

        let released = history.apply_void(
            "INV-1",
            &[ReleasedLine {
                item_code: "SKU1".to_string(),
                qty: Quantity::from_units(2),
            }],
            &mut stock,
        );

        assert_eq!(released, Quantity::from_units(2));
        assert_eq!(stock.lookup("SKU1"), Some(Quantity::from_units(3)));
        assert!(history.last_sale().is_none());
        assert_eq!(history.recent().len(), 1);
        assert_eq!(history.recent()[0].name, "INV-0");
    }

    #[test]
    fn test_void_of_older_invoice_keeps_last_sale() {
        let mut stock = StockCache::new();
        let mut history = TransactionHistory::default();
        history.record(sale("INV-2"));

        history.apply_void("INV-1", &[], &mut stock);

        assert_eq!(history.last_sale().unwrap().invoice_id, "INV-2");
    }

    #[test]
    fn test_recent_list_is_bounded() {
        let mut history = TransactionHistory::new(3);
        history.replace_recent((0..8).map(|i| recent(&format!("INV-{i}"))).collect());

        assert_eq!(history.recent().len(), 3);
        assert_eq!(history.recent()[0].name, "INV-0");
    }

    #[test]
    fn test_receipt_from_last_sale() {
        let mut history = TransactionHistory::default();
        assert!(history.receipt("MiniMart").is_none());

        history.record(sale("INV-9"));
        let receipt = history.receipt("MiniMart").unwrap();

        assert_eq!(receipt.company, "MiniMart");
        assert_eq!(receipt.invoice_id, "INV-9");
        assert_eq!(receipt.paid, Money::from_cents(15000));
        assert_eq!(receipt.change, Money::from_cents(5000));
        assert_eq!(receipt.lines.len(), 1);
    }
}
