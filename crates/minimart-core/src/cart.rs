//! # Cart Engine
//!
//! Owns the cart lines and keeps the stock cache in step with them.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations vs Stock Cache                       │
//! │                                                                         │
//! │  Cashier Action           CartEngine              StockCache            │
//! │  ──────────────           ──────────              ──────────            │
//! │                                                                         │
//! │  Scan / click item ─────► add_item() ───────────► reserve(1) strict    │
//! │                                                                         │
//! │  [+] / [-] buttons ─────► update_quantity(±1) ──► reserve / release    │
//! │                                                                         │
//! │  Type a quantity ───────► set_quantity(n) ──────► reserve / release    │
//! │                                                                         │
//! │  Click [×] ─────────────► remove_line() ────────► release(all)         │
//! │                                                                         │
//! │  Sale finalized ────────► clear() ──────────────► (untouched)          │
//! │                                                                         │
//! │  NOTE: Every operation either fully applies or changes nothing.        │
//! │        Reservation happens BEFORE the line changes, so a failed        │
//! │        reserve leaves the cart at its prior value.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `item_code` (adding the same item merges)
//! - Every line has `0 < quantity <= MAX_ITEM_QUANTITY`; reaching zero
//!   removes the line
//! - `total()` is recomputed from the lines on every call and always fits
//!   in a `Decimal`: a change that would overflow it is rejected

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Quantity};
use crate::stock::StockCache;
use crate::types::{CartLine, CatalogItem};
use crate::validation::{validate_item_code, validate_non_negative, validate_quantity_limit};

/// Outcome of a quantity change on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    /// The line is still in the cart with this quantity.
    Updated { index: usize, quantity: Quantity },
    /// The quantity dropped to zero or below and the line was removed.
    Removed(CartLine),
}

/// The cart: ordered lines, insertion order = display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEngine {
    lines: Vec<CartLine>,
}

impl CartEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of an item, merging with an existing line.
    ///
    /// ## Behavior
    /// - Item already in cart: quantity + 1, price unchanged
    /// - Item not in cart: new line at `item.price` with quantity 1
    ///
    /// ## Returns
    /// The index of the affected line.
    ///
    /// ## Errors
    /// - `OutOfStock` if the stock estimate has no unit left
    /// - `Validation` for a negative price on a new line, or a line already
    ///   at `MAX_ITEM_QUANTITY`
    ///
    /// The cart is left unchanged on any error.
    pub fn add_item(&mut self, stock: &mut StockCache, item: &CatalogItem) -> CoreResult<usize> {
        validate_item_code(&item.item_code)?;

        let existing = self.position(&item.item_code);
        match existing {
            Some(index) => {
                // merge keeps the line's price, so the incoming one is not checked
                let line = &self.lines[index];
                let quantity = line.quantity + Quantity::ONE;
                validate_quantity_limit(quantity)?;
                self.check_total(Some(index), line.unit_price, quantity)?;
            }
            None => {
                validate_non_negative("price", item.price)?;
                self.check_total(None, item.price, Quantity::ONE)?;
            }
        }

        stock
            .reserve(&item.item_code, Quantity::ONE)
            .map_err(|e| match e {
                CoreError::InsufficientStock {
                    item_code,
                    available,
                    requested,
                } => CoreError::OutOfStock {
                    item_code,
                    available,
                    requested,
                },
                other => other,
            })?;

        let index = match existing {
            Some(index) => {
                self.lines[index].quantity += Quantity::ONE;
                index
            }
            None => {
                self.lines.push(CartLine::from_item(item));
                self.lines.len() - 1
            }
        };

        debug!(
            item_code = %item.item_code,
            quantity = %self.lines[index].quantity,
            "Item added to cart"
        );
        Ok(index)
    }

    /// Moves a line's quantity by a signed increment (the +/- buttons).
    ///
    /// ## Behavior
    /// - `delta > 0`: strict reservation first; rejected → unchanged
    /// - result ≤ 0: line removed, its full prior quantity released
    /// - otherwise: `|delta|` released
    pub fn update_quantity(
        &mut self,
        stock: &mut StockCache,
        index: usize,
        delta: Quantity,
    ) -> CoreResult<LineChange> {
        let old = self.line(index)?.quantity;
        self.apply_quantity(stock, index, old.saturating_add(delta))
    }

    /// Overwrites a line's quantity (manual numeric input).
    ///
    /// ## Behavior
    /// - `new_quantity ≤ 0`: line removed, old quantity released
    /// - increase: strict reservation of the difference; rejected → unchanged
    /// - decrease: difference released
    ///
    /// Strict checking applies here exactly as on the +/- path, so a typed
    /// quantity can never push the stock estimate below zero.
    pub fn set_quantity(
        &mut self,
        stock: &mut StockCache,
        index: usize,
        new_quantity: Quantity,
    ) -> CoreResult<LineChange> {
        self.line(index)?;
        self.apply_quantity(stock, index, new_quantity)
    }

    fn apply_quantity(
        &mut self,
        stock: &mut StockCache,
        index: usize,
        new_quantity: Quantity,
    ) -> CoreResult<LineChange> {
        if !new_quantity.is_positive() {
            return self.remove_line(stock, index).map(LineChange::Removed);
        }

        validate_quantity_limit(new_quantity)?;
        let line = &self.lines[index];
        self.check_total(Some(index), line.unit_price, new_quantity)?;

        let diff = new_quantity - line.quantity;

        if diff.is_positive() {
            stock.reserve(&line.item_code, diff)?;
        } else if diff.is_negative() {
            stock.release(&line.item_code, diff.abs());
        }

        let line = &mut self.lines[index];
        line.quantity = new_quantity;
        debug!(item_code = %line.item_code, quantity = %new_quantity, "Line quantity changed");

        Ok(LineChange::Updated {
            index,
            quantity: new_quantity,
        })
    }

    /// Checks that the total stays representable with line `index` (or a
    /// new line, for `None`) at `unit_price × quantity`.
    fn check_total(
        &self,
        index: Option<usize>,
        unit_price: Money,
        quantity: Quantity,
    ) -> CoreResult<()> {
        let total = unit_price.checked_multiply_quantity(quantity).and_then(|changed| {
            self.lines
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != index)
                .try_fold(changed, |acc, (_, line)| acc.checked_add(line.line_total()))
        });

        match total {
            Some(_) => Ok(()),
            None => Err(ValidationError::Overflow {
                field: "cart total".to_string(),
            }
            .into()),
        }
    }

    /// Removes a line and releases its whole quantity.
    pub fn remove_line(&mut self, stock: &mut StockCache, index: usize) -> CoreResult<CartLine> {
        self.line(index)?;
        let line = self.lines.remove(index);
        stock.release(&line.item_code, line.quantity);
        debug!(item_code = %line.item_code, released = %line.quantity, "Line removed");
        Ok(line)
    }

    /// Empties the cart WITHOUT touching stock.
    ///
    /// Only valid after a successful finalize: the sold quantities really
    /// left the shelf, so the decremented estimate is now correct.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Σ unit_price × quantity over the current lines, exact.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Returns the line at `index`.
    pub fn line(&self, index: usize) -> CoreResult<&CartLine> {
        self.lines.get(index).ok_or(CoreError::LineNotFound {
            index,
            len: self.lines.len(),
        })
    }

    /// Index of the line holding `item_code`, if any.
    pub fn position(&self, item_code: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.item_code == item_code)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> Quantity {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StockEntry;
    use rust_decimal_macros::dec;

    fn item(code: &str, price_cents: i64) -> CatalogItem {
        CatalogItem {
            item_code: code.to_string(),
            item_name: format!("Product {}", code),
            price: Money::from_cents(price_cents),
            actual_qty: None,
            image: None,
        }
    }

    fn stock(entries: &[(&str, i64)]) -> StockCache {
        let mut cache = StockCache::new();
        cache.seed(entries.iter().map(|(code, qty)| StockEntry {
            item_code: code.to_string(),
            available_quantity: Quantity::from_units(*qty),
        }));
        cache
    }

    fn independent_total(cart: &CartEngine) -> Money {
        let mut total = Money::ZERO;
        for line in cart.lines() {
            total += Money::new(line.unit_price.amount() * line.quantity.value());
        }
        total
    }

    #[test]
    fn test_add_same_item_merges() {
        let mut cache = stock(&[("SKU1", 10)]);
        let mut cart = CartEngine::new();
        let sku1 = item("SKU1", 999);

        assert_eq!(cart.add_item(&mut cache, &sku1).unwrap(), 0);
        assert_eq!(cart.add_item(&mut cache, &sku1).unwrap(), 0);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, Quantity::from_units(2));
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(8)));
        assert_eq!(cart.total(), Money::from_cents(1998));
    }

    #[test]
    fn test_fourth_add_of_three_in_stock_is_out_of_stock() {
        let mut cache = stock(&[("SKU1", 3)]);
        let mut cart = CartEngine::new();
        let sku1 = item("SKU1", 100);

        for _ in 0..3 {
            cart.add_item(&mut cache, &sku1).unwrap();
        }
        let err = cart.add_item(&mut cache, &sku1).unwrap_err();

        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert_eq!(cart.lines()[0].quantity, Quantity::from_units(3));
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::ZERO));
    }

    #[test]
    fn test_new_item_with_no_stock_is_rejected() {
        let mut cache = stock(&[("SKU1", 0)]);
        let mut cart = CartEngine::new();

        assert!(matches!(
            cart.add_item(&mut cache, &item("SKU1", 100)),
            Err(CoreError::OutOfStock { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_price_locked_at_scan_time() {
        let mut cache = stock(&[("SKU1", 10)]);
        let mut cart = CartEngine::new();

        cart.add_item(&mut cache, &item("SKU1", 1000)).unwrap();
        // Catalog re-priced while the line is open
        cart.add_item(&mut cache, &item("SKU1", 1500)).unwrap();

        assert_eq!(cart.lines()[0].unit_price, Money::from_cents(1000));
        assert_eq!(cart.total(), Money::from_cents(2000));
    }

    #[test]
    fn test_update_quantity_up_and_down() {
        let mut cache = stock(&[("SKU1", 5)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 100)).unwrap();

        cart.update_quantity(&mut cache, 0, Quantity::ONE).unwrap();
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(3)));

        let change = cart.update_quantity(&mut cache, 0, -Quantity::ONE).unwrap();
        assert_eq!(
            change,
            LineChange::Updated {
                index: 0,
                quantity: Quantity::ONE
            }
        );
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(4)));
    }

    #[test]
    fn test_update_quantity_rejects_without_stock() {
        let mut cache = stock(&[("SKU1", 1)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 100)).unwrap();

        let err = cart.update_quantity(&mut cache, 0, Quantity::ONE).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(cart.lines()[0].quantity, Quantity::ONE);
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::ZERO));
    }

    #[test]
    fn test_decrement_below_zero_removes_and_releases_prior_quantity() {
        let mut cache = StockCache::new();
        cache.seed(vec![StockEntry {
            item_code: "RICE".to_string(),
            available_quantity: Quantity::from_units(2),
        }]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("RICE", 5000)).unwrap();
        cart.set_quantity(&mut cache, 0, Quantity::new(dec!(0.5))).unwrap();
        assert_eq!(cache.lookup("RICE"), Some(Quantity::new(dec!(1.5))));

        let change = cart.update_quantity(&mut cache, 0, -Quantity::ONE).unwrap();

        assert!(matches!(change, LineChange::Removed(_)));
        assert!(cart.is_empty());
        // Only the 0.5 that was in the cart comes back, not the full delta
        assert_eq!(cache.lookup("RICE"), Some(Quantity::from_units(2)));
    }

    #[test]
    fn test_set_quantity_strict_and_atomic() {
        let mut cache = stock(&[("SKU1", 4)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 250)).unwrap();
        let before = cart.clone();

        let err = cart
            .set_quantity(&mut cache, 0, Quantity::from_units(6))
            .unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(cart, before);
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(3)));

        cart.set_quantity(&mut cache, 0, Quantity::from_units(4)).unwrap();
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::ZERO));

        cart.set_quantity(&mut cache, 0, Quantity::from_units(2)).unwrap();
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(2)));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cache = stock(&[("SKU1", 4)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 250)).unwrap();
        cart.set_quantity(&mut cache, 0, Quantity::from_units(3)).unwrap();

        let change = cart.set_quantity(&mut cache, 0, Quantity::ZERO).unwrap();

        assert!(matches!(change, LineChange::Removed(_)));
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(4)));
    }

    #[test]
    fn test_remove_then_readd_restores_state() {
        let mut cache = stock(&[("SKU1", 3)]);
        let mut cart = CartEngine::new();
        let sku1 = item("SKU1", 4200);
        cart.add_item(&mut cache, &sku1).unwrap();
        let (cart_before, stock_before) = (cart.clone(), cache.clone());

        cart.remove_line(&mut cache, 0).unwrap();
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(3)));
        cart.add_item(&mut cache, &sku1).unwrap();

        assert_eq!(cart, cart_before);
        assert_eq!(cache, stock_before);
    }

    #[test]
    fn test_bad_index_changes_nothing() {
        let mut cache = stock(&[("SKU1", 3)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 100)).unwrap();

        assert!(matches!(
            cart.remove_line(&mut cache, 5),
            Err(CoreError::LineNotFound { index: 5, len: 1 })
        ));
        assert!(cart.update_quantity(&mut cache, 1, Quantity::ONE).is_err());
        assert!(cart.set_quantity(&mut cache, 1, Quantity::ONE).is_err());
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(2)));
    }

    #[test]
    fn test_clear_keeps_stock_decremented() {
        let mut cache = stock(&[("SKU1", 3)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 100)).unwrap();

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(2)));
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut cache = StockCache::new();
        let mut cart = CartEngine::new();
        assert!(matches!(
            cart.add_item(&mut cache, &item("SKU1", -1)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_rescan_with_bad_catalog_price_still_merges() {
        let mut cache = stock(&[("SKU1", 10)]);
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("SKU1", 1000)).unwrap();

        // the locked price is used, so the bad incoming one does not matter
        assert_eq!(cart.add_item(&mut cache, &item("SKU1", -1)).unwrap(), 0);

        assert_eq!(cart.lines()[0].quantity, Quantity::from_units(2));
        assert_eq!(cart.lines()[0].unit_price, Money::from_cents(1000));
        assert_eq!(cache.lookup("SKU1"), Some(Quantity::from_units(8)));
    }

    #[test]
    fn test_untracked_line_is_capped_at_max_item_quantity() {
        // no stock entry: the strict reserve does not apply
        let mut cache = StockCache::new();
        let mut cart = CartEngine::new();
        cart.add_item(&mut cache, &item("LOOSE", 1000)).unwrap();

        let huge = Quantity::new(rust_decimal::Decimal::MAX);
        let err = cart.set_quantity(&mut cache, 0, huge).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::TooLarge { max: 999, .. })
        ));
        assert!(cart.update_quantity(&mut cache, 0, huge).is_err());
        assert_eq!(cart.lines()[0].quantity, Quantity::ONE);
        assert_eq!(cart.total(), Money::from_cents(1000));

        cart.set_quantity(&mut cache, 0, Quantity::from_units(crate::MAX_ITEM_QUANTITY))
            .unwrap();
        assert!(matches!(
            cart.add_item(&mut cache, &item("LOOSE", 1000)),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
        assert_eq!(cart.total(), Money::from_cents(999_000));
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let mut cache = StockCache::new();
        let mut cart = CartEngine::new();
        let pricey = |code: &str| CatalogItem {
            price: Money::new(rust_decimal::Decimal::MAX),
            ..item(code, 0)
        };

        cart.add_item(&mut cache, &pricey("GOLD")).unwrap();
        assert!(matches!(
            cart.add_item(&mut cache, &pricey("PLATINUM")),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
        assert!(matches!(
            cart.update_quantity(&mut cache, 0, Quantity::ONE),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total(), Money::new(rust_decimal::Decimal::MAX));
    }

    /// Drives a long, deterministic mix of operations and checks the two
    /// engine invariants after every step.
    #[test]
    fn test_total_and_stock_reconcile_over_operation_sequences() {
        let codes = ["A", "B", "C", "D"];
        let prices = [125, 4999, 1, 350];
        let initial = [4_i64, 2, 9, 0];
        let mut cache = stock(&[("A", 4), ("B", 2), ("C", 9), ("D", 0)]);
        let mut cart = CartEngine::new();

        let mut seed: u64 = 0x5eed;
        for _ in 0..2000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let pick = (seed >> 33) as usize;
            let which = pick % codes.len();

            let _ = match pick % 5 {
                0 | 1 => cart
                    .add_item(&mut cache, &item(codes[which], prices[which]))
                    .map(|_| ()),
                2 if !cart.is_empty() => {
                    let delta = if pick % 2 == 0 { Quantity::ONE } else { -Quantity::ONE };
                    cart.update_quantity(&mut cache, pick % cart.line_count(), delta)
                        .map(|_| ())
                }
                3 if !cart.is_empty() => {
                    let qty = Quantity::new(rust_decimal::Decimal::new((pick % 40) as i64, 1));
                    cart.set_quantity(&mut cache, pick % cart.line_count(), qty)
                        .map(|_| ())
                }
                4 if !cart.is_empty() => cart
                    .remove_line(&mut cache, pick % cart.line_count())
                    .map(|_| ()),
                _ => Ok(()),
            };

            assert_eq!(cart.total(), independent_total(&cart));
            for (i, code) in codes.iter().enumerate() {
                let available = cache.lookup(code).unwrap();
                let in_cart = cart
                    .position(code)
                    .map(|p| cart.lines()[p].quantity)
                    .unwrap_or(Quantity::ZERO);
                assert!(available >= Quantity::ZERO);
                assert_eq!(available + in_cart, Quantity::from_units(initial[i]));
            }
            assert!(cart.lines().iter().all(|l| l.quantity.is_positive()));
        }
    }
}
