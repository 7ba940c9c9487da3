//! # Stock Cache
//!
//! The client's optimistic view of sellable quantity per item.
//!
//! ## Lifecycle
//! ```text
//! get_products ──► seed() ──┬──► reserve()  (scan, +1, qty edit up)
//!                           ├──► release()  (remove, -1, qty edit down, void)
//!                           └──► lookup()   (stock badge)
//!      stock sync ──► seed() again: server numbers win over local edits
//! ```
//!
//! The cache is advisory. The backend performs the real stock check when the
//! invoice is created; this only keeps the badge honest between round trips.
//!
//! ## Untracked Items
//! Items the catalog snapshot did not include (e.g. found by barcode outside
//! the first page of products) have no entry. They are not stock-constrained
//! here and reserve/release leave the cache untouched.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::money::Quantity;
use crate::types::{StockEntry, StockLevel};
use crate::validation::validate_delta;

/// Available quantity per item code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockCache {
    entries: HashMap<String, Quantity>,
}

impl StockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole cache with a catalog snapshot.
    ///
    /// Any optimistic adjustment made since the last seed is discarded.
    pub fn seed<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = StockEntry>,
    {
        self.entries = entries
            .into_iter()
            .map(|e| (e.item_code, e.available_quantity))
            .collect();
        debug!(items = self.entries.len(), "Stock cache seeded");
    }

    /// Returns the available quantity, or `None` for an untracked item.
    pub fn lookup(&self, item_code: &str) -> Option<Quantity> {
        self.entries.get(item_code).copied()
    }

    /// Returns whether `delta` more units could be reserved right now.
    pub fn can_reserve(&self, item_code: &str, delta: Quantity) -> bool {
        match self.lookup(item_code) {
            Some(available) => available - delta >= Quantity::ZERO,
            None => true,
        }
    }

    /// Takes `delta` units out of the available estimate.
    ///
    /// ## Errors
    /// - `InsufficientStock` if the estimate would drop below zero; the
    ///   cache is left unchanged
    /// - `Validation` if `delta` is not positive
    pub fn reserve(&mut self, item_code: &str, delta: Quantity) -> CoreResult<()> {
        validate_delta(delta)?;

        let Some(available) = self.entries.get_mut(item_code) else {
            debug!(item_code, %delta, "Untracked item, reservation skipped");
            return Ok(());
        };

        if *available - delta < Quantity::ZERO {
            return Err(CoreError::InsufficientStock {
                item_code: item_code.to_string(),
                available: *available,
                requested: delta,
            });
        }

        *available -= delta;
        debug!(item_code, %delta, remaining = %available, "Stock reserved");
        Ok(())
    }

    /// Puts `delta` units back. Never stock-constrained.
    ///
    /// Non-positive deltas release nothing.
    pub fn release(&mut self, item_code: &str, delta: Quantity) {
        if !delta.is_positive() {
            return;
        }

        if let Some(available) = self.entries.get_mut(item_code) {
            *available = available.saturating_add(delta);
            debug!(item_code, %delta, remaining = %available, "Stock released");
        }
    }

    /// Badge band for an item; `None` for untracked items.
    pub fn level(&self, item_code: &str, low_threshold: Quantity) -> Option<StockLevel> {
        self.lookup(item_code)
            .map(|available| StockLevel::classify(available, low_threshold))
    }

    /// Current entries, for display.
    pub fn entries(&self) -> impl Iterator<Item = StockEntry> + '_ {
        self.entries.iter().map(|(code, qty)| StockEntry {
            item_code: code.clone(),
            available_quantity: *qty,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
