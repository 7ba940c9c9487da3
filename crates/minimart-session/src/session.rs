//! # POS Session
//!
//! One cashier session from start-up to shift close.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PosSession Lifecycle                            │
//! │                                                                         │
//! │  start() ── check_pos_opening ──┬── open entry? ──► resume ──► catalog │
//! │                                 └── none ──► wait for open_shift()      │
//! │                                                                         │
//! │  open_shift(amount) ── create_opening_entry ──► Open ──► catalog       │
//! │                                                                         │
//! │  scan / add / +/- / qty / remove      (sync, Till only)                 │
//! │                                                                         │
//! │  finalize(tendered) ── create_invoice ──► cart cleared ──► recent list  │
//! │  void(invoice)      ── void_invoice   ──► stock released ──► recent list│
//! │                                                                         │
//! │  close_shift() ── close_pos_shift ──► Ended (session is done)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single Flight
//! Every operation that awaits the backend takes `&mut self`, so while a
//! finalize or close is in flight nothing else can touch the cart. Stock
//! sync is the exception: [`PosSession::stock_sync`] returns a [`StockSync`]
//! that owns only the backend handle and can be awaited elsewhere, and its
//! result is applied later with [`PosSession::apply_stock_sync`].
//!
//! ## Local State on Failure
//! A failed or rejected request never changes the till. The recent-invoice
//! refresh that follows a confirmed finalize or void is best-effort: its
//! failure is logged and the confirmed operation stands.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use minimart_backend::PosBackend;
use minimart_core::validation::{parse_quantity, validate_barcode, validate_invoice_name};
use minimart_core::{
    CatalogItem, ClosedShift, CoreError, FinalizedSale, LineChange, Money, Quantity, Receipt,
    RecentInvoice, Shift, ShiftStatus, StockLevel, Till,
};

use crate::config::TillSettings;
use crate::error::{SessionError, SessionResult};

// =============================================================================
// Stock Sync
// =============================================================================

/// A detached catalog fetch for refreshing the stock estimate.
///
/// ```text
/// let sync = session.stock_sync();     // borrows session briefly
/// let items = sync.fetch().await?;     // session free for scanning
/// session.apply_stock_sync(items);     // server numbers win
/// ```
pub struct StockSync {
    backend: Arc<dyn PosBackend>,
}

impl StockSync {
    pub async fn fetch(self) -> SessionResult<Vec<CatalogItem>> {
        let items = self.backend.get_products().await?;
        debug!(items = items.len(), "Stock sync fetched");
        Ok(items)
    }
}

// =============================================================================
// Session
// =============================================================================

/// A cashier session: the till plus its backend.
pub struct PosSession {
    id: Uuid,
    backend: Arc<dyn PosBackend>,
    settings: TillSettings,
    till: Till,
    status: Option<ShiftStatus>,
}

impl PosSession {
    pub fn new(backend: Arc<dyn PosBackend>, settings: TillSettings) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "Session created");
        PosSession {
            id,
            backend,
            till: Till::new(settings.recent_limit),
            settings,
            status: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &TillSettings {
        &self.settings
    }

    /// The in-memory till, for display.
    pub fn till(&self) -> &Till {
        &self.till
    }

    /// The last shift status fetched from the backend.
    pub fn status(&self) -> Option<&ShiftStatus> {
        self.status.as_ref()
    }

    pub fn shift(&self) -> Option<&Shift> {
        self.till.shift()
    }

    // =========================================================================
    // Shift
    // =========================================================================

    /// Start-up: asks the backend for the current shift and resumes it if
    /// one is open.
    ///
    /// ## Returns
    /// The resumed shift, or `None` if the cashier must open one.
    pub async fn start(&mut self) -> SessionResult<Option<&Shift>> {
        info!(session = %self.id, "Session starting");
        self.resume().await
    }

    /// Queries the backend for the cashier's profile and open shift.
    pub async fn check_status(&mut self) -> SessionResult<&ShiftStatus> {
        let status = self.backend.check_pos_opening().await?;
        debug!(
            session = %self.id,
            opening_entry = ?status.opening_entry,
            pos_profile = %status.profile.pos_profile,
            "Shift status"
        );
        Ok(self.status.insert(status))
    }

    /// Adopts a shift that is already open at the backend.
    pub async fn resume(&mut self) -> SessionResult<Option<&Shift>> {
        self.till.check_can_open(Money::ZERO)?;
        let status = self.check_status().await?.clone();

        if self.till.resume(&status)?.is_none() {
            info!(session = %self.id, "No open shift");
            return Ok(None);
        }

        info!(session = %self.id, opening_entry = ?status.opening_entry, "Shift resumed");
        self.after_open().await;
        Ok(self.till.shift())
    }

    /// Opens a shift with `opening_amount` in the drawer.
    ///
    /// ## Errors
    /// - `ShiftAlreadyOpen` / `SessionEnded` / `Validation` from local checks
    /// - `ShiftCreation` if the backend did not create the entry; the shift
    ///   might exist anyway, so call [`Self::check_status`] or
    ///   [`Self::resume`] before retrying
    pub async fn open_shift(&mut self, opening_amount: Money) -> SessionResult<&Shift> {
        self.till.check_can_open(opening_amount)?;

        let profile = match self.status.as_ref().map(|s| s.profile.clone()) {
            Some(profile) => profile,
            None => self.check_status().await?.profile.clone(),
        };

        let session = self.id;
        let opening_entry = self
            .backend
            .create_opening_entry(&profile.pos_profile, opening_amount)
            .await
            .map_err(|e| {
                warn!(session = %session, error = %e, "Opening entry not created");
                SessionError::ShiftCreation(e)
            })?;

        if let Some(status) = self.status.as_mut() {
            status.opening_entry = Some(opening_entry.clone());
        }
        self.till.mark_open(Shift {
            opening_entry_id: Some(opening_entry),
            opening_amount,
            profile,
        })?;

        self.after_open().await;
        self.till.shift().ok_or(SessionError::Core(CoreError::ShiftNotOpen))
    }

    /// Loads catalog and history once a shift is open. Failures here do not
    /// undo the opening.
    async fn after_open(&mut self) {
        if let Err(e) = self.load_catalog().await {
            warn!(session = %self.id, error = %e, "Catalog load failed after opening");
        }
        self.refresh_recent_best_effort().await;
    }

    /// Closes the shift at the backend. The session is finished afterwards;
    /// whatever is in the cart is abandoned.
    pub async fn close_shift(&mut self) -> SessionResult<ClosedShift> {
        let opening_entry = self
            .till
            .check_can_close()?
            .opening_entry_id
            .clone()
            .ok_or(CoreError::ShiftNotOpen)?;

        let closing_entry = self.backend.close_pos_shift(&opening_entry).await?;
        let closed = self.till.mark_closed(closing_entry)?;

        info!(
            session = %self.id,
            opening_entry = %opening_entry,
            abandoned_lines = closed.abandoned_lines,
            "Session ended"
        );
        Ok(closed)
    }

    // =========================================================================
    // Catalog & Stock
    // =========================================================================

    /// Fetches the catalog and reseeds the stock estimate.
    pub async fn load_catalog(&mut self) -> SessionResult<usize> {
        let items = self.backend.get_products().await?;
        let count = items.len();
        self.till.seed_catalog(items);
        info!(session = %self.id, items = count, "Catalog loaded");
        Ok(count)
    }

    /// Starts a stock refresh that does not hold the session.
    pub fn stock_sync(&self) -> StockSync {
        StockSync {
            backend: Arc::clone(&self.backend),
        }
    }

    /// Applies a fetched stock snapshot. Local reservations since the last
    /// seed are overwritten by the server's numbers.
    pub fn apply_stock_sync(&mut self, items: Vec<CatalogItem>) {
        let entries: Vec<_> = items.iter().filter_map(CatalogItem::stock_entry).collect();
        info!(session = %self.id, items = entries.len(), "Stock synced");
        self.till.apply_stock_sync(entries);
    }

    /// Fetch and apply in one go.
    pub async fn sync_stock(&mut self) -> SessionResult<()> {
        let items = self.stock_sync().fetch().await?;
        self.apply_stock_sync(items);
        Ok(())
    }

    pub fn stock_level(&self, item_code: &str) -> Option<StockLevel> {
        self.till
            .stock_level(item_code, self.settings.low_stock_threshold())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Looks a barcode up at the backend and adds one unit.
    ///
    /// ## Returns
    /// The index of the affected cart line.
    pub async fn scan(&mut self, barcode: &str) -> SessionResult<usize> {
        self.till.require_open()?;
        let barcode = validate_barcode(barcode).map_err(CoreError::from)?;

        let item = self
            .backend
            .get_item_by_barcode(&barcode)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(barcode.clone()))?;

        let index = self.till.add_item(&item)?;
        debug!(session = %self.id, barcode = %barcode, item_code = %item.item_code, "Scanned");
        Ok(index)
    }

    /// Adds one unit of a catalog item (product grid click).
    pub fn add_item(&mut self, item_code: &str) -> SessionResult<usize> {
        Ok(self.till.add_by_code(item_code)?)
    }

    pub fn update_quantity(&mut self, index: usize, delta: Quantity) -> SessionResult<LineChange> {
        Ok(self.till.update_quantity(index, delta)?)
    }

    pub fn set_quantity(&mut self, index: usize, quantity: Quantity) -> SessionResult<LineChange> {
        Ok(self.till.set_quantity(index, quantity)?)
    }

    /// Sets a quantity from typed text. Unparseable text is rejected and
    /// the line is left alone.
    pub fn set_quantity_text(&mut self, index: usize, input: &str) -> SessionResult<LineChange> {
        let quantity = parse_quantity(input).map_err(CoreError::from)?;
        self.set_quantity(index, quantity)
    }

    pub fn remove_line(&mut self, index: usize) -> SessionResult<()> {
        Ok(self.till.remove_line(index)?)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Takes payment and creates the invoice.
    ///
    /// ## Flow
    /// 1. Local checks (shift, empty cart, tender, payment method)
    /// 2. `create_invoice` at the backend
    /// 3. Cart cleared, sale recorded, recent list refreshed
    ///
    /// A rejection at step 2 leaves the cart exactly as it was.
    pub async fn finalize(
        &mut self,
        tendered: Money,
        payment_method: Option<&str>,
        customer: Option<&str>,
    ) -> SessionResult<FinalizedSale> {
        let draft = self
            .till
            .prepare_checkout(tendered, payment_method, customer)?;

        let invoice_id = match self.backend.create_invoice(&draft.request).await {
            Ok(id) => id,
            Err(e) => {
                warn!(session = %self.id, error = %e, total = %draft.total, "Invoice not created");
                return Err(e.into());
            }
        };

        let sale = self
            .till
            .complete_checkout(draft, invoice_id, Utc::now())?
            .clone();

        self.refresh_recent_best_effort().await;
        Ok(sale)
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Voids an invoice and puts its quantities back into the estimate.
    ///
    /// ## Returns
    /// The total quantity released.
    pub async fn void(&mut self, invoice_name: &str) -> SessionResult<Quantity> {
        self.till.require_open()?;
        validate_invoice_name(invoice_name).map_err(CoreError::from)?;
        let invoice_name = invoice_name.trim();

        let released = self.backend.void_invoice(invoice_name).await?;
        let total = self.till.apply_void(invoice_name, &released);
        info!(session = %self.id, invoice = %invoice_name, released = %total, "Invoice voided");

        self.refresh_recent_best_effort().await;
        Ok(total)
    }

    /// Refetches the shift's recent invoices.
    pub async fn refresh_recent(&mut self) -> SessionResult<&[RecentInvoice]> {
        let opening_entry = self
            .till
            .opening_entry()
            .ok_or(CoreError::ShiftNotOpen)?
            .to_string();

        let invoices = self.backend.get_recent_invoices(&opening_entry).await?;
        self.till.replace_recent(invoices);
        Ok(self.till.recent_invoices())
    }

    async fn refresh_recent_best_effort(&mut self) {
        if let Err(e) = self.refresh_recent().await {
            warn!(session = %self.id, error = %e, "Recent invoices not refreshed");
        }
    }

    pub fn recent_invoices(&self) -> &[RecentInvoice] {
        self.till.recent_invoices()
    }

    pub fn last_sale(&self) -> Option<&FinalizedSale> {
        self.till.last_sale()
    }

    /// Receipt data of the last sale, for reprint.
    pub fn receipt(&self) -> Option<Receipt> {
        self.till.receipt()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
