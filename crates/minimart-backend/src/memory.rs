//! # In-Memory Backend
//!
//! A `PosBackend` that keeps a small ERP in memory: one POS profile, a
//! product list with stock, submitted invoices and the open shift. It
//! applies the same rules the ERP does where the till can observe them:
//!
//! - invoices need an open shift and a payment method on the profile
//! - a sale takes stock off the products, a void puts it back
//! - closing a shift with no invoices is rejected
//!
//! Failures can be queued per method to exercise error paths.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use minimart_core::{
    CartLine, CatalogItem, InvoiceRequest, Money, Quantity, RecentInvoice, ReleasedLine,
    ShiftProfile, ShiftStatus,
};

use crate::backend::{methods, PosBackend};
use crate::error::{BackendError, BackendResult};

/// Status code used for business-rule rejections.
const EXPECTATION_FAILED: u16 = 417;

/// Recent-invoice page size, as the ERP returns it.
const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
struct StoredInvoice {
    name: String,
    opening_entry: String,
    lines: Vec<CartLine>,
    grand_total: Money,
    customer: String,
    voided: bool,
}

#[derive(Debug, Default)]
struct State {
    profile: Option<ShiftProfile>,
    opening_entry: Option<String>,
    products: Vec<CatalogItem>,
    barcodes: HashMap<String, String>,
    invoices: Vec<StoredInvoice>,
    openings: u32,
    closings: u32,
    failures: HashMap<String, VecDeque<BackendError>>,
    calls: Vec<String>,
}

impl State {
    /// Records the call and pops a queued failure, if any.
    fn enter(&mut self, method: &str) -> BackendResult<()> {
        self.calls.push(method.to_string());
        match self.failures.get_mut(method).and_then(VecDeque::pop_front) {
            Some(err) => {
                debug!(method, error = %err, "Injected backend failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn profile(&self, method: &str) -> BackendResult<&ShiftProfile> {
        self.profile.as_ref().ok_or_else(|| {
            BackendError::rejected(method, EXPECTATION_FAILED, "No POS Profile assigned to user.")
        })
    }

    fn adjust_stock(&mut self, item_code: &str, delta: Quantity) {
        if let Some(qty) = self
            .products
            .iter_mut()
            .find(|p| p.item_code == item_code)
            .and_then(|p| p.actual_qty.as_mut())
        {
            *qty += delta;
        }
    }
}

/// In-memory ERP for tests and offline demos.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// A backend whose user is assigned `profile`.
    pub fn new(profile: ShiftProfile) -> Self {
        MemoryBackend {
            state: Mutex::new(State {
                profile: Some(profile),
                ..State::default()
            }),
        }
    }

    /// A backend whose user has no POS profile.
    pub fn unassigned() -> Self {
        Self::default()
    }

    pub fn with_products(mut self, products: Vec<CatalogItem>) -> Self {
        self.state.get_mut().products = products;
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>, item_code: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .barcodes
            .insert(barcode.into(), item_code.into());
        self
    }

    /// Starts with a shift already open, as after a terminal restart.
    pub fn with_open_shift(mut self, opening_entry: impl Into<String>) -> Self {
        self.state.get_mut().opening_entry = Some(opening_entry.into());
        self
    }

    /// Queues a failure for the next call of `method`.
    pub async fn fail_next(&self, method: &str, error: BackendError) {
        self.state
            .lock()
            .await
            .failures
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Method names called so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// How many times `method` was called.
    pub async fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    /// Server-side stock of an item.
    pub async fn stock_of(&self, item_code: &str) -> Option<Quantity> {
        self.state
            .lock()
            .await
            .products
            .iter()
            .find(|p| p.item_code == item_code)
            .and_then(|p| p.actual_qty)
    }

    /// Sets server-side stock, as another terminal or a stock entry would.
    pub async fn set_stock(&self, item_code: &str, quantity: Quantity) {
        let mut state = self.state.lock().await;
        if let Some(product) = state.products.iter_mut().find(|p| p.item_code == item_code) {
            product.actual_qty = Some(quantity);
        }
    }

    /// Submitted, non-voided invoices.
    pub async fn invoice_count(&self) -> usize {
        self.state
            .lock()
            .await
            .invoices
            .iter()
            .filter(|i| !i.voided)
            .count()
    }

    pub async fn opening_entry(&self) -> Option<String> {
        self.state.lock().await.opening_entry.clone()
    }
}

#[async_trait]
impl PosBackend for MemoryBackend {
    async fn check_pos_opening(&self) -> BackendResult<ShiftStatus> {
        let mut state = self.state.lock().await;
        state.enter(methods::CHECK_POS_OPENING)?;

        let profile = state.profile(methods::CHECK_POS_OPENING)?.clone();
        Ok(ShiftStatus {
            opening_entry: state.opening_entry.clone(),
            profile,
        })
    }

    async fn create_opening_entry(&self, pos_profile: &str, amount: Money) -> BackendResult<String> {
        let mut state = self.state.lock().await;
        state.enter(methods::CREATE_OPENING_ENTRY)?;

        let profile = state.profile(methods::CREATE_OPENING_ENTRY)?;
        if profile.pos_profile != pos_profile {
            return Err(BackendError::rejected(
                methods::CREATE_OPENING_ENTRY,
                404,
                format!("POS Profile {} not found", pos_profile),
            ));
        }
        if amount.is_negative() {
            return Err(BackendError::rejected(
                methods::CREATE_OPENING_ENTRY,
                EXPECTATION_FAILED,
                "Opening amount cannot be negative",
            ));
        }
        if let Some(existing) = &state.opening_entry {
            return Err(BackendError::rejected(
                methods::CREATE_OPENING_ENTRY,
                EXPECTATION_FAILED,
                format!("POS Opening Entry {} is already open", existing),
            ));
        }

        state.openings += 1;
        let name = format!("POS-OPE-{:05}", state.openings);
        state.opening_entry = Some(name.clone());
        Ok(name)
    }

    async fn get_products(&self) -> BackendResult<Vec<CatalogItem>> {
        let mut state = self.state.lock().await;
        state.enter(methods::GET_PRODUCTS)?;
        state.profile(methods::GET_PRODUCTS)?;
        Ok(state.products.clone())
    }

    async fn get_item_by_barcode(&self, barcode: &str) -> BackendResult<Option<CatalogItem>> {
        let mut state = self.state.lock().await;
        state.enter(methods::GET_ITEM_BY_BARCODE)?;

        let item_code = state
            .barcodes
            .get(barcode)
            .cloned()
            .unwrap_or_else(|| barcode.to_string());

        // barcode lookups carry no stock figure
        Ok(state
            .products
            .iter()
            .find(|p| p.item_code == item_code)
            .map(|p| CatalogItem {
                actual_qty: None,
                ..p.clone()
            }))
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> BackendResult<String> {
        let mut state = self.state.lock().await;
        state.enter(methods::CREATE_INVOICE)?;

        let profile = state.profile(methods::CREATE_INVOICE)?.clone();
        let opening_entry = state.opening_entry.clone().ok_or_else(|| {
            BackendError::rejected(
                methods::CREATE_INVOICE,
                EXPECTATION_FAILED,
                "Please open a POS shift first.",
            )
        })?;
        if !profile.allowed_payment_methods().contains(&request.mode_of_payment) {
            return Err(BackendError::rejected(
                methods::CREATE_INVOICE,
                EXPECTATION_FAILED,
                format!("Account not found for {}", request.mode_of_payment),
            ));
        }

        for line in &request.lines {
            state.adjust_stock(&line.item_code, -line.quantity);
        }

        let name = format!("ACC-PSINV-{:05}", state.invoices.len() + 1);
        let grand_total = request.lines.iter().map(CartLine::line_total).sum::<Money>();
        state.invoices.push(StoredInvoice {
            name: name.clone(),
            opening_entry,
            lines: request.lines.clone(),
            grand_total: grand_total.round_currency(),
            customer: request.customer.clone(),
            voided: false,
        });
        Ok(name)
    }

    async fn get_recent_invoices(&self, opening_entry: &str) -> BackendResult<Vec<RecentInvoice>> {
        let mut state = self.state.lock().await;
        state.enter(methods::GET_RECENT_INVOICES)?;

        Ok(state
            .invoices
            .iter()
            .rev()
            .filter(|i| i.opening_entry == opening_entry && !i.voided)
            .take(RECENT_LIMIT)
            .map(|i| RecentInvoice {
                name: i.name.clone(),
                grand_total: i.grand_total,
                customer: i.customer.clone(),
                creation: None,
            })
            .collect())
    }

    async fn void_invoice(&self, invoice_name: &str) -> BackendResult<Vec<ReleasedLine>> {
        let mut state = self.state.lock().await;
        state.enter(methods::VOID_INVOICE)?;

        let invoice = state
            .invoices
            .iter_mut()
            .find(|i| i.name == invoice_name)
            .ok_or_else(|| {
                BackendError::rejected(
                    methods::VOID_INVOICE,
                    404,
                    format!("POS Invoice {} not found", invoice_name),
                )
            })?;
        if invoice.voided {
            return Err(BackendError::rejected(
                methods::VOID_INVOICE,
                EXPECTATION_FAILED,
                format!("POS Invoice {} is already cancelled", invoice_name),
            ));
        }
        invoice.voided = true;

        let released: Vec<ReleasedLine> = invoice
            .lines
            .iter()
            .map(|l| ReleasedLine {
                item_code: l.item_code.clone(),
                qty: l.quantity,
            })
            .collect();
        for line in &released {
            state.adjust_stock(&line.item_code, line.qty);
        }
        Ok(released)
    }

    async fn close_pos_shift(&self, opening_entry: &str) -> BackendResult<Option<String>> {
        let mut state = self.state.lock().await;
        state.enter(methods::CLOSE_POS_SHIFT)?;

        if state.opening_entry.as_deref() != Some(opening_entry) {
            return Err(BackendError::rejected(
                methods::CLOSE_POS_SHIFT,
                EXPECTATION_FAILED,
                format!("POS Opening Entry {} is not open", opening_entry),
            ));
        }
        if !state
            .invoices
            .iter()
            .any(|i| i.opening_entry == opening_entry && !i.voided)
        {
            return Err(BackendError::rejected(
                methods::CLOSE_POS_SHIFT,
                EXPECTATION_FAILED,
                "No submitted invoices found for this shift.",
            ));
        }

        state.opening_entry = None;
        state.closings += 1;
        Ok(Some(format!("POS-CLO-{:05}", state.closings)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ShiftProfile {
        ShiftProfile {
            pos_profile: "Main Counter".to_string(),
            company: "MiniMart".to_string(),
            customer_default: None,
            payment_methods: vec!["Cash".to_string()],
        }
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new(profile())
            .with_products(vec![CatalogItem {
                item_code: "SKU1".to_string(),
                item_name: "Product".to_string(),
                price: Money::from_cents(5000),
                actual_qty: Some(Quantity::from_units(3)),
                image: None,
            }])
            .with_barcode("4800016644290", "SKU1")
    }

    fn request(qty: i64, method: &str) -> InvoiceRequest {
        InvoiceRequest {
            lines: vec![CartLine {
                item_code: "SKU1".to_string(),
                item_name: "Product".to_string(),
                unit_price: Money::from_cents(5000),
                quantity: Quantity::from_units(qty),
            }],
            customer: "Guest".to_string(),
            mode_of_payment: method.to_string(),
            amount_paid: Money::from_cents(5000 * qty),
        }
    }

    #[tokio::test]
    async fn test_invoice_requires_open_shift() {
        let backend = backend();
        let err = backend.create_invoice(&request(1, "Cash")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please open a POS shift first.");
    }

    #[tokio::test]
    async fn test_sale_and_void_move_server_stock() {
        let backend = backend();
        let entry = backend
            .create_opening_entry("Main Counter", Money::ZERO)
            .await
            .unwrap();

        let invoice = backend.create_invoice(&request(2, "Cash")).await.unwrap();
        assert_eq!(backend.stock_of("SKU1").await, Some(Quantity::from_units(1)));

        let recent = backend.get_recent_invoices(&entry).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].grand_total, Money::from_cents(10000));

        let released = backend.void_invoice(&invoice).await.unwrap();
        assert_eq!(released[0].qty, Quantity::from_units(2));
        assert_eq!(backend.stock_of("SKU1").await, Some(Quantity::from_units(3)));
        assert!(backend.void_invoice(&invoice).await.is_err());
    }

    #[tokio::test]
    async fn test_close_requires_an_invoice() {
        let backend = backend().with_open_shift("POS-OPE-00042");

        let err = backend.close_pos_shift("POS-OPE-00042").await.unwrap_err();
        assert_eq!(err.to_string(), "No submitted invoices found for this shift.");

        backend.create_invoice(&request(1, "Cash")).await.unwrap();
        let closing = backend.close_pos_shift("POS-OPE-00042").await.unwrap();
        assert_eq!(closing.as_deref(), Some("POS-CLO-00001"));
        assert_eq!(backend.opening_entry().await, None);
    }

    #[tokio::test]
    async fn test_unknown_payment_method_is_rejected() {
        let backend = backend().with_open_shift("POS-OPE-00001");
        let err = backend.create_invoice(&request(1, "GCash")).await.unwrap_err();
        assert_eq!(err.to_string(), "Account not found for GCash");
        assert_eq!(backend.invoice_count().await, 0);
    }

    #[tokio::test]
    async fn test_barcode_lookup_has_no_stock() {
        let backend = backend();
        let item = backend
            .get_item_by_barcode("4800016644290")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.item_code, "SKU1");
        assert_eq!(item.actual_qty, None);

        assert!(backend.get_item_by_barcode("0000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let backend = backend();
        backend
            .fail_next(
                methods::GET_PRODUCTS,
                BackendError::Timeout {
                    method: methods::GET_PRODUCTS.to_string(),
                    seconds: 30,
                },
            )
            .await;

        assert!(backend.get_products().await.is_err());
        assert_eq!(backend.get_products().await.unwrap().len(), 1);
        assert_eq!(backend.call_count(methods::GET_PRODUCTS).await, 2);
    }

    #[tokio::test]
    async fn test_unassigned_user() {
        let backend = MemoryBackend::unassigned();
        let err = backend.check_pos_opening().await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
    }
}
