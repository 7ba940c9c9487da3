//! # PosBackend
//!
//! The eight requests the till makes to the ERP.
//!
//! ```text
//! ┌─────────────────────────┬──────────────────────────┬──────────────────────┐
//! │ Method                  │ Args                     │ Returns              │
//! ├─────────────────────────┼──────────────────────────┼──────────────────────┤
//! │ check_pos_opening       │ -                        │ ShiftStatus          │
//! │ create_opening_entry    │ pos_profile, amount      │ opening entry id     │
//! │ get_products            │ -                        │ Vec<CatalogItem>     │
//! │ get_item_by_barcode     │ barcode                  │ Option<CatalogItem>  │
//! │ create_invoice          │ InvoiceRequest           │ invoice id           │
//! │ get_recent_invoices     │ opening_entry            │ Vec<RecentInvoice>   │
//! │ void_invoice            │ invoice_name             │ Vec<ReleasedLine>    │
//! │ close_pos_shift         │ opening_entry            │ closing entry id     │
//! └─────────────────────────┴──────────────────────────┴──────────────────────┘
//! ```

use async_trait::async_trait;

use minimart_core::{
    CatalogItem, InvoiceRequest, Money, RecentInvoice, ReleasedLine, ShiftStatus,
};

use crate::error::BackendResult;

/// Method names, as the ERP exposes them.
pub mod methods {
    pub const CHECK_POS_OPENING: &str = "check_pos_opening";
    pub const CREATE_OPENING_ENTRY: &str = "create_opening_entry";
    pub const GET_PRODUCTS: &str = "get_products";
    pub const GET_ITEM_BY_BARCODE: &str = "get_item_by_barcode";
    pub const CREATE_INVOICE: &str = "create_invoice";
    pub const GET_RECENT_INVOICES: &str = "get_recent_invoices";
    pub const VOID_INVOICE: &str = "void_invoice";
    pub const CLOSE_POS_SHIFT: &str = "close_pos_shift";
}

/// Request/response access to the ERP.
///
/// Implementations must not retry on their own: a failed `create_invoice`
/// may or may not have reached the ledger, and only the cashier can decide
/// what happens next.
#[async_trait]
pub trait PosBackend: Send + Sync {
    /// Current user's POS profile and open opening entry, if any.
    async fn check_pos_opening(&self) -> BackendResult<ShiftStatus>;

    /// Opens a shift with `amount` in the drawer. Returns the opening entry id.
    async fn create_opening_entry(&self, pos_profile: &str, amount: Money) -> BackendResult<String>;

    /// Catalog snapshot for the product grid, with stock on hand.
    async fn get_products(&self) -> BackendResult<Vec<CatalogItem>>;

    /// Looks an item up by barcode or item code.
    async fn get_item_by_barcode(&self, barcode: &str) -> BackendResult<Option<CatalogItem>>;

    /// Creates and submits the invoice. Returns the invoice id.
    async fn create_invoice(&self, request: &InvoiceRequest) -> BackendResult<String>;

    /// Most recent invoices of a shift, newest first.
    async fn get_recent_invoices(&self, opening_entry: &str) -> BackendResult<Vec<RecentInvoice>>;

    /// Cancels an invoice. Returns the lines put back on the shelf.
    async fn void_invoice(&self, invoice_name: &str) -> BackendResult<Vec<ReleasedLine>>;

    /// Closes and reconciles the shift. Returns the closing entry id when
    /// the ERP reports one.
    async fn close_pos_shift(&self, opening_entry: &str) -> BackendResult<Option<String>>;
}
