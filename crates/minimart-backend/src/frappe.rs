//! # Frappe Client
//!
//! `PosBackend` over the ERP's whitelisted HTTP methods.
//!
//! ## Request Shape
//! ```text
//! POST {base_url}/api/method/minimart_pos.api.{method}
//! Authorization: token {api_key}:{api_secret}     (when configured)
//! Content-Type: application/json
//!
//! {"pos_profile": "Main Counter", "amount": 1000.0}
//! ```
//!
//! ## Response Handling
//! ```text
//! send ──┬── timeout ─────────────► BackendError::Timeout
//!        ├── connect/TLS failure ─► BackendError::Transport
//!        └── response
//!              ├── non-2xx ───────► BackendError::Rejected (ERP message)
//!              └── 2xx ──► {"message": ...}
//!                           ├── shape mismatch ► BackendError::Decode
//!                           └── Option<T>
//! ```

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use url::Url;

use minimart_core::{
    CatalogItem, InvoiceRequest, Money, RecentInvoice, ReleasedLine, ShiftStatus,
};

use crate::backend::{methods, PosBackend};
use crate::config::BackendSettings;
use crate::error::{BackendError, BackendResult};
use crate::wire::{
    cart_payload, decode_message, error_message, InvoiceArgs, OpeningArgs, PosOpeningRecord,
    ProductRecord, RecentInvoiceRecord, ReleasedLineRecord,
};

/// Server-side module of the whitelisted methods.
pub const METHOD_PREFIX: &str = "minimart_pos.api";

/// HTTP client for a Frappe/ERPNext site running the MiniMart POS app.
#[derive(Debug, Clone)]
pub struct FrappeClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<String>,
    timeout_secs: u64,
}

impl FrappeClient {
    /// Builds a client from validated settings.
    ///
    /// ## Errors
    /// `InvalidConfig` if the settings do not validate or the HTTP client
    /// cannot be built.
    pub fn new(settings: &BackendSettings) -> BackendResult<Self> {
        settings.validate()?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| BackendError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(FrappeClient {
            http,
            base_url: settings.parsed_base_url()?,
            auth: settings.auth_header(),
            timeout_secs: settings.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn method_url(&self, method: &str) -> BackendResult<Url> {
        self.base_url
            .join(&format!("api/method/{}.{}", METHOD_PREFIX, method))
            .map_err(|e| BackendError::InvalidConfig(format!("method URL for {}: {}", method, e)))
    }

    /// Calls a whitelisted method and unwraps its `message`.
    async fn call<A, T>(&self, method: &str, args: &A) -> BackendResult<Option<T>>
    where
        A: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.method_url(method)?;
        debug!(method, %url, "Backend request");

        let mut request = self.http.post(url).json(args);
        if let Some(auth) = &self.auth {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            warn!(method, status = status.as_u16(), %message, "Backend rejected request");
            return Err(BackendError::rejected(method, status.as_u16(), message));
        }

        decode_message(method, &body)
    }

    /// Like `call`, but a missing `message` is a protocol error.
    async fn call_required<A, T>(&self, method: &str, args: &A) -> BackendResult<T>
    where
        A: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.call(method, args)
            .await?
            .ok_or_else(|| BackendError::decode(method, "response has no message"))
    }

    fn transport_error(&self, method: &str, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            error!(method, seconds = self.timeout_secs, "Backend request timed out");
            BackendError::Timeout {
                method: method.to_string(),
                seconds: self.timeout_secs,
            }
        } else {
            error!(method, error = %err, "Backend request failed");
            BackendError::Transport {
                method: method.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PosBackend for FrappeClient {
    async fn check_pos_opening(&self) -> BackendResult<ShiftStatus> {
        let record: PosOpeningRecord = self
            .call_required(methods::CHECK_POS_OPENING, &json!({}))
            .await?;
        Ok(record.into())
    }

    async fn create_opening_entry(&self, pos_profile: &str, amount: Money) -> BackendResult<String> {
        let args = OpeningArgs {
            pos_profile,
            amount: amount.amount(),
        };
        self.call_required(methods::CREATE_OPENING_ENTRY, &args).await
    }

    async fn get_products(&self) -> BackendResult<Vec<CatalogItem>> {
        let records: Option<Vec<ProductRecord>> =
            self.call(methods::GET_PRODUCTS, &json!({})).await?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(CatalogItem::from)
            .collect())
    }

    async fn get_item_by_barcode(&self, barcode: &str) -> BackendResult<Option<CatalogItem>> {
        let record: Option<ProductRecord> = self
            .call(methods::GET_ITEM_BY_BARCODE, &json!({ "barcode": barcode }))
            .await?;
        Ok(record.map(CatalogItem::from))
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> BackendResult<String> {
        let args = InvoiceArgs {
            cart: cart_payload(&request.lines)?,
            customer: &request.customer,
            mode_of_payment: &request.mode_of_payment,
            amount_paid: request.amount_paid.amount(),
        };
        self.call_required(methods::CREATE_INVOICE, &args).await
    }

    async fn get_recent_invoices(&self, opening_entry: &str) -> BackendResult<Vec<RecentInvoice>> {
        let records: Option<Vec<RecentInvoiceRecord>> = self
            .call(
                methods::GET_RECENT_INVOICES,
                &json!({ "opening_entry": opening_entry }),
            )
            .await?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(RecentInvoice::from)
            .collect())
    }

    async fn void_invoice(&self, invoice_name: &str) -> BackendResult<Vec<ReleasedLine>> {
        let records: Option<Vec<ReleasedLineRecord>> = self
            .call(methods::VOID_INVOICE, &json!({ "invoice_name": invoice_name }))
            .await?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(ReleasedLine::from)
            .collect())
    }

    async fn close_pos_shift(&self, opening_entry: &str) -> BackendResult<Option<String>> {
        self.call(
            methods::CLOSE_POS_SHIFT,
            &json!({ "opening_entry": opening_entry }),
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
