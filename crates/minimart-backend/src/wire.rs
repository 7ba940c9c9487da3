//! # Wire Records
//!
//! JSON shapes of the ERP's whitelisted methods, and their conversion into
//! `minimart-core` types.
//!
//! ## Envelope
//! ```text
//! 200 OK   {"message": <value>}              → Envelope<T>
//! 4xx/5xx  {"exc_type": "...",
//!           "exception": "...",
//!           "_server_messages": "[\"{\\\"message\\\": \\\"...\\\"}\"]"}
//!                                             → error_message()
//! ```
//!
//! Amounts and quantities travel as JSON numbers. They are read straight
//! into `Decimal` with `rust_decimal::serde::float`, so the conversion to
//! `Money` / `Quantity` never goes through an `f64` in our code.

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use minimart_core::{
    CartLine, CatalogItem, Money, Quantity, RecentInvoice, ReleasedLine, ShiftProfile,
    ShiftStatus,
};

use crate::error::{BackendError, BackendResult};

// =============================================================================
// Envelope
// =============================================================================

/// `{"message": ...}` wrapper around every success response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub message: Option<T>,
}

/// Decodes a success body. A missing or null `message` is `None`.
pub fn decode_message<T: DeserializeOwned>(method: &str, body: &str) -> BackendResult<Option<T>> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.message)
        .map_err(|e| BackendError::decode(method, e))
}

/// Pulls a human-readable message out of an error body.
///
/// Looks at `_server_messages` first (a JSON string holding a list of JSON
/// strings, each with a `message` field), then `exception`, then `exc_type`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    if let Some(messages) = value
        .get("_server_messages")
        .and_then(Value::as_str)
        .and_then(server_messages)
    {
        return Some(messages);
    }

    ["exception", "exc_type"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn server_messages(raw: &str) -> Option<String> {
    let entries: Vec<String> = serde_json::from_str(raw).ok()?;

    let messages: Vec<String> = entries
        .iter()
        .map(|entry| {
            serde_json::from_str::<Value>(entry)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| entry.clone())
        })
        .filter(|m| !m.trim().is_empty())
        .collect();

    (!messages.is_empty()).then(|| messages.join("; "))
}

// =============================================================================
// Shift
// =============================================================================

/// Response of `check_pos_opening`.
#[derive(Debug, Clone, Deserialize)]
pub struct PosOpeningRecord {
    pub opening_entry: Option<String>,
    pub pos_profile: String,
    #[serde(default)]
    pub company: String,
    /// Profile's default customer.
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_methods: Vec<String>,
}

impl From<PosOpeningRecord> for ShiftStatus {
    fn from(record: PosOpeningRecord) -> Self {
        ShiftStatus {
            opening_entry: record.opening_entry.filter(|e| !e.is_empty()),
            profile: ShiftProfile {
                pos_profile: record.pos_profile,
                company: record.company,
                customer_default: record.customer.filter(|c| !c.is_empty()),
                payment_methods: record.payment_methods,
            },
        }
    }
}

/// Arguments of `create_opening_entry`.
#[derive(Debug, Serialize)]
pub struct OpeningArgs<'a> {
    pub pos_profile: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

// =============================================================================
// Catalog
// =============================================================================

/// One row of `get_products` / the object of `get_item_by_barcode`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub item_code: String,
    pub item_name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub actual_qty: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<ProductRecord> for CatalogItem {
    fn from(record: ProductRecord) -> Self {
        let item_name = record
            .item_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| record.item_code.clone());

        CatalogItem {
            item_code: record.item_code,
            item_name,
            price: Money::new(record.price.unwrap_or(Decimal::ZERO)),
            actual_qty: record.actual_qty.map(Quantity::new),
            image: record.image.filter(|i| !i.is_empty()),
        }
    }
}

// =============================================================================
// Invoices
// =============================================================================

/// One element of the `cart` argument of `create_invoice`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineRecord {
    pub item_code: String,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
}

impl From<&CartLine> for CartLineRecord {
    fn from(line: &CartLine) -> Self {
        CartLineRecord {
            item_code: line.item_code.clone(),
            item_name: line.item_name.clone(),
            price: line.unit_price.amount(),
            qty: line.quantity.value(),
        }
    }
}

/// Serializes cart lines into the JSON *string* `create_invoice` expects.
pub fn cart_payload(lines: &[CartLine]) -> BackendResult<String> {
    let records: Vec<CartLineRecord> = lines.iter().map(CartLineRecord::from).collect();
    serde_json::to_string(&records).map_err(|e| BackendError::decode("create_invoice", e))
}

/// Arguments of `create_invoice`.
#[derive(Debug, Serialize)]
pub struct InvoiceArgs<'a> {
    pub cart: String,
    pub customer: &'a str,
    pub mode_of_payment: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
}

/// One row of `get_recent_invoices`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentInvoiceRecord {
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub grand_total: Option<Decimal>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub creation: Option<String>,
}

impl From<RecentInvoiceRecord> for RecentInvoice {
    fn from(record: RecentInvoiceRecord) -> Self {
        RecentInvoice {
            name: record.name,
            grand_total: Money::new(record.grand_total.unwrap_or(Decimal::ZERO)),
            customer: record.customer.unwrap_or_default(),
            creation: record.creation,
        }
    }
}

/// One element of the `void_invoice` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleasedLineRecord {
    pub item_code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
}

impl From<ReleasedLineRecord> for ReleasedLine {
    fn from(record: ReleasedLineRecord) -> Self {
        ReleasedLine {
            item_code: record.item_code,
            qty: Quantity::new(record.qty),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_message() {
        let name: Option<String> =
            decode_message("create_invoice", r#"{"message": "ACC-PSINV-0001"}"#).unwrap();
        assert_eq!(name.as_deref(), Some("ACC-PSINV-0001"));

        let missing: Option<ProductRecord> =
            decode_message("get_item_by_barcode", r#"{"message": null}"#).unwrap();
        assert!(missing.is_none());

        let empty: Option<String> = decode_message("close_pos_shift", "{}").unwrap();
        assert!(empty.is_none());

        assert!(decode_message::<String>("create_invoice", "<html>").is_err());
    }

    #[test]
    fn test_error_message_prefers_server_messages() {
        let inner = serde_json::json!({"message": "Account not found for GCash"}).to_string();
        let outer = serde_json::to_string(&vec![inner]).unwrap();
        let body = serde_json::json!({
            "exc_type": "ValidationError",
            "exception": "frappe.exceptions.ValidationError: Account not found for GCash",
            "_server_messages": outer,
        })
        .to_string();

        assert_eq!(error_message(&body).as_deref(), Some("Account not found for GCash"));
    }

    #[test]
    fn test_error_message_fallbacks() {
        let body = r#"{"exception": "frappe.exceptions.PermissionError", "exc_type": "PermissionError"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("frappe.exceptions.PermissionError")
        );

        let body = r#"{"exc_type": "DoesNotExistError"}"#;
        assert_eq!(error_message(body).as_deref(), Some("DoesNotExistError"));

        assert_eq!(error_message("Bad Gateway"), None);
        assert_eq!(error_message("{}"), None);
    }

    #[test]
    fn test_product_record_conversion() {
        let record: ProductRecord = serde_json::from_str(
            r#"{"item_code": "RICE", "item_name": "Rice per kg", "price": 52.75, "actual_qty": 12.5, "image": ""}"#,
        )
        .unwrap();
        let item = CatalogItem::from(record);

        assert_eq!(item.price, Money::new(dec!(52.75)));
        assert_eq!(item.actual_qty, Some(Quantity::new(dec!(12.5))));
        assert_eq!(item.image, None);

        // barcode lookups carry no stock and may lack a name
        let record: ProductRecord =
            serde_json::from_str(r#"{"item_code": "SODA", "item_name": null, "price": 25}"#).unwrap();
        let item = CatalogItem::from(record);
        assert_eq!(item.item_name, "SODA");
        assert_eq!(item.actual_qty, None);
        assert_eq!(item.price, Money::from_cents(2500));
    }

    #[test]
    fn test_pos_opening_record_conversion() {
        let record: PosOpeningRecord = serde_json::from_str(
            r#"{"opening_entry": null, "pos_profile": "Main Counter", "company": "MiniMart",
                "customer": "Walk-in", "payment_methods": ["Cash", "GCash"]}"#,
        )
        .unwrap();
        let status = ShiftStatus::from(record);

        assert!(status.opening_entry.is_none());
        assert_eq!(status.profile.default_customer(), "Walk-in");
        assert_eq!(status.profile.default_payment_method(), "Cash");
    }

    #[test]
    fn test_cart_payload_uses_json_numbers() {
        let lines = vec![CartLine {
            item_code: "RICE".to_string(),
            item_name: "Rice per kg".to_string(),
            unit_price: Money::new(dec!(52.75)),
            quantity: Quantity::new(dec!(0.5)),
        }];

        let payload = cart_payload(&lines).unwrap();
        let parsed: Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(parsed[0]["item_code"], "RICE");
        assert_eq!(parsed[0]["price"], serde_json::json!(52.75));
        assert_eq!(parsed[0]["qty"], serde_json::json!(0.5));
    }

    #[test]
    fn test_released_line_conversion() {
        let records: Vec<ReleasedLineRecord> =
            serde_json::from_str(r#"[{"item_code": "SKU1", "qty": 2}]"#).unwrap();
        let released: Vec<ReleasedLine> = records.into_iter().map(Into::into).collect();
        assert_eq!(released[0].qty, Quantity::from_units(2));
    }
}
