//! # Text Rendering
//!
//! Plain-text views of the till for the terminal. Every function returns a
//! `String` so the views can be tested without a terminal.
//!
//! ```text
//!   #  Item                         Qty        Amount
//!   1  Corned Beef 150g               2       ₱100.00
//!   2  Rice (kg)                    2.5       ₱125.00
//!  ──────────────────────────────────────────────────
//!      TOTAL                                 ₱225.00
//! ```

use minimart_core::{
    CartEngine, CatalogItem, FinalizedSale, Receipt, RecentInvoice, ShiftState, StockLevel, Till,
};
use minimart_session::{SessionError, TillSettings};

const RULE: &str = "──────────────────────────────────────────────────";

pub fn cart(settings: &TillSettings, cart: &CartEngine) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = vec![format!("{:>3}  {:<28} {:>5} {:>13}", "#", "Item", "Qty", "Amount")];
    for (i, line) in cart.lines().iter().enumerate() {
        out.push(format!(
            "{:>3}  {:<28} {:>5} {:>13}",
            i + 1,
            truncate(&line.item_name, 28),
            line.quantity.to_string(),
            settings.format_money(line.line_total()),
        ));
    }
    out.push(RULE.to_string());
    out.push(format!(
        "     {:<34} {:>13}",
        "TOTAL",
        settings.format_money(cart.total())
    ));
    out.join("\n")
}

/// Catalog rows with the stock badge the product grid shows.
pub fn products<'a, I>(settings: &TillSettings, till: &Till, items: I) -> String
where
    I: IntoIterator<Item = &'a CatalogItem>,
{
    let threshold = settings.low_stock_threshold();
    let rows: Vec<String> = items
        .into_iter()
        .map(|item| {
            let stock = match till.stock().lookup(&item.item_code) {
                Some(qty) => match badge(StockLevel::classify(qty, threshold)) {
                    Some(badge) => format!("{qty} {badge}"),
                    None => qty.to_string(),
                },
                None => "-".to_string(),
            };
            format!(
                "{:<14} {:<28} {:>12}  {}",
                truncate(&item.item_code, 14),
                truncate(&item.item_name, 28),
                settings.format_money(item.price),
                stock
            )
        })
        .collect();

    if rows.is_empty() {
        "No products".to_string()
    } else {
        rows.join("\n")
    }
}

fn badge(level: StockLevel) -> Option<&'static str> {
    match level {
        StockLevel::Plenty => None,
        StockLevel::Low => Some("(low)"),
        StockLevel::Out => Some("(out)"),
    }
}

pub fn shift(settings: &TillSettings, state: &ShiftState) -> String {
    match state {
        ShiftState::Closed => "No open shift. Use 'open <amount>'.".to_string(),
        ShiftState::Open(shift) => format!(
            "Shift {} open at {} ({}), float {}",
            shift.opening_entry_id.as_deref().unwrap_or("-"),
            shift.pos_profile(),
            shift.company(),
            settings.format_money(shift.opening_amount),
        ),
        ShiftState::Ended { closing_entry } => format!(
            "Shift closed ({}). Restart to open a new one.",
            closing_entry.as_deref().unwrap_or("no closing entry")
        ),
    }
}

pub fn sale(settings: &TillSettings, sale: &FinalizedSale) -> String {
    format!(
        "{}  total {}  paid {}  change {}",
        sale.invoice_id,
        settings.format_money(sale.total),
        settings.format_money(sale.amount_paid),
        settings.format_money(sale.change),
    )
}

pub fn recent(settings: &TillSettings, invoices: &[RecentInvoice]) -> String {
    if invoices.is_empty() {
        return "No invoices this shift".to_string();
    }

    invoices
        .iter()
        .map(|inv| {
            format!(
                "{:<22} #{:<8} {:<20} {:>12}",
                inv.name,
                inv.short_name(),
                truncate(&inv.customer, 20),
                settings.format_money(inv.grand_total)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn receipt(settings: &TillSettings, receipt: &Receipt) -> String {
    let mut out = vec![receipt.company.clone(), receipt.invoice_id.clone(), RULE.to_string()];
    for line in &receipt.lines {
        out.push(format!(
            "{:<28} {:>5} x {:>10}",
            truncate(&line.item_name, 28),
            line.quantity.to_string(),
            settings.format_money(line.unit_price),
        ));
    }
    out.push(RULE.to_string());
    out.push(format!("{:<30} {:>15}", "TOTAL", settings.format_money(receipt.total)));
    out.push(format!("{:<30} {:>15}", "PAID", settings.format_money(receipt.paid)));
    out.push(format!("{:<30} {:>15}", "CHANGE", settings.format_money(receipt.change)));
    out.join("\n")
}

pub fn error(err: &SessionError) -> String {
    format!("[{}] {}", err.code(), err)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use minimart_core::{CoreError, Money, Quantity, StockCache};
    use rust_decimal_macros::dec;

    fn item(code: &str, name: &str, cents: i64, qty: i64) -> CatalogItem {
        CatalogItem {
            item_code: code.to_string(),
            item_name: name.to_string(),
            price: Money::from_cents(cents),
            actual_qty: Some(Quantity::from_units(qty)),
            image: None,
        }
    }

    #[test]
    fn test_cart_view() {
        let settings = TillSettings::default();
        let mut stock = StockCache::new();
        let mut cart = CartEngine::new();
        assert_eq!(super::cart(&settings, &cart), "Cart is empty");

        let rice = item("RICE", "Rice (kg)", 5000, 20);
        stock.seed(rice.stock_entry());
        cart.add_item(&mut stock, &rice).unwrap();
        cart.set_quantity(&mut stock, 0, Quantity::new(dec!(2.5))).unwrap();

        let view = super::cart(&settings, &cart);
        assert!(view.contains("Rice (kg)"));
        assert!(view.contains("2.5"));
        assert!(view.contains("₱125.00"));
    }

    #[test]
    fn test_products_show_stock_badges() {
        let settings = TillSettings::default();
        let mut till = Till::new(10);
        let items = vec![item("A", "Soap", 2500, 3), item("B", "Salt", 1500, 0)];
        till.seed_catalog(items);

        let view = products(&settings, &till, till.catalog());
        let lines: Vec<&str> = view.lines().collect();
        assert!(lines[0].ends_with("3 (low)"));
        assert!(lines[1].ends_with("0 (out)"));
    }

    #[test]
    fn test_shift_states() {
        let settings = TillSettings::default();
        assert!(shift(&settings, &ShiftState::Closed).contains("open <amount>"));
        let ended = ShiftState::Ended {
            closing_entry: Some("POS-CLO-00001".into()),
        };
        assert!(shift(&settings, &ended).contains("POS-CLO-00001"));
    }

    #[test]
    fn test_error_has_code_prefix() {
        let err = SessionError::from(CoreError::EmptyCart);
        assert!(error(&err).starts_with("[EMPTY_CART] "));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
