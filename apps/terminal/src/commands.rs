//! # Cashier Commands
//!
//! Parses one line of cashier input into a [`Command`].
//!
//! ## Command Set
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shift      open <amount> │ close │ status                              │
//! │  Catalog    products [keyword] │ sync                                   │
//! │  Cart       scan <barcode> │ add <item_code> │ cart                     │
//! │             inc <line> │ dec <line> │ qty <line> <qty> │ rm <line>      │
//! │  Checkout   pay <tendered> [method] [customer...]                       │
//! │  History    recent │ refresh │ void <invoice> │ receipt                 │
//! │  Other      help │ quit                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line numbers are 1-based as printed by `cart`; they are converted to
//! cart indexes here.

use thiserror::Error;

use minimart_core::validation::parse_amount;
use minimart_core::{Money, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Status,
    Open(Money),
    Close,
    Products(Option<String>),
    Sync,
    Scan(String),
    Add(String),
    Cart,
    Increment(usize),
    Decrement(usize),
    Quantity { index: usize, input: String },
    Remove(usize),
    Pay {
        tendered: Money,
        method: Option<String>,
        customer: Option<String>,
    },
    Recent,
    Refresh,
    Void(String),
    Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a cart line number")]
    InvalidLine(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Parses a line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "status" => Command::Status,
        "open" => {
            let amount = args.first().copied().unwrap_or("0");
            Command::Open(parse_amount("opening amount", amount)?)
        }
        "close" => Command::Close,
        "products" | "search" => Command::Products(rest(&args)),
        "sync" => Command::Sync,
        "scan" => Command::Scan(one(&args, "scan <barcode>")?.to_string()),
        "add" => Command::Add(one(&args, "add <item_code>")?.to_string()),
        "cart" => Command::Cart,
        "inc" | "+" => Command::Increment(line_index(one(&args, "inc <line>")?)?),
        "dec" | "-" => Command::Decrement(line_index(one(&args, "dec <line>")?)?),
        "qty" => {
            const USAGE: &str = "qty <line> <quantity>";
            let index = line_index(one(&args, USAGE)?)?;
            let input = args.get(1).ok_or(CommandError::Usage(USAGE))?;
            Command::Quantity {
                index,
                input: input.to_string(),
            }
        }
        "rm" | "remove" => Command::Remove(line_index(one(&args, "rm <line>")?)?),
        "pay" => {
            let tendered = one(&args, "pay <tendered> [method] [customer]")?;
            Command::Pay {
                tendered: parse_amount("tendered amount", tendered)?,
                method: args.get(1).map(|m| m.to_string()),
                customer: rest(args.get(2..).unwrap_or_default()),
            }
        }
        "recent" => Command::Recent,
        "refresh" => Command::Refresh,
        "void" => Command::Void(one(&args, "void <invoice>")?.to_string()),
        "receipt" | "reprint" => Command::Receipt,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn one<'a>(args: &[&'a str], usage: &'static str) -> Result<&'a str, CommandError> {
    args.first().copied().ok_or(CommandError::Usage(usage))
}

/// Remaining words joined back together (customer names have spaces).
fn rest(args: &[&str]) -> Option<String> {
    if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    }
}

fn line_index(word: &str) -> Result<usize, CommandError> {
    match word.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::InvalidLine(word.to_string())),
    }
}

pub const HELP: &str = "\
Shift:    open <amount> | close | status
Catalog:  products [keyword] | sync
Cart:     scan <barcode> | add <item_code> | cart
          inc <line> | dec <line> | qty <line> <qty> | rm <line>
Checkout: pay <tendered> [method] [customer]
History:  recent | refresh | void <invoice> | receipt
Other:    help | quit";

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_open_defaults_to_zero() {
        assert_eq!(parse("open").unwrap(), Some(Command::Open(Money::ZERO)));
        assert_eq!(
            parse("OPEN 1000.50").unwrap(),
            Some(Command::Open(Money::new(dec!(1000.50))))
        );
        assert!(matches!(parse("open lots"), Err(CommandError::Invalid(_))));
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        assert_eq!(parse("inc 1").unwrap(), Some(Command::Increment(0)));
        assert_eq!(parse("- 3").unwrap(), Some(Command::Decrement(2)));
        assert_eq!(parse("rm 2").unwrap(), Some(Command::Remove(1)));
        assert_eq!(
            parse("rm 0").unwrap_err(),
            CommandError::InvalidLine("0".to_string())
        );
        assert_eq!(parse("inc").unwrap_err(), CommandError::Usage("inc <line>"));
    }

    #[test]
    fn test_qty_keeps_raw_input() {
        assert_eq!(
            parse("qty 1 2.5").unwrap(),
            Some(Command::Quantity {
                index: 0,
                input: "2.5".to_string()
            })
        );
        // the session rejects garbage, not the parser
        assert!(matches!(
            parse("qty 1 abc").unwrap(),
            Some(Command::Quantity { .. })
        ));
        assert!(matches!(parse("qty 1"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_pay() {
        assert_eq!(
            parse("pay 150").unwrap(),
            Some(Command::Pay {
                tendered: Money::from_cents(15000),
                method: None,
                customer: None,
            })
        );
        assert_eq!(
            parse("pay 200 GCash Juan dela Cruz").unwrap(),
            Some(Command::Pay {
                tendered: Money::from_cents(20000),
                method: Some("GCash".to_string()),
                customer: Some("Juan dela Cruz".to_string()),
            })
        );
    }

    #[test]
    fn test_products_keyword() {
        assert_eq!(parse("products").unwrap(), Some(Command::Products(None)));
        assert_eq!(
            parse("search corned beef").unwrap(),
            Some(Command::Products(Some("corned beef".to_string())))
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            parse("refund 12").unwrap_err().to_string(),
            "Unknown command 'refund', type 'help'"
        );
    }
}
