//! # MiniMart Terminal Entry Point
//!
//! Line-oriented cashier terminal.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load `terminal.toml` + `MINIMART_*` environment overrides
//! 3. Build the backend: Frappe over HTTP, or in-memory with `--demo`
//! 4. Start the session (resumes an open shift)
//! 5. Read commands from stdin until `quit`
//!
//! ## Usage
//! ```text
//! minimart-terminal [--config <path>] [--demo]
//! ```

mod app;
mod commands;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use minimart_backend::{FrappeClient, MemoryBackend, PosBackend};
use minimart_core::{CatalogItem, Money, Quantity, ShiftProfile};
use minimart_session::{PosConfig, PosSession};

use crate::app::App;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    demo: bool,
}

impl Args {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self, String> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--demo" => parsed.demo = true,
                "--config" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                other => return Err(format!("Unknown argument: {other}")),
            }
        }
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse(std::env::args().skip(1)).map_err(|e| anyhow!(e))?;
    let config = PosConfig::load(args.config).context("loading terminal config")?;

    let backend: Arc<dyn PosBackend> = if args.demo {
        info!("Starting with the in-memory demo backend");
        Arc::new(demo_backend())
    } else {
        info!(base_url = %config.backend.base_url, "Starting MiniMart terminal");
        Arc::new(FrappeClient::new(&config.backend).context("building ERP client")?)
    };

    let session = PosSession::new(backend, config.till);
    let mut app = App::new(session);

    println!("{}", app.start().await);
    app.run(BufReader::new(tokio::io::stdin()))
        .await
        .context("reading cashier input")?;

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=minimart_backend=trace` - Trace the HTTP boundary only
/// - Default: INFO, DEBUG for minimart crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,minimart=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn demo_backend() -> MemoryBackend {
    let item = |code: &str, name: &str, cents: i64, qty: i64| CatalogItem {
        item_code: code.to_string(),
        item_name: name.to_string(),
        price: Money::from_cents(cents),
        actual_qty: Some(Quantity::from_units(qty)),
        image: None,
    };

    MemoryBackend::new(ShiftProfile {
        pos_profile: "Demo Counter".to_string(),
        company: "MiniMart Demo".to_string(),
        customer_default: Some("Walk-in Customer".to_string()),
        payment_methods: vec!["Cash".to_string(), "GCash".to_string()],
    })
    .with_products(vec![
        item("NOODLE-55", "Instant Noodles 55g", 1500, 48),
        item("SARDINES", "Sardines 155g", 2600, 4),
        item("RICE-KG", "Rice (kg)", 5200, 25),
        item("SOAP", "Bath Soap", 4500, 0),
    ])
    .with_barcode("4800016644290", "NOODLE-55")
    .with_barcode("4800249880012", "SARDINES")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_args() {
        let parsed = args(&["--demo", "--config", "/tmp/t.toml"]).unwrap();
        assert!(parsed.demo);
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/t.toml")));

        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
