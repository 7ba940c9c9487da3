//! # Terminal Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MINIMART_BASE_URL=https://erp.example.com                          │
//! │     MINIMART_API_KEY / MINIMART_API_SECRET                             │
//! │     MINIMART_TIMEOUT_SECS=30                                           │
//! │     MINIMART_CURRENCY_SYMBOL=₱                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/minimart-pos/terminal.toml (Linux)                       │
//! │     ~/Library/Application Support/com.minimart.pos/terminal.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [backend]
//! base_url = "https://erp.example.com"
//! api_key = "4f1c..."
//! api_secret = "9ab2..."
//! timeout_secs = 30
//!
//! [till]
//! currency_symbol = "₱"
//! low_stock_threshold = 5
//! recent_limit = 10
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use minimart_backend::BackendSettings;
use minimart_core::{Money, Quantity, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_RECENT_LIMIT};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Till Settings
// =============================================================================

/// Display and history settings of the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TillSettings {
    /// Prefix for amounts on screen and receipt.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Stock at or below this shows as low.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,

    /// How many recent invoices to keep for void/reprint.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_currency_symbol() -> String {
    "₱".to_string()
}

fn default_low_stock_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD as u32
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for TillSettings {
    fn default() -> Self {
        TillSettings {
            currency_symbol: default_currency_symbol(),
            low_stock_threshold: default_low_stock_threshold(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl TillSettings {
    pub fn low_stock_threshold(&self) -> Quantity {
        Quantity::from_units(i64::from(self.low_stock_threshold))
    }

    /// Amount with the currency symbol, e.g. `₱1234.50`.
    pub fn format_money(&self, amount: Money) -> String {
        format!("{}{}", self.currency_symbol, amount)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub till: TillSettings,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SessionResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SessionError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        self.backend
            .validate()
            .map_err(|e| SessionError::Config(e.to_string()))?;

        if self.till.recent_limit == 0 {
            return Err(SessionError::Config(
                "recent_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MINIMART_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.backend.base_url = url;
        }

        if let Some(key) = lookup("MINIMART_API_KEY") {
            self.backend.api_key = Some(key);
        }

        if let Some(secret) = lookup("MINIMART_API_SECRET") {
            self.backend.api_secret = Some(secret);
        }

        if let Some(timeout) = lookup("MINIMART_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.backend.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring invalid MINIMART_TIMEOUT_SECS"),
            }
        }

        if let Some(symbol) = lookup("MINIMART_CURRENCY_SYMBOL") {
            self.till.currency_symbol = symbol;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "minimart", "pos")
            .map(|dirs| dirs.config_dir().join("terminal.toml"))
    }
}
