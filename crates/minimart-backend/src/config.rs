//! # Backend Settings
//!
//! Where the ERP lives and how to authenticate. Loaded as the `[backend]`
//! section of the terminal's config file.
//!
//! ```toml
//! [backend]
//! base_url = "https://erp.example.com"
//! api_key = "4f1c..."
//! api_secret = "9ab2..."
//! timeout_secs = 30
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BackendError, BackendResult};

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// ERP site root, e.g. `https://erp.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key of the cashier's ERP user.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API secret of the cashier's ERP user.
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Transport timeout per request (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            base_url: default_base_url(),
            api_key: None,
            api_secret: None,
            timeout_secs: default_timeout(),
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BackendSettings {
    /// Creates settings for a site with no credentials (session cookie or
    /// guest access).
    pub fn new(base_url: impl Into<String>) -> Self {
        BackendSettings {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Validates the settings.
    ///
    /// ## Rules
    /// - `base_url` parses and uses http or https
    /// - `timeout_secs` > 0
    /// - `api_key` and `api_secret` are set together or not at all
    pub fn validate(&self) -> BackendResult<()> {
        self.parsed_base_url()?;

        if self.timeout_secs == 0 {
            return Err(BackendError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.api_key.is_some() != self.api_secret.is_some() {
            return Err(BackendError::InvalidConfig(
                "api_key and api_secret must be set together".into(),
            ));
        }

        Ok(())
    }

    /// Parses `base_url`, normalised to end with `/` so method paths join
    /// under it instead of replacing its last segment.
    pub fn parsed_base_url(&self) -> BackendResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw)
            .map_err(|e| BackendError::InvalidConfig(format!("base_url '{}': {}", self.base_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(BackendError::InvalidConfig(format!(
                "base_url must use http or https, got: {}",
                other
            ))),
        }
    }

    /// `Authorization` header value for token auth, if credentials are set.
    pub fn auth_header(&self) -> Option<String> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some(format!("token {}:{}", key, secret)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
