use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const DEFAULT_API_URL: &str = "https://rest.coinapi.io";

/// Client configuration: where market data comes from and how eagerly it is
/// refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the market-data API, without a trailing slash.
    pub api_url: String,

    /// API key sent with every request. Requests are still attempted without one.
    pub api_key: Option<String>,

    /// Currency that history rates are quoted in (e.g., "USD").
    pub quote_currency: String,

    /// Total attempts per fetch, including the first. Only network errors are retried.
    pub max_attempts: u32,

    /// How long a fetched asset snapshot is considered fresh.
    pub stale_time_secs: u64,

    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            quote_currency: "USD".to_string(),
            max_attempts: 3,
            stale_time_secs: 5 * 60,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Defaults overridden by environment variables:
    /// `COINAPI_URL`, `COINAPI_KEY`, `PORTFOLIO_QUOTE_CURRENCY`,
    /// `PORTFOLIO_MAX_ATTEMPTS`, `PORTFOLIO_STALE_SECS`.
    ///
    /// Unparseable numeric overrides are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Settings::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(url) = lookup("COINAPI_URL").filter(|v| !v.trim().is_empty()) {
            settings.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup("COINAPI_KEY").filter(|v| !v.trim().is_empty()) {
            settings.api_key = Some(key.trim().to_string());
        }
        if let Some(quote) = lookup("PORTFOLIO_QUOTE_CURRENCY") {
            settings.quote_currency = quote.trim().to_uppercase();
        }
        if let Some(raw) = lookup("PORTFOLIO_MAX_ATTEMPTS") {
            match raw.trim().parse() {
                Ok(n) => settings.max_attempts = n,
                Err(_) => warn!("PORTFOLIO_MAX_ATTEMPTS='{raw}' is not a number, keeping default"),
            }
        }
        if let Some(raw) = lookup("PORTFOLIO_STALE_SECS") {
            match raw.trim().parse() {
                Ok(n) => settings.stale_time_secs = n,
                Err(_) => warn!("PORTFOLIO_STALE_SECS='{raw}' is not a number, keeping default"),
            }
        }

        settings
    }

    /// Check the settings are usable before building a client from them.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "api_url '{}' must start with http:// or https://",
                self.api_url
            )));
        }
        let quote = &self.quote_currency;
        if quote.len() != 3 || !quote.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::InvalidConfig(format!(
                "quote_currency '{quote}' must be exactly 3 uppercase ASCII letters (e.g., USD)"
            )));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
