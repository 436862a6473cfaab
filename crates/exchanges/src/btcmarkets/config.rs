//! BTC Markets adapter configuration

use crate::errors::{ExchangeError, Result};
use crate::types::CurrencyPair;
use bourse_core::Fixed;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.btcmarkets.net";
pub const DEFAULT_NAME: &str = "BTC Markets";
pub const DEFAULT_POLLING_DELAY_SECS: u64 = 10;

/// Configuration for one BTC Markets client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BtcMarketsConfig {
    pub name: String,
    pub enabled: bool,
    pub verbose: bool,
    /// Carried for config compatibility; streaming is not implemented.
    pub websocket: bool,
    pub polling_delay_secs: u64,
    /// Trading fee in percent
    pub fee: Fixed,
    pub authenticated_api_support: bool,
    pub api_key: String,
    /// Base64 encoded, as issued by the exchange
    pub api_secret: String,
    pub base_currencies: Vec<String>,
    pub available_pairs: Vec<String>,
    pub enabled_pairs: Vec<String>,
    pub base_url: String,
    pub reporting_currency: String,
}

impl Default for BtcMarketsConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            enabled: true,
            verbose: false,
            websocket: false,
            polling_delay_secs: DEFAULT_POLLING_DELAY_SECS,
            fee: Fixed::new(85, 2),
            authenticated_api_support: false,
            api_key: String::new(),
            api_secret: String::new(),
            base_currencies: vec!["AUD".to_string()],
            available_pairs: Vec::new(),
            enabled_pairs: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            reporting_currency: "USD".to_string(),
        }
    }
}

impl BtcMarketsConfig {
    /// Enables authenticated support as a side effect.
    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self.api_secret = api_secret.into();
        self.authenticated_api_support = true;
        self
    }

    pub fn with_enabled_pairs<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_pairs = pairs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_available_pairs<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_pairs = pairs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_polling_delay(mut self, secs: u64) -> Self {
        self.polling_delay_secs = secs;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_reporting_currency(mut self, currency: impl Into<String>) -> Self {
        self.reporting_currency = currency.into();
        self
    }

    /// Defaults overlaid with `BTCMARKETS_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Missing variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        if let (Ok(key), Ok(secret)) = (
            std::env::var("BTCMARKETS_API_KEY"),
            std::env::var("BTCMARKETS_API_SECRET"),
        ) {
            config = config.with_credentials(key, secret);
        }

        if let Ok(pairs) = std::env::var("BTCMARKETS_ENABLED_PAIRS") {
            config.enabled_pairs = pairs
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(delay) = std::env::var("BTCMARKETS_POLLING_DELAY") {
            config.polling_delay_secs = delay.trim().parse().map_err(|_| {
                ExchangeError::Configuration(format!("BTCMARKETS_POLLING_DELAY={delay:?} is not a number of seconds"))
            })?;
        }

        if let Ok(verbose) = std::env::var("BTCMARKETS_VERBOSE") {
            config.verbose = matches!(verbose.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExchangeError::Configuration(format!("invalid config document: {e}")))
    }

    pub fn polling_delay(&self) -> Duration {
        Duration::from_secs(self.polling_delay_secs)
    }

    /// Enabled pairs parsed with the 3+3 rule.
    ///
    /// Any symbol that is not exactly six letters makes the whole config
    /// invalid rather than being mis-sliced.
    pub fn enabled_currency_pairs(&self) -> Result<Vec<CurrencyPair>> {
        self.enabled_pairs
            .iter()
            .map(|symbol| {
                CurrencyPair::parse(symbol).map_err(|e| {
                    ExchangeError::Configuration(format!("{} enabled pair: {e}", self.name))
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling_delay_secs == 0 {
            return Err(ExchangeError::Configuration(
                "polling delay must be at least one second".to_string(),
            ));
        }
        if self.reporting_currency.len() != crate::types::CURRENCY_CODE_LEN {
            return Err(ExchangeError::Configuration(format!(
                "reporting currency {:?} is not a 3 letter code",
                self.reporting_currency
            )));
        }

        let pairs = self.enabled_currency_pairs()?;

        if !self.available_pairs.is_empty() {
            for pair in &pairs {
                let symbol = pair.symbol();
                if !self.available_pairs.iter().any(|p| p.eq_ignore_ascii_case(&symbol)) {
                    warn!("⚠️ {} pair {} is enabled but not listed as available", self.name, symbol);
                }
            }
        }

        Ok(())
    }
}
