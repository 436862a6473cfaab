//! BTC Markets integration
//!
//! Signed REST client, market data fetchers and a background ticker poller
//! on the monoio runtime.

pub mod auth;
pub mod config;
pub mod poller;
pub mod rest;
pub mod types;

use crate::errors::{ExchangeError, Result};
use crate::traits::{CurrencyConverter, Exchange, HttpTransport, PriceSink};
use bourse_core::Fixed;

use std::rc::Rc;
use tracing::info;

pub use auth::{Credentials, canonical_string, generate_nonce, nonce_from_nanos, sign};
pub use config::BtcMarketsConfig;
pub use poller::{PollEvent, PollerState, TickerCache, TickerPoller};
pub use rest::{BtcMarketsRestClient, market_path, trades_path};
pub use types::*;

/// BTC Markets exchange: one REST client plus the ticker cache its poller
/// fills.
pub struct BtcMarketsExchange {
    client: Rc<BtcMarketsRestClient>,
    cache: TickerCache,
}

impl BtcMarketsExchange {
    /// Validates the config before building the client.
    pub fn new(config: BtcMarketsConfig, transport: Rc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;

        info!("🚀 Initializing {}", config.name);
        info!("   Polling delay: {}s", config.polling_delay_secs);
        info!("   Enabled pairs: {:?}", config.enabled_pairs);
        info!("   Fee: {}%", config.fee);

        let client = BtcMarketsRestClient::new(config, transport)?;
        Ok(Self {
            client: Rc::new(client),
            cache: TickerCache::new(),
        })
    }

    pub fn with_https(config: BtcMarketsConfig) -> Result<Self> {
        let transport: Rc<dyn HttpTransport> = Rc::new(crate::http::MonoioHttpsClient::new()?);
        Self::new(config, transport)
    }

    pub fn client(&self) -> &Rc<BtcMarketsRestClient> {
        &self.client
    }

    /// Snapshots written by every poller built from this exchange
    pub fn tickers(&self) -> TickerCache {
        self.cache.clone()
    }

    /// Only possible while no poller holds the client.
    pub fn set_api_keys(&mut self, api_key: &str, encoded_secret: &str) -> Result<()> {
        let client = Rc::get_mut(&mut self.client).ok_or_else(|| {
            ExchangeError::Configuration("API keys must be set before a poller is created".to_string())
        })?;
        client.set_api_keys(api_key, encoded_secret)
    }

    /// Poller over this exchange's client, writing into its ticker cache
    pub fn poller(
        &self,
        converter: Rc<dyn CurrencyConverter>,
        sink: Rc<dyn PriceSink>,
    ) -> Result<TickerPoller> {
        Ok(TickerPoller::new(Rc::clone(&self.client), converter, sink)?.with_cache(self.cache.clone()))
    }
}

impl Exchange for BtcMarketsExchange {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.client.set_enabled(enabled);
    }

    fn fee(&self) -> Fixed {
        self.client.config().fee
    }
}
