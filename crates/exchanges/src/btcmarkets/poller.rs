//! Background ticker polling
//!
//! Every polling interval the driver spawns one task per enabled pair and
//! goes straight back to sleep; it never joins the tasks. A slow task can
//! therefore still be running when the next cycle starts, and whichever
//! task for a pair finishes last owns the cached snapshot (last write wins).
//! Readers must accept a snapshot from any recent cycle.
//!
//! Disabling the client stops new cycles at the next wake-up. Tasks that
//! are already in flight run to completion.

use crate::btcmarkets::rest::BtcMarketsRestClient;
use crate::btcmarkets::types::Ticker;
use crate::errors::{ExchangeError, Result};
use crate::traits::{CurrencyConverter, PriceSink};
use crate::types::CurrencyPair;
use bourse_core::Fixed;

use flume::Sender;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Latest ticker per pair symbol, shared between the poller and readers
#[derive(Debug, Clone, Default)]
pub struct TickerCache {
    inner: Arc<RwLock<HashMap<String, Ticker>>>,
}

impl TickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, symbol: impl Into<String>, ticker: Ticker) {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(symbol.into(), ticker);
    }

    pub fn get(&self, symbol: &str) -> Option<Ticker> {
        let guard = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(symbol).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, Ticker> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Cached symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Emitted once at the end of every fan-out task
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Updated { pair: String },
    Failed { pair: String, error: ExchangeError },
}

impl PollEvent {
    pub fn pair(&self) -> &str {
        match self {
            PollEvent::Updated { pair } | PollEvent::Failed { pair, .. } => pair,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Stopped,
}

pub struct TickerPoller {
    client: Rc<BtcMarketsRestClient>,
    converter: Rc<dyn CurrencyConverter>,
    sink: Rc<dyn PriceSink>,
    cache: TickerCache,
    events: Option<Sender<PollEvent>>,
    pairs: Vec<CurrencyPair>,
    state: Cell<PollerState>,
}

impl TickerPoller {
    /// Fails if any enabled pair is not a 6 letter symbol.
    pub fn new(
        client: Rc<BtcMarketsRestClient>,
        converter: Rc<dyn CurrencyConverter>,
        sink: Rc<dyn PriceSink>,
    ) -> Result<Self> {
        let pairs = client.config().enabled_currency_pairs()?;
        Ok(Self {
            client,
            converter,
            sink,
            cache: TickerCache::new(),
            events: None,
            pairs,
            state: Cell::new(PollerState::Idle),
        })
    }

    /// Write into an existing cache instead of a private one
    pub fn with_cache(mut self, cache: TickerCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_events(mut self, events: Sender<PollEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cache(&self) -> TickerCache {
        self.cache.clone()
    }

    pub fn state(&self) -> PollerState {
        self.state.get()
    }

    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    /// Spawn one fetch per pair without waiting for any of them.
    ///
    /// Returns the number of tasks spawned. Must run inside a monoio runtime.
    pub fn poll_once(&self) -> usize {
        for pair in &self.pairs {
            let task = PollTask {
                client: Rc::clone(&self.client),
                converter: Rc::clone(&self.converter),
                sink: Rc::clone(&self.sink),
                cache: self.cache.clone(),
                events: self.events.clone(),
                pair: pair.clone(),
            };
            monoio::spawn(task.run());
        }
        self.pairs.len()
    }

    /// Poll until the client is disabled. Can only be started once.
    pub async fn run(&self) -> Result<()> {
        if self.state.get() != PollerState::Idle {
            return Err(ExchangeError::Configuration("poller already started".to_string()));
        }
        self.state.set(PollerState::Polling);

        let config = self.client.config();
        if config.verbose {
            info!("{} polling delay: {}s", config.name, config.polling_delay_secs);
            info!(
                "{} {} currencies enabled: {:?}",
                config.name,
                self.pairs.len(),
                config.enabled_pairs
            );
        }

        while self.client.is_enabled() {
            let spawned = self.poll_once();
            debug!("{} cycle started with {} tasks", config.name, spawned);
            monoio::time::sleep(config.polling_delay()).await;
        }

        self.state.set(PollerState::Stopped);
        info!("🛑 {} poller stopped", config.name);
        Ok(())
    }
}

/// Everything one fan-out task needs, owned so the task is `'static`
struct PollTask {
    client: Rc<BtcMarketsRestClient>,
    converter: Rc<dyn CurrencyConverter>,
    sink: Rc<dyn PriceSink>,
    cache: TickerCache,
    events: Option<Sender<PollEvent>>,
    pair: CurrencyPair,
}

impl PollTask {
    async fn run(self) {
        let symbol = self.pair.symbol();
        let name = self.client.name();

        let ticker = match self.client.ticker(&self.pair).await {
            Ok(ticker) => ticker,
            Err(e) if e.is_transport() => {
                warn!("⚠️ {} ticker {} unreachable, skipping this cycle: {}", name, symbol, e);
                self.notify(PollEvent::Failed { pair: symbol, error: e });
                return;
            }
            Err(e) => {
                bourse_core::log_error!(format!("{name} ticker {symbol}"), &e);
                self.notify(PollEvent::Failed { pair: symbol, error: e });
                return;
            }
        };

        self.cache.insert(symbol.clone(), ticker.clone());

        let reporting = self.client.config().reporting_currency.as_str();
        let last = self.convert(ticker.last_price, reporting);
        let bid = self.convert(ticker.best_bid, reporting);
        let ask = self.convert(ticker.best_ask, reporting);

        bourse_core::log_ticker!(
            name,
            symbol,
            format!("{last} ({})", ticker.last_price),
            format!("{bid} ({})", ticker.best_bid),
            format!("{ask} ({})", ticker.best_ask)
        );
        debug!("{} {} spread {}", name, symbol, ticker.spread());

        self.sink
            .record(name, &self.pair.base, &self.pair.quote, ticker.last_price, Fixed::ZERO);
        self.sink.record(name, &self.pair.base, reporting, last, Fixed::ZERO);

        self.notify(PollEvent::Updated { pair: symbol });
    }

    /// Quote currency to reporting currency; zero when no rate is known
    fn convert(&self, amount: Fixed, reporting: &str) -> Fixed {
        self.converter
            .convert(amount, &self.pair.quote, reporting)
            .unwrap_or_else(|e| {
                warn!("{} {} conversion to {} failed: {}", self.client.name(), self.pair, reporting, e);
                Fixed::ZERO
            })
    }

    fn notify(&self, event: PollEvent) {
        if let Some(events) = &self.events {
            // Nobody listening is fine
            let _ = events.send(event);
        }
    }
}
