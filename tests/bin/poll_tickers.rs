//! Poll BTC Markets tickers and print the price board
//!
//! Configuration comes from `BTCMARKETS_*` environment variables (or a
//! `.env` file). `AUD_PER_USD` seeds the conversion rate table.
//!
//! Usage: `poll_tickers [cycles]`. Without a cycle count it polls until
//! killed.

use anyhow::{Context, Result};
use bourse_core::prelude::*;
use bourse_exchanges::prelude::*;
use std::rc::Rc;
use tracing::{info, warn};

const DEFAULT_PAIRS: [&str; 2] = ["BTCAUD", "ETHAUD"];

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cycles: Option<usize> = std::env::args()
        .nth(1)
        .map(|arg| arg.parse().context("cycle count must be a number"))
        .transpose()?;

    let mut config = BtcMarketsConfig::from_env()?;
    init_logging(config.verbose);
    if config.enabled_pairs.is_empty() {
        config = config.with_enabled_pairs(DEFAULT_PAIRS);
    }

    let aud_per_usd = std::env::var("AUD_PER_USD").unwrap_or_else(|_| "1.52".to_string());
    let rates = Rc::new(RateTable::with_rates([("AUD", Fixed::from_str_exact(&aud_per_usd)?)]));

    BourseRuntime::new().start(|| async move { poll(config, rates, cycles).await })?
}

async fn poll(config: BtcMarketsConfig, rates: Rc<RateTable>, cycles: Option<usize>) -> Result<()> {
    let exchange = BtcMarketsExchange::with_https(config)?;
    let board = Rc::new(PriceBoard::new());

    let (tx, rx) = flume::unbounded();
    let poller = Rc::new(exchange.poller(rates, board.clone())?.with_events(tx));
    let pairs = poller.pairs().len();

    let driver = {
        let poller = Rc::clone(&poller);
        monoio::spawn(async move { poller.run().await })
    };

    let mut seen = 0usize;
    while let Ok(event) = rx.recv_async().await {
        if let PollEvent::Failed { pair, error } = &event {
            warn!("⚠️ {} poll failed: {}", pair, error);
        }
        seen += 1;

        if cycles.is_some_and(|n| seen >= n * pairs) {
            exchange.set_enabled(false);
            break;
        }
    }

    driver.await?;

    for (symbol, ticker) in exchange.tickers().snapshot() {
        info!(
            "{} last {} bid {} ask {} spread {}",
            symbol,
            ticker.last_price,
            ticker.best_bid,
            ticker.best_ask,
            ticker.spread()
        );
    }
    for pair in poller.pairs() {
        for (key, entry) in board.quotes_for(&pair.base) {
            info!("{} {}/{} = {} @ {}", key.exchange, key.base, key.quote, entry.price, entry.updated);
        }
    }

    Ok(())
}
