//! Ticker poller tests
//!
//! Cycles are driven with `poll_once` and observed through the event
//! channel, so no test depends on wall-clock sleeps except the run-loop
//! lifecycle test.

use bourse_core::Fixed;
use bourse_exchanges::aggregation::PriceBoard;
use bourse_exchanges::btcmarkets::{BtcMarketsExchange, PollEvent, PollerState, TickerPoller};
use bourse_exchanges::conversion::{ConversionError, RateTable};
use bourse_exchanges::errors::ExchangeError;
use bourse_exchanges::traits::{CurrencyConverter, Exchange, HttpTransport, PriceSink};
use bourse_tests::*;
use mockall::mock;
use std::rc::Rc;
use std::sync::atomic::Ordering;

mock! {
    pub Converter {}

    impl CurrencyConverter for Converter {
        fn convert(&self, amount: Fixed, from: &str, to: &str) -> Result<Fixed, ConversionError>;
    }
}

/// AUD at 1.5 per USD
fn aud_rates() -> Rc<RateTable> {
    Rc::new(RateTable::with_rates([("AUD", fixed("1.5"))]))
}

fn scripted_market() -> Rc<MockTransport> {
    let transport = MockTransport::new();
    transport.respond(
        "/market/BTC/AUD/tick",
        200,
        ticker_json("BTC", "AUD", "60000", "60030", "60015"),
    );
    transport.respond(
        "/market/ETH/AUD/tick",
        200,
        ticker_json("ETH", "AUD", "3000", "3003", "3001.5"),
    );
    transport
}

fn poller(
    transport: &Rc<MockTransport>,
    pairs: &[&str],
    converter: Rc<dyn CurrencyConverter>,
    sink: Rc<dyn PriceSink>,
) -> (TickerPoller, flume::Receiver<PollEvent>) {
    let client = Rc::new(client_over(market_config(pairs.iter().copied()), transport));
    let (tx, rx) = flume::unbounded();
    let poller = TickerPoller::new(client, converter, sink).unwrap().with_events(tx);
    (poller, rx)
}

async fn collect(rx: &flume::Receiver<PollEvent>, n: usize) -> Vec<PollEvent> {
    let mut events = Vec::with_capacity(n);
    for _ in 0..n {
        events.push(rx.recv_async().await.unwrap());
    }
    events
}

// ============================================================================
// CACHE UPDATES
// ============================================================================

#[cfg(test)]
mod cache {
    use super::*;

    #[monoio::test]
    async fn test_cycle_fills_exactly_the_enabled_pairs() {
        let transport = scripted_market();
        let sink = RecordingSink::new();
        let (poller, rx) = poller(&transport, &["BTCAUD", "ETHAUD"], aud_rates(), sink.clone());

        assert_eq!(poller.poll_once(), 2);
        let events = collect(&rx, 2).await;
        assert!(events.iter().all(|e| matches!(e, PollEvent::Updated { .. })));

        let cache = poller.cache();
        assert_eq!(cache.symbols(), vec!["BTCAUD", "ETHAUD"]);
        assert_eq!(cache.get("BTCAUD").unwrap().last_price, fixed("60015"));
        assert_eq!(cache.get("ETHAUD").unwrap().best_ask, fixed("3003"));
        assert_eq!(transport.call_count(), 2);
    }

    #[monoio::test]
    async fn test_later_cycle_overwrites_snapshot() {
        let transport = MockTransport::new();
        transport.respond("/tick", 200, ticker_json("BTC", "AUD", "1", "3", "2"));
        transport.respond("/tick", 200, ticker_json("BTC", "AUD", "4", "6", "5"));
        let (poller, rx) = poller(&transport, &["BTCAUD"], aud_rates(), RecordingSink::new());

        poller.poll_once();
        collect(&rx, 1).await;
        poller.poll_once();
        collect(&rx, 1).await;

        let cache = poller.cache();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("BTCAUD").unwrap().last_price, fixed("5"));
    }

    #[monoio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let transport = MockTransport::new();
        transport.respond("/market/BTC/AUD/tick", 200, ticker_json("BTC", "AUD", "1", "3", "2"));
        transport.respond("/market/ETH/AUD/tick", 500, "internal error");
        let sink = RecordingSink::new();
        let (poller, rx) = poller(&transport, &["BTCAUD", "ETHAUD"], aud_rates(), sink.clone());

        poller.poll_once();
        let events = collect(&rx, 2).await;

        let failed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PollEvent::Failed { pair, error } => Some((pair.clone(), error.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            failed,
            vec![("ETHAUD".to_string(), ExchangeError::Http(500, "internal error".to_string()))]
        );

        assert_eq!(poller.cache().symbols(), vec!["BTCAUD"]);
        assert!(sink.for_pair("ETH", "AUD").is_empty());
        assert_eq!(sink.for_pair("BTC", "AUD").len(), 1);
    }

    #[monoio::test]
    async fn test_malformed_ticker_is_reported_not_cached() {
        let transport = MockTransport::new();
        transport.respond("/market/BTC/AUD/tick", 200, r#"{"bestBid":"#);
        let (poller, rx) = poller(&transport, &["BTCAUD"], aud_rates(), RecordingSink::new());

        poller.poll_once();
        let events = collect(&rx, 1).await;

        match &events[0] {
            PollEvent::Failed { error, .. } => {
                assert!(matches!(error, ExchangeError::Serialization(_)));
                assert!(!error.is_transport());
            }
            other => panic!("expected a failed poll, got {other:?}"),
        }
        assert!(poller.cache().is_empty());
    }
}

// ============================================================================
// CONVERSION AND AGGREGATION
// ============================================================================

#[cfg(test)]
mod aggregation {
    use super::*;

    #[monoio::test]
    async fn test_sink_gets_raw_and_reporting_prices() {
        let transport = scripted_market();
        let sink = RecordingSink::new();
        let (poller, rx) = poller(&transport, &["BTCAUD"], aud_rates(), sink.clone());

        poller.poll_once();
        collect(&rx, 1).await;

        let records = sink.records();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].exchange, "BTC Markets");
        assert_eq!((records[0].base.as_str(), records[0].quote.as_str()), ("BTC", "AUD"));
        assert_eq!(records[0].price, fixed("60015"));
        assert_eq!(records[0].volume, Fixed::ZERO);

        assert_eq!((records[1].base.as_str(), records[1].quote.as_str()), ("BTC", "USD"));
        assert_eq!(records[1].price, fixed("40010"));
        assert_eq!(records[1].volume, Fixed::ZERO);
    }

    #[monoio::test]
    async fn test_converter_called_from_quote_to_reporting() {
        let transport = scripted_market();
        let mut converter = MockConverter::new();
        converter
            .expect_convert()
            .withf(|_, from, to| from.eq_ignore_ascii_case("AUD") && to.eq_ignore_ascii_case("USD"))
            .times(3)
            .returning(|amount, _, _| Ok(amount * Fixed::from_i64(2)));

        let sink = RecordingSink::new();
        let (poller, rx) = poller(&transport, &["BTCAUD"], Rc::new(converter), sink.clone());

        poller.poll_once();
        collect(&rx, 1).await;

        assert_eq!(sink.for_pair("BTC", "USD")[0].price, fixed("120030"));
    }

    #[monoio::test]
    async fn test_conversion_failure_is_tolerated() {
        let transport = scripted_market();
        let mut converter = MockConverter::new();
        converter
            .expect_convert()
            .returning(|_, from, _| Err(ConversionError::UnknownCurrency(from.to_string())));

        let sink = RecordingSink::new();
        let (poller, rx) = poller(&transport, &["BTCAUD"], Rc::new(converter), sink.clone());

        poller.poll_once();
        let events = collect(&rx, 1).await;

        assert!(matches!(events[0], PollEvent::Updated { .. }));
        assert!(poller.cache().get("BTCAUD").is_some());
        assert_eq!(sink.for_pair("BTC", "AUD")[0].price, fixed("60015"));
        assert_eq!(sink.for_pair("BTC", "USD")[0].price, Fixed::ZERO);
    }

    #[monoio::test]
    async fn test_price_board_as_sink() {
        let transport = scripted_market();
        let board = Rc::new(PriceBoard::new());
        let (poller, rx) = poller(&transport, &["BTCAUD", "ETHAUD"], aud_rates(), board.clone());

        poller.poll_once();
        collect(&rx, 2).await;

        assert_eq!(board.len(), 4);
        assert_eq!(board.get("BTC Markets", "ETH", "USD").unwrap().price, fixed("2001"));
        assert_eq!(board.quotes_for("BTC").len(), 2);
    }
}

// ============================================================================
// RUN LOOP LIFECYCLE
// ============================================================================

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[monoio::test]
    async fn test_disabled_client_never_polls() {
        let transport = scripted_market();
        let client = Rc::new(client_over(market_config(["BTCAUD"]), &transport));
        let poller = TickerPoller::new(Rc::clone(&client), aud_rates(), RecordingSink::new()).unwrap();

        // Another holder of the switch turns polling off before the first cycle
        client.enabled_flag().store(false, Ordering::Release);

        assert_eq!(poller.state(), PollerState::Idle);
        poller.run().await.unwrap();
        assert_eq!(poller.state(), PollerState::Stopped);
        assert_eq!(transport.call_count(), 0);
    }

    #[monoio::test]
    async fn test_run_only_once() {
        let transport = scripted_market();
        let config = market_config(["BTCAUD"]);
        let client = Rc::new(client_over(config, &transport));
        client.set_enabled(false);
        let poller = TickerPoller::new(client, aud_rates(), RecordingSink::new()).unwrap();

        poller.run().await.unwrap();
        assert_eq!(
            poller.run().await,
            Err(ExchangeError::Configuration("poller already started".to_string()))
        );
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_run_until_disabled() {
        let transport = scripted_market();
        let exchange =
            BtcMarketsExchange::new(market_config(["BTCAUD", "ETHAUD"]), transport.clone() as Rc<dyn HttpTransport>)
                .unwrap();
        let (tx, rx) = flume::unbounded();
        let poller = Rc::new(
            exchange
                .poller(aud_rates(), RecordingSink::new())
                .unwrap()
                .with_events(tx),
        );

        let driver = {
            let poller = Rc::clone(&poller);
            monoio::spawn(async move { poller.run().await })
        };

        collect(&rx, 2).await;
        assert_eq!(poller.state(), PollerState::Polling);

        exchange.set_enabled(false);
        driver.await.unwrap();

        assert_eq!(poller.state(), PollerState::Stopped);
        assert_eq!(exchange.tickers().symbols(), vec!["BTCAUD", "ETHAUD"]);
    }
}
