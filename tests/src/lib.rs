//! Shared fixtures for the Bourse integration tests
//!
//! `MockTransport` stands in for the network: responses are scripted per
//! URL fragment and every request is recorded so tests can assert on exact
//! headers, bodies and call counts. `RecordingSink` captures what the poller
//! forwards to the price board.

use async_trait::async_trait;
use bourse_core::Fixed;
use bourse_exchanges::btcmarkets::{BtcMarketsConfig, BtcMarketsRestClient};
use bourse_exchanges::errors::{ExchangeError, Result};
use bourse_exchanges::http::{HttpRequest, HttpResponse};
use bourse_exchanges::traits::{HttpTransport, PriceSink};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Base64 of `abc123`
pub const TEST_SECRET_B64: &str = "YWJjMTIz";
pub const TEST_SECRET: &[u8] = b"abc123";
pub const TEST_API_KEY: &str = "test-key";
pub const MOCK_BASE_URL: &str = "https://mock.btcmarkets.test";

struct Route {
    fragment: String,
    responses: VecDeque<Result<HttpResponse>>,
}

/// Scripted transport.
///
/// The first route whose fragment appears in the request URL answers. Its
/// responses are served in order and the last one repeats.
#[derive(Default)]
pub struct MockTransport {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn push(&self, fragment: &str, response: Result<HttpResponse>) {
        let mut routes = self.routes.borrow_mut();
        match routes.iter_mut().find(|r| r.fragment == fragment) {
            Some(route) => route.responses.push_back(response),
            None => routes.push(Route {
                fragment: fragment.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
    }

    pub fn respond(&self, fragment: &str, status: u16, body: impl Into<String>) {
        self.push(fragment, Ok(HttpResponse::new(status, body.into())));
    }

    pub fn fail(&self, fragment: &str, error: ExchangeError) {
        self.push(fragment, Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.borrow_mut().push(request);

        let mut routes = self.routes.borrow_mut();
        let route = routes
            .iter_mut()
            .find(|r| url.contains(&r.fragment))
            .ok_or_else(|| ExchangeError::Network(format!("no scripted response for {url}")))?;

        if route.responses.len() > 1 {
            route
                .responses
                .pop_front()
                .unwrap_or_else(|| Err(ExchangeError::Network("route drained".to_string())))
        } else {
            route
                .responses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ExchangeError::Network("route drained".to_string())))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub exchange: String,
    pub base: String,
    pub quote: String,
    pub price: Fixed,
    pub volume: Fixed,
}

#[derive(Default)]
pub struct RecordingSink {
    records: RefCell<Vec<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn records(&self) -> Vec<Recorded> {
        self.records.borrow().clone()
    }

    /// Records for one base/quote, oldest first
    pub fn for_pair(&self, base: &str, quote: &str) -> Vec<Recorded> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.base == base && r.quote == quote)
            .cloned()
            .collect()
    }
}

impl PriceSink for RecordingSink {
    fn record(&self, exchange: &str, base: &str, quote: &str, price: Fixed, volume: Fixed) {
        self.records.borrow_mut().push(Recorded {
            exchange: exchange.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
            price,
            volume,
        });
    }
}

pub fn fixed(s: &str) -> Fixed {
    Fixed::from_str_exact(s).expect("test literal is a valid decimal")
}

/// Config pointed at the mock base URL, with the test credentials
pub fn authenticated_config() -> BtcMarketsConfig {
    BtcMarketsConfig::default()
        .with_base_url(MOCK_BASE_URL)
        .with_credentials(TEST_API_KEY, TEST_SECRET_B64)
}

pub fn market_config<I, S>(pairs: I) -> BtcMarketsConfig
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    BtcMarketsConfig::default()
        .with_base_url(MOCK_BASE_URL)
        .with_enabled_pairs(pairs)
        .with_polling_delay(1)
}

pub fn client_over(config: BtcMarketsConfig, transport: &Rc<MockTransport>) -> BtcMarketsRestClient {
    let transport: Rc<dyn HttpTransport> = transport.clone();
    BtcMarketsRestClient::new(config, transport).expect("mock config is valid")
}

/// Ticker JSON as the exchange sends it
pub fn ticker_json(instrument: &str, currency: &str, bid: &str, ask: &str, last: &str) -> String {
    format!(
        r#"{{"bestBid":{bid},"bestAsk":{ask},"lastPrice":{last},"currency":"{currency}","instrument":"{instrument}","timestamp":1700000000,"volume24h":12.5}}"#
    )
}
