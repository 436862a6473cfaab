//! BTC Markets REST client
//!
//! Market data goes through plain GETs. Everything under `/order` and
//! `/account` is signed (see [`super::auth`]) and decoded from the
//! exchange's `success`/`errorMessage` envelope. There is no retry and no
//! backoff: one method call is exactly one transport call.

use crate::btcmarkets::auth::{Credentials, generate_nonce};
use crate::btcmarkets::config::BtcMarketsConfig;
use crate::btcmarkets::types::*;
use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, Method, MonoioHttpsClient};
use crate::traits::HttpTransport;
use crate::types::CurrencyPair;
use bourse_core::PerfTimer;

use serde::de::{DeserializeOwned, IgnoredAny};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use url::Url;

pub const ORDER_CREATE: &str = "/order/create";
pub const ORDER_CANCEL: &str = "/order/cancel";
pub const ORDER_HISTORY: &str = "/order/history";
pub const ORDER_OPEN: &str = "/order/open";
pub const ORDER_TRADE_HISTORY: &str = "/order/trade/history";
pub const ORDER_DETAIL: &str = "/order/detail";
pub const ACCOUNT_BALANCE: &str = "/account/balance";

/// `/market/{base}/{quote}/{endpoint}`
pub fn market_path(pair: &CurrencyPair, endpoint: &str) -> String {
    format!("/market/{}/{}/{}", pair.base, pair.quote, endpoint)
}

/// Trades path; an empty `since` leaves the query string off entirely.
pub fn trades_path(pair: &CurrencyPair, since: &str) -> String {
    let path = market_path(pair, "trades");
    if since.is_empty() {
        path
    } else {
        format!("{path}?since={since}")
    }
}

pub struct BtcMarketsRestClient {
    config: BtcMarketsConfig,
    base_url: Url,
    transport: Rc<dyn HttpTransport>,
    credentials: Option<Credentials>,
    enabled: Arc<AtomicBool>,
}

impl BtcMarketsRestClient {
    /// Build a client over any transport.
    ///
    /// Credentials in the config are applied through [`Self::set_api_keys`];
    /// an undecodable secret leaves the client disabled rather than failing
    /// construction.
    pub fn new(config: BtcMarketsConfig, transport: Rc<dyn HttpTransport>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let enabled = Arc::new(AtomicBool::new(config.enabled));

        let mut client = Self {
            config,
            base_url,
            transport,
            credentials: None,
            enabled,
        };

        if !client.config.api_key.is_empty() || !client.config.api_secret.is_empty() {
            let api_key = client.config.api_key.clone();
            let api_secret = client.config.api_secret.clone();
            if let Err(e) = client.set_api_keys(&api_key, &api_secret) {
                error!("❌ {}: {}", client.config.name, e);
            }
        }

        info!("🔗 {} REST client created", client.config.name);
        info!("   Base URL: {}", client.base_url);
        info!("   Authenticated: {}", client.has_credentials());

        Ok(client)
    }

    /// Client over the built-in HTTPS transport
    pub fn with_https(config: BtcMarketsConfig) -> Result<Self> {
        let transport: Rc<dyn HttpTransport> = Rc::new(MonoioHttpsClient::new()?);
        Self::new(config, transport)
    }

    pub fn config(&self) -> &BtcMarketsConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Shared switch, for whoever needs to stop polling from elsewhere
    pub fn enabled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Store the API key and decode the secret.
    ///
    /// Does nothing when authenticated support is off. A secret that is not
    /// valid base64 disables the client for good and drops any previously
    /// stored credentials.
    pub fn set_api_keys(&mut self, api_key: &str, encoded_secret: &str) -> Result<()> {
        if !self.config.authenticated_api_support {
            debug!("{} authenticated API support is off, ignoring keys", self.config.name);
            return Ok(());
        }

        match Credentials::from_encoded(api_key, encoded_secret) {
            Ok(credentials) => {
                self.credentials = Some(credentials);
                Ok(())
            }
            Err(e) => {
                error!("❌ {} unable to decode secret key", self.config.name);
                self.credentials = None;
                self.set_enabled(false);
                Err(e)
            }
        }
    }

    // Market data

    pub async fn ticker(&self, pair: &CurrencyPair) -> Result<Ticker> {
        self.get_request(&market_path(pair, "tick")).await
    }

    pub async fn order_book(&self, pair: &CurrencyPair) -> Result<OrderBook> {
        self.get_request(&market_path(pair, "orderbook")).await
    }

    pub async fn trades(&self, pair: &CurrencyPair, since: &str) -> Result<Vec<Trade>> {
        self.get_request(&trades_path(pair, since)).await
    }

    // Orders

    /// Place an order and return the exchange's order id.
    ///
    /// A well-formed response with `success: false` is `OrderRejected`.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<i64> {
        let body = serde_json::to_string(order)?;
        let resp: OrderCreateResponse = self.signed_request(Method::Post, ORDER_CREATE, Some(body)).await?;

        if !resp.success {
            let message = resp.error_message.unwrap_or_default();
            bourse_core::log_error!(format!("{} place order", self.config.name), &message);
            return Err(ExchangeError::OrderRejected(message));
        }

        let id = resp
            .id
            .ok_or_else(|| ExchangeError::Serialization("order accepted without an id".to_string()))?;
        bourse_core::log_order!("PLACED", id, format!("{}/{}", order.instrument, order.currency));
        Ok(id)
    }

    /// Cancel a batch of orders.
    ///
    /// Returns `Ok(true)` only when every requested id was cancelled. An
    /// accepted batch where some orders survived is `PartialCancelFailure`.
    pub async fn cancel_orders(&self, order_ids: &[i64]) -> Result<bool> {
        let body = serde_json::to_string(&OrderIdsRequest { order_ids })?;
        let resp: CancelResponse = self.signed_request(Method::Post, ORDER_CANCEL, Some(body)).await?;

        if !resp.success {
            let message = resp.error_message.unwrap_or_default();
            bourse_core::log_error!(format!("{} cancel orders", self.config.name), &message);
            return Err(ExchangeError::CancelRejected(message));
        }

        let mut confirmed = HashSet::new();
        for item in resp.responses.unwrap_or_default() {
            if item.success {
                bourse_core::log_order!("CANCELLED", item.id, self.config.name);
                confirmed.insert(item.id);
            } else {
                warn!(
                    "{} unable to cancel order {}: {}",
                    self.config.name,
                    item.id,
                    item.error_message.unwrap_or_default()
                );
            }
        }

        // Only confirmations for ids in this batch count, each at most once
        let requested: HashSet<i64> = order_ids.iter().copied().collect();
        let cancelled = requested.iter().filter(|id| confirmed.contains(id)).count();

        if cancelled == requested.len() {
            Ok(true)
        } else {
            Err(ExchangeError::PartialCancelFailure {
                requested: requested.len(),
                cancelled,
            })
        }
    }

    /// Open orders, or order history when `historic` is set
    pub async fn list_orders(
        &self,
        currency: &str,
        instrument: &str,
        limit: i64,
        since: i64,
        historic: bool,
    ) -> Result<Vec<OrderRecord>> {
        let path = if historic { ORDER_HISTORY } else { ORDER_OPEN };
        let query = OrderQuery {
            currency,
            instrument,
            limit,
            since,
        };

        let result = async {
            let body = serde_json::to_string(&query)?;
            let resp: OrdersResponse = self.signed_request(Method::Post, path, Some(body)).await?;
            envelope(resp.success, resp.error_message)?;
            Ok::<_, ExchangeError>(resp.orders.unwrap_or_default())
        }
        .await;
        self.logged("list orders", result)
    }

    pub async fn order_detail(&self, order_ids: &[i64]) -> Result<Vec<OrderRecord>> {
        let result = async {
            let body = serde_json::to_string(&OrderIdsRequest { order_ids })?;
            let resp: OrdersResponse = self.signed_request(Method::Post, ORDER_DETAIL, Some(body)).await?;
            envelope(resp.success, resp.error_message)?;
            Ok::<_, ExchangeError>(resp.orders.unwrap_or_default())
        }
        .await;
        self.logged("order detail", result)
    }

    /// Fills on the account's own orders
    pub async fn trade_history(
        &self,
        currency: &str,
        instrument: &str,
        limit: i64,
        since: i64,
    ) -> Result<Vec<TradeRecord>> {
        let query = OrderQuery {
            currency,
            instrument,
            limit,
            since,
        };

        let result = async {
            let body = serde_json::to_string(&query)?;
            let resp: TradesResponse = self.signed_request(Method::Post, ORDER_TRADE_HISTORY, Some(body)).await?;
            envelope(resp.success, resp.error_message)?;
            Ok::<_, ExchangeError>(resp.trades.unwrap_or_default())
        }
        .await;
        self.logged("trade history", result)
    }

    pub async fn account_balance(&self) -> Result<Vec<Balance>> {
        let result = self.signed_request(Method::Get, ACCOUNT_BALANCE, None).await;
        self.logged("account balance", result)
    }

    /// Signed request whose response is decoded and then discarded.
    ///
    /// Decode errors still surface.
    pub async fn signed_request_discard(&self, method: Method, path: &str, body: Option<String>) -> Result<()> {
        let _: IgnoredAny = self.signed_request(method, path, body).await?;
        Ok(())
    }

    /// Base URL with `path` appended verbatim, so a base with its own path
    /// prefix keeps it.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    fn logged<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("⚠️ {} {} failed: {}", self.config.name, operation, e);
        }
        result
    }

    /// Unauthenticated GET. Anything but 200 is an `Http` error.
    async fn get_request<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let timer = PerfTimer::start(format!("btcmarkets_get_{path}"));
        let url = self.endpoint(path)?;

        debug!("📡 GET {}", url);

        let request = HttpRequest::get(url.as_str()).with_header("Accept", "application/json");
        let response = self.transport.send(request).await?;

        timer.log_elapsed();

        if response.status != 200 {
            return Err(ExchangeError::Http(response.status, response.body_text().into_owned()));
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            ExchangeError::Serialization(format!("{e}: {}", response.body_text()))
        })
    }

    /// Signed request for `/order` and `/account` endpoints.
    ///
    /// The body is decoded whatever the HTTP status, since the exchange
    /// reports refusals inside the JSON envelope.
    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T> {
        if !self.is_enabled() {
            return Err(ExchangeError::ClientDisabled(self.config.name.clone()));
        }
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::MissingCredentials(format!("{} has no API keys", self.config.name))
        })?;

        let timer = PerfTimer::start(format!("btcmarkets_signed_{path}"));

        let nonce = generate_nonce();
        let signature = credentials.sign(path, &nonce, body.as_deref())?;
        let url = self.endpoint(path)?;

        if self.config.verbose {
            info!(
                "Sending {} request to URL {} with params {:?}",
                method,
                url,
                crate::btcmarkets::auth::canonical_string(path, &nonce, body.as_deref())
            );
        } else {
            debug!("📡 {} {} (signed)", method, url);
        }

        let mut request = HttpRequest::new(method, url.as_str()).with_body(body.map(String::into_bytes));
        request.headers = credentials.headers(&nonce, &signature);

        let response = self.transport.send(request).await?;

        timer.log_elapsed();

        if self.config.verbose {
            info!("Received raw: {}", response.body_text());
        }

        Ok(serde_json::from_slice(&response.body)?)
    }
}

/// Turn a `success: false` envelope into `RequestRejected`.
fn envelope(success: bool, error_message: Option<String>) -> Result<()> {
    if success {
        Ok(())
    } else {
        Err(ExchangeError::RequestRejected(error_message.unwrap_or_default()))
    }
}
