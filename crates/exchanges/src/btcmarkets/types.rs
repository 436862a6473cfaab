//! BTC Markets wire types
//!
//! Market data prices arrive as JSON numbers and decode straight into
//! `Fixed`. Order and account payloads carry integers in 1e-8 units.

use crate::errors::{ExchangeError, Result};
use crate::types::{CurrencyPair, OrderSide, OrderType};
use bourse_core::{ClientRequestId, Fixed, Timestamp};

use serde::{Deserialize, Serialize};

/// Latest market snapshot for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub best_bid: Fixed,
    pub best_ask: Fixed,
    pub last_price: Fixed,
    pub currency: String,
    pub instrument: String,
    /// Seconds since the epoch, as reported by the exchange
    pub timestamp: i64,
    #[serde(default, rename = "volume24h", skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<Fixed>,
}

impl Ticker {
    pub fn spread(&self) -> Fixed {
        self.best_ask - self.best_bid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "tid")]
    pub trade_id: i64,
    pub amount: Fixed,
    pub price: Fixed,
    pub date: i64,
}

/// `[price, volume]`
pub type PriceLevel = [Fixed; 2];

/// Order book exactly as the exchange sorted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub currency: String,
    pub instrument: String,
    pub timestamp: i64,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }
}

/// Body of `POST /order/create`
///
/// `currency` is the quote currency and `instrument` the base, following
/// the exchange's naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub currency: String,
    pub instrument: String,
    pub price: i64,
    pub volume: i64,
    #[serde(rename = "orderSide")]
    pub order_side: OrderSide,
    #[serde(rename = "ordertype")]
    pub order_type: OrderType,
    #[serde(rename = "clientRequestId")]
    pub client_request_id: String,
}

impl OrderRequest {
    /// Price and volume are already in exchange units. A fresh
    /// client request id is generated.
    pub fn new(
        currency: impl Into<String>,
        instrument: impl Into<String>,
        price: i64,
        volume: i64,
        order_side: OrderSide,
        order_type: OrderType,
    ) -> Self {
        Self {
            currency: currency.into(),
            instrument: instrument.into(),
            price,
            volume,
            order_side,
            order_type,
            client_request_id: ClientRequestId::new().to_string(),
        }
    }

    pub fn for_pair(
        pair: &CurrencyPair,
        price: Fixed,
        volume: Fixed,
        order_side: OrderSide,
        order_type: OrderType,
    ) -> Result<Self> {
        if volume.is_zero() || volume.is_negative() {
            return Err(ExchangeError::InvalidOrder(format!("volume must be positive, got {volume}")));
        }
        if price.is_negative() {
            return Err(ExchangeError::InvalidOrder(format!("price must not be negative, got {price}")));
        }

        Ok(Self::new(
            pair.quote.clone(),
            pair.base.clone(),
            price.to_exchange_units()?,
            volume.to_exchange_units()?,
            order_side,
            order_type,
        ))
    }

    pub fn with_client_request_id(mut self, id: impl Into<String>) -> Self {
        self.client_request_id = id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateResponse {
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub client_request_id: Option<String>,
}

/// Body of `/order/cancel` and `/order/detail`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderIdsRequest<'a> {
    #[serde(rename = "orderIds")]
    pub order_ids: &'a [i64],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Zero when the exchange leaves it out; never matches a real order.
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub responses: Option<Vec<CancelResult>>,
}

/// Body of `/order/open`, `/order/history` and `/order/trade/history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderQuery<'a> {
    pub currency: &'a str,
    pub instrument: &'a str,
    pub limit: i64,
    pub since: i64,
}

/// One fill against an order
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: i64,
    pub creation_time: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub volume: i64,
    #[serde(default)]
    pub fee: i64,
}

impl TradeRecord {
    pub fn price(&self) -> Fixed {
        Fixed::from_exchange_units(self.price)
    }

    pub fn volume(&self) -> Fixed {
        Fixed::from_exchange_units(self.volume)
    }

    pub fn fee(&self) -> Fixed {
        Fixed::from_exchange_units(self.fee)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: i64,
    pub currency: String,
    pub instrument: String,
    pub order_side: OrderSide,
    #[serde(rename = "ordertype")]
    pub order_type: OrderType,
    /// Milliseconds since the epoch
    pub creation_time: i64,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    pub price: i64,
    pub volume: i64,
    #[serde(default)]
    pub open_volume: i64,
    #[serde(default)]
    pub client_request_id: Option<String>,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}

impl OrderRecord {
    pub fn price(&self) -> Fixed {
        Fixed::from_exchange_units(self.price)
    }

    pub fn volume(&self) -> Fixed {
        Fixed::from_exchange_units(self.volume)
    }

    pub fn open_volume(&self) -> Fixed {
        Fixed::from_exchange_units(self.open_volume)
    }

    pub fn created_at(&self) -> Timestamp {
        Timestamp::from_millis(u64::try_from(self.creation_time).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersResponse {
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub orders: Option<Vec<OrderRecord>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesResponse {
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub trades: Option<Vec<TradeRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub balance: i64,
    #[serde(default)]
    pub pending_funds: i64,
    pub currency: String,
}

impl Balance {
    pub fn total(&self) -> Fixed {
        Fixed::from_exchange_units(self.balance)
    }

    /// Funds not held by open orders
    pub fn available(&self) -> Fixed {
        Fixed::from_exchange_units(self.balance - self.pending_funds)
    }
}
