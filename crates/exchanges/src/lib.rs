//! # Bourse Exchange Integrations
//!
//! Exchange adapters built on the monoio runtime. Currently ships the
//! BTC Markets REST adapter.
//!
//! ## Architecture
//!
//! - **Narrow collaborator traits** - transport, conversion and price sink are swappable
//! - **monoio-based HTTPS client** - rustls over monoio TCP, one connection per request
//! - **Signed requests** - HMAC-SHA512 over path, nonce and body
//! - **Fixed-point arithmetic** - exact decimal prices, integer exchange units on the wire
//! - **Background polling** - per-pair fan-out into a shared ticker cache

pub mod aggregation;
#[cfg(feature = "btcmarkets")]
pub mod btcmarkets;
pub mod conversion;
pub mod errors;
pub mod http;
pub mod traits;
pub mod types;

// Re-export main types
pub use aggregation::{PriceBoard, PriceEntry, PriceKey};
#[cfg(feature = "btcmarkets")]
pub use btcmarkets::{BtcMarketsConfig, BtcMarketsExchange, BtcMarketsRestClient, TickerPoller};
pub use conversion::{ConversionError, RateTable};
pub use errors::{ExchangeError, Result};
pub use http::{HttpRequest, HttpResponse, Method, MonoioHttpsClient};
pub use traits::{CurrencyConverter, Exchange, HttpTransport, PriceSink};
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregation::PriceBoard;
    #[cfg(feature = "btcmarkets")]
    pub use crate::btcmarkets::{
        BtcMarketsConfig, BtcMarketsExchange, BtcMarketsRestClient, OrderRequest, PollEvent,
        PollerState, TickerCache, TickerPoller,
    };
    pub use crate::conversion::{ConversionError, RateTable};
    pub use crate::errors::{ExchangeError, Result};
    pub use crate::http::{HttpRequest, HttpResponse, Method, MonoioHttpsClient};
    pub use crate::traits::{CurrencyConverter, Exchange, HttpTransport, PriceSink};
    pub use crate::types::*;
    pub use bourse_core::prelude::*;
}
