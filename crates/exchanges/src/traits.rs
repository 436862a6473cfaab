//! Seams between the adapters and their collaborators
//!
//! The HTTP transport, currency conversion and price aggregation are consumed
//! through these narrow traits so adapters can be driven by scripted
//! implementations in tests.

use crate::conversion::ConversionError;
use crate::errors::Result;
use crate::http::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use bourse_core::Fixed;

/// Sends one HTTP request and returns the raw response.
///
/// Implementations must not retry: callers rely on one call per request.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

pub trait CurrencyConverter {
    fn convert(
        &self,
        amount: Fixed,
        from: &str,
        to: &str,
    ) -> std::result::Result<Fixed, ConversionError>;
}

/// Fire-and-forget destination for observed prices
pub trait PriceSink {
    fn record(&self, exchange: &str, base: &str, quote: &str, price: Fixed, volume: Fixed);
}

/// Identity and switches common to every exchange adapter
pub trait Exchange {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Disabling stops new poll cycles; in-flight requests still complete.
    fn set_enabled(&self, enabled: bool);

    /// Trading fee in percent
    fn fee(&self) -> Fixed;
}
