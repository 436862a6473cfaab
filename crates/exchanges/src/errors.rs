//! Exchange error taxonomy
//!
//! Transport and decode failures are kept apart from failures the exchange
//! reports inside a successful response, so callers can tell "the request
//! never landed" from "the exchange said no".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// Bad configuration or undecodable credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The client was disabled and will not issue authenticated calls
    #[error("Client disabled: {0}")]
    ClientDisabled(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body was not the JSON shape we asked for
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Cancel rejected: {0}")]
    CancelRejected(String),

    /// The batch was accepted but not every order was cancelled
    #[error("Cancelled {cancelled} of {requested} orders")]
    PartialCancelFailure { requested: usize, cancelled: usize },

    #[error("Request rejected: {0}")]
    RequestRejected(String),
}

impl ExchangeError {
    /// Network and HTTP failures, as opposed to business or decode failures
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http(..))
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ExchangeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<bourse_core::FixedError> for ExchangeError {
    fn from(err: bourse_core::FixedError) -> Self {
        Self::InvalidOrder(err.to_string())
    }
}
