//! Exchange-neutral types
//!
//! Currency pairs use the fixed-width convention: a 6 character symbol whose
//! first 3 characters are the base currency and last 3 the quote currency.

use crate::errors::{ExchangeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a currency code inside a pair symbol
pub const CURRENCY_CODE_LEN: usize = 3;

/// A tradable base/quote combination such as BTC/AUD
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Result<Self> {
        Self::parse(&format!("{base}{quote}"))
    }

    /// Parse a 6 character symbol such as `BTCAUD`.
    ///
    /// Anything other than exactly six ASCII letters is rejected; there is no
    /// delimiter-based fallback.
    pub fn parse(symbol: &str) -> Result<Self> {
        let symbol = symbol.trim();
        if symbol.len() != CURRENCY_CODE_LEN * 2 || !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ExchangeError::InvalidSymbol(format!(
                "{symbol:?} is not a 6 letter base/quote symbol"
            )));
        }

        let upper = symbol.to_ascii_uppercase();
        let (base, quote) = upper.split_at(CURRENCY_CODE_LEN);
        Ok(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    /// The concatenated symbol, e.g. `BTCAUD`
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Bid,
    Ask,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Bid => write!(f, "Bid"),
            OrderSide::Ask => write!(f, "Ask"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "Limit"),
            OrderType::Market => write!(f, "Market"),
        }
    }
}
