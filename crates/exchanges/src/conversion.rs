//! Currency conversion
//!
//! `RateTable` holds USD-relative rates (units of a currency per 1 USD) and
//! converts through USD. Rates are replaced wholesale by whoever refreshes
//! them; readers always see a complete table.

use crate::traits::CurrencyConverter;
use bourse_core::Fixed;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("No rate for currency {0}")]
    UnknownCurrency(String),

    #[error("Rate for {0} is zero")]
    ZeroRate(String),
}

#[derive(Debug, Default)]
pub struct RateTable {
    rates: RwLock<HashMap<String, Fixed>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded from `(currency, units per USD)` pairs. USD is implied.
    pub fn with_rates<I, S>(rates: I) -> Self
    where
        I: IntoIterator<Item = (S, Fixed)>,
        S: Into<String>,
    {
        let table = Self::new();
        table.replace(rates);
        table
    }

    pub fn replace<I, S>(&self, rates: I)
    where
        I: IntoIterator<Item = (S, Fixed)>,
        S: Into<String>,
    {
        let mut fresh: HashMap<String, Fixed> = rates
            .into_iter()
            .map(|(code, rate)| (code.into().to_ascii_uppercase(), rate))
            .collect();
        fresh.insert("USD".to_string(), Fixed::ONE);

        match self.rates.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }

    pub fn rate(&self, currency: &str) -> Option<Fixed> {
        let code = currency.to_ascii_uppercase();
        if code == "USD" {
            return Some(Fixed::ONE);
        }
        match self.rates.read() {
            Ok(guard) => guard.get(&code).copied(),
            Err(poisoned) => poisoned.into_inner().get(&code).copied(),
        }
    }
}

impl CurrencyConverter for RateTable {
    fn convert(&self, amount: Fixed, from: &str, to: &str) -> Result<Fixed, ConversionError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(amount);
        }

        let from_rate = self
            .rate(from)
            .ok_or_else(|| ConversionError::UnknownCurrency(from.to_string()))?;
        let to_rate = self
            .rate(to)
            .ok_or_else(|| ConversionError::UnknownCurrency(to.to_string()))?;

        let in_usd = amount
            .checked_div(from_rate)
            .map_err(|_| ConversionError::ZeroRate(from.to_string()))?;
        Ok(in_usd * to_rate)
    }
}
