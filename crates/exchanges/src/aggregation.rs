//! In-process price board
//!
//! Every adapter reports what it sees here, keyed by exchange and pair. Only
//! the latest report per key is kept.

use crate::traits::PriceSink;
use bourse_core::{Fixed, Timestamp};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceKey {
    pub exchange: String,
    pub base: String,
    pub quote: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEntry {
    pub price: Fixed,
    pub volume: Fixed,
    pub updated: Timestamp,
}

/// Shared board of the last price per (exchange, base, quote). Clones share state.
#[derive(Debug, Clone, Default)]
pub struct PriceBoard {
    entries: Arc<Mutex<HashMap<PriceKey, PriceEntry>>>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PriceKey, PriceEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, exchange: &str, base: &str, quote: &str) -> Option<PriceEntry> {
        let key = PriceKey {
            exchange: exchange.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        };
        self.lock().get(&key).copied()
    }

    /// Every quote currency reported for `base` on any exchange
    pub fn quotes_for(&self, base: &str) -> Vec<(PriceKey, PriceEntry)> {
        let mut quotes: Vec<_> = self
            .lock()
            .iter()
            .filter(|(key, _)| key.base == base)
            .map(|(key, entry)| (key.clone(), *entry))
            .collect();
        quotes.sort_by(|a, b| a.0.cmp(&b.0));
        quotes
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl PriceSink for PriceBoard {
    fn record(&self, exchange: &str, base: &str, quote: &str, price: Fixed, volume: Fixed) {
        let key = PriceKey {
            exchange: exchange.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        };
        let entry = PriceEntry {
            price,
            volume,
            updated: Timestamp::now(),
        };
        self.lock().insert(key, entry);
    }
}
