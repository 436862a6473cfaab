//! Identifier generation
//!
//! Client request ids let the exchange deduplicate retried order submissions,
//! so they must be unique per process and reasonably short.

use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::timing::nanos;

/// Alphabet accepted in exchange client ids (no `-`/`_` ambiguity)
const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Caller-chosen id attached to an order so the exchange can deduplicate it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientRequestId(String);

impl ClientRequestId {
    pub fn new() -> Self {
        Self(generate_id_with_prefix("brs"))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ClientRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 12 character id from the restricted alphabet
pub fn generate_id() -> String {
    nanoid!(12, &ID_ALPHABET)
}

/// `{prefix}-{millis}-{8 random chars}`
pub fn generate_id_with_prefix(prefix: &str) -> String {
    let millis = nanos() / 1_000_000;
    let short_id = nanoid!(8, &ID_ALPHABET);
    format!("{prefix}-{millis}-{short_id}")
}
