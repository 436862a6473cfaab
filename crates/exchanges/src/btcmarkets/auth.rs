//! BTC Markets request signing
//!
//! Authenticated requests are signed with HMAC-SHA512 over
//! `path + "\n" + nonce + "\n" + body`, keyed by the decoded API secret.
//! A request without a body still ends with the second newline.
//! The nonce is the first 13 digits of the wall clock in nanoseconds.

use crate::errors::{ExchangeError, Result};
use bourse_core::nanos;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;

type HmacSha512 = Hmac<Sha512>;

pub const NONCE_LEN: usize = 13;

pub const HEADER_API_KEY: &str = "apikey";
pub const HEADER_TIMESTAMP: &str = "timestamp";
pub const HEADER_SIGNATURE: &str = "signature";

/// API key plus the raw (already decoded) secret
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret: Vec<u8>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            api_key: api_key.into(),
            secret,
        }
    }

    /// Decode a base64 secret as issued by the exchange.
    pub fn from_encoded(api_key: impl Into<String>, encoded_secret: &str) -> Result<Self> {
        let secret = STANDARD
            .decode(encoded_secret.trim())
            .map_err(|e| ExchangeError::Configuration(format!("unable to decode API secret: {e}")))?;
        Ok(Self::new(api_key, secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn sign(&self, path: &str, nonce: &str, body: Option<&str>) -> Result<String> {
        sign(&self.secret, path, nonce, body)
    }

    /// Full header set for one authenticated request
    pub fn headers(&self, nonce: &str, signature: &str) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Accept-Charset".to_string(), "UTF-8".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            (HEADER_API_KEY.to_string(), self.api_key.clone()),
            (HEADER_TIMESTAMP.to_string(), nonce.to_string()),
            (HEADER_SIGNATURE.to_string(), signature.to_string()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

pub fn canonical_string(path: &str, nonce: &str, body: Option<&str>) -> String {
    match body {
        Some(body) => format!("{path}\n{nonce}\n{body}"),
        None => format!("{path}\n{nonce}\n"),
    }
}

/// Base64 HMAC-SHA512 of the canonical string
pub fn sign(secret: &[u8], path: &str, nonce: &str, body: Option<&str>) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret)
        .map_err(|e| ExchangeError::Signing(format!("HMAC setup failed: {e}")))?;

    mac.update(canonical_string(path, nonce, body).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Leading 13 digits of a nanosecond clock reading, zero padded if shorter
pub fn nonce_from_nanos(nanos: u64) -> String {
    let digits = nanos.to_string();
    if digits.len() >= NONCE_LEN {
        digits[..NONCE_LEN].to_string()
    } else {
        format!("{digits:0>width$}", width = NONCE_LEN)
    }
}

pub fn generate_nonce() -> String {
    nonce_from_nanos(nanos())
}
