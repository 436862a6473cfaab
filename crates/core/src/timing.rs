//! Wall-clock timestamps and request timing
//!
//! Exchange nonces are derived from the nanosecond wall clock, so everything
//! here reads `SystemTime` rather than a monotonic source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    pub nanos: u64,
}

impl Timestamp {
    pub fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Exchange payloads carry second or millisecond epochs; both end up here.
    pub fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis.saturating_mul(1_000_000),
        }
    }

    pub fn now() -> Self {
        Self { nanos: nanos() }
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = (self.nanos / 1_000_000_000) as i64;
        let subsec = (self.nanos % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, subsec).unwrap_or_else(Utc::now)
    }

    pub fn elapsed_nanos(&self) -> u64 {
        nanos().saturating_sub(self.nanos)
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.elapsed_nanos() / 1_000
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed_nanos() / 1_000_000
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp().max(0) as u64;
        Self {
            nanos: secs * 1_000_000_000 + dt.timestamp_subsec_nanos() as u64,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// A clock set before the epoch reads as zero.
#[inline]
pub fn nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Scoped timer that reports its lifetime at debug level on drop
pub struct PerfTimer {
    start: Timestamp,
    name: String,
}

impl PerfTimer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Timestamp::now(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed_micros()
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.start.elapsed_millis()
    }

    pub fn log_elapsed(&self) {
        let micros = self.elapsed_micros();
        if micros < 1000 {
            tracing::debug!("⏱️  {} took {}μs", self.name, micros);
        } else {
            tracing::debug!("⏱️  {} took {:.3}ms", self.name, micros as f64 / 1000.0);
        }
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        self.log_elapsed();
    }
}

/// Time a block, logging on scope exit
#[macro_export]
macro_rules! time_it {
    ($name:expr, $code:block) => {{
        let _timer = $crate::timing::PerfTimer::start($name);
        $code
    }};
}
