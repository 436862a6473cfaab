//! Logging setup and shared log-line macros
//!
//! Everything logs through `tracing`. `init_logging` installs a single fmt
//! subscriber; `RUST_LOG` overrides the default level.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
///
/// `verbose` lowers the default filter from `info` to `debug`.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let default_level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_line_number(true)
            .finish();

        // Another subscriber may already be installed, e.g. by a test harness
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!("📝 tracing initialised (default level {})", default_level);
        }
    });
}

#[macro_export]
macro_rules! log_order {
    ($action:expr, $order_id:expr, $symbol:expr) => {
        tracing::info!("📋 ORDER {}: {} ({})", $action, $order_id, $symbol);
    };
}

#[macro_export]
macro_rules! log_ticker {
    ($exchange:expr, $pair:expr, $last:expr, $bid:expr, $ask:expr) => {
        tracing::info!(
            "📈 {} {}: Last {} Bid {} Ask {}",
            $exchange,
            $pair,
            $last,
            $bid,
            $ask
        );
    };
}

#[macro_export]
macro_rules! log_error {
    ($operation:expr, $error:expr) => {
        tracing::error!("❌ {} failed: {}", $operation, $error);
    };
}
