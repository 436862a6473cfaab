//! monoio runtime wrapper
//!
//! Pollers sleep between cycles, so the timer is enabled by default.

use monoio::{FusionDriver, RuntimeBuilder};
use tracing::info;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub thread_name: String,
    pub enable_timer: bool,
    /// io_uring submission queue size, ignored by the legacy driver
    pub entries: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: "bourse-main".to_string(),
            enable_timer: true,
            entries: 256,
        }
    }
}

/// Single-threaded runtime that drives the exchange adapters
pub struct BourseRuntime {
    config: RuntimeConfig,
}

impl BourseRuntime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Build a runtime and drive `f()` to completion on the current thread.
    pub fn start<F, Fut>(self, f: F) -> std::io::Result<Fut::Output>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future,
    {
        info!(
            "▶️  Starting runtime on {} (timer: {})",
            self.config.thread_name, self.config.enable_timer
        );

        let builder = RuntimeBuilder::<FusionDriver>::new().with_entries(self.config.entries);
        let output = if self.config.enable_timer {
            builder.enable_timer().build()?.block_on(f())
        } else {
            builder.build()?.block_on(f())
        };

        info!("⏹️  Runtime stopped");
        Ok(output)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for BourseRuntime {
    fn default() -> Self {
        Self::new()
    }
}
