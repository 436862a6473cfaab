//! # Bourse Core
//!
//! Runtime and value types shared by the exchange adapters.
//!
//! - **monoio runtime** - single-threaded async, timer enabled for pollers
//! - **Wall-clock timing** - nanosecond timestamps feed request nonces
//! - **Fixed-point arithmetic** - exact decimal prices and volumes
//! - **tracing logging** - one subscriber, shared log-line macros
//! - **nanoid ids** - client request ids for order deduplication

pub mod fixed;
pub mod id_gen;
pub mod logging;
pub mod runtime;
pub mod timing;

pub use fixed::{Fixed, FixedError};
pub use id_gen::{ClientRequestId, generate_id, generate_id_with_prefix};
pub use logging::init_logging;
pub use runtime::{BourseRuntime, RuntimeConfig};
pub use timing::{PerfTimer, Timestamp, nanos};

pub mod prelude {
    pub use crate::fixed::{Fixed, FixedError};
    pub use crate::id_gen::{ClientRequestId, generate_id, generate_id_with_prefix};
    pub use crate::logging::init_logging;
    pub use crate::runtime::{BourseRuntime, RuntimeConfig};
    pub use crate::timing::{PerfTimer, Timestamp, nanos};

    pub use chrono::{DateTime, Utc};
    pub use monoio;
    pub use serde::{Deserialize, Serialize};
}
