//! # VG Telemetry
//!
//! Structured logging and Prometheus metrics for the vanish-gate policy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vg_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     vg_telemetry::record_decision("accept");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VG_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `VG_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `VG_SERVICE_NAME` | `vanish-gate` | Service name |
//!
//! Logs always go to stderr.
//!
//! ## Metrics
//!
//! The plugin has no scrape endpoint. Counters accumulate in the process-wide
//! registry and [`encode_metrics`] renders them once, logged at `info` when
//! the host closes the connection.

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_decision, record_malformed_line, record_persistence_failure,
    record_persistence_failures, record_vanish_request, register_metrics, set_cache_members,
    CACHE_MEMBERS, DECISIONS, MALFORMED_LINES, PERSISTENCE_FAILURES, REGISTRY, VANISH_REQUESTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Registers metrics, then installs the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
