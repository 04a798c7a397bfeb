//! # MSP Telemetry
//!
//! Observability for the identity cache layer.
//!
//! ## Components
//!
//! - **Logging**: global `tracing` subscriber with `EnvFilter` and plain or
//!   JSON output
//! - **Metrics**: Prometheus collectors fed by [`PrometheusRecorder`], which
//!   plugs into `msp_cache` as its `MetricsRecorder`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use msp_telemetry::{init_telemetry, PrometheusRecorder, TelemetryConfig};
//! use std::sync::Arc;
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! let msp = CachedMsp::builder(x509_msp)
//!     .metrics(Arc::new(PrometheusRecorder))
//!     .build()?;
//!
//! // Scrape endpoint body
//! let body = msp_telemetry::encode_metrics()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MSP_SERVICE_NAME` | `msp-cache` | Service name in logs |
//! | `MSP_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `MSP_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `MSP_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, PrometheusRecorder, ALIAS_COMMITS, ALIAS_REGISTRY_CLEARS,
    ALIAS_SUBMIT_WAIT, CACHE_EVICTIONS, CACHE_LOOKUPS, CACHE_RESETS, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install logging.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
