//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber: an `EnvFilter` built from the
//! configured directive, plus a plain or JSON `fmt` layer. JSON lines carry
//! target, thread id, file and line so a log shipper can index them.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the filter for `config`.
///
/// Only `config.log_level` is consulted. `RUST_LOG` is honoured through
/// [`TelemetryConfig::from_env`], below `MSP_LOG_LEVEL`.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log filter {:?}: {}", config.log_level, e)))
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    let result = match (config.console_output, config.json_logs) {
        (false, _) => tracing_subscriber::registry().with(filter).try_init(),
        (true, true) => {
            // JSON output for containers/production
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
        (true, false) => {
            // Pretty output for development
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}
