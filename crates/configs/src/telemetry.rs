//! Global tracing subscriber.

use tracing_subscriber::EnvFilter;

use crate::settings::{ConfigError, LogFormat, LogSettings};

/// Installs the process-wide subscriber. `RUST_LOG` takes precedence over
/// `log.level`. Fails if a subscriber is already installed.
pub fn init_tracing(log: &LogSettings) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .map_err(|e| ConfigError::Invalid(format!("log.level: {e}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match log.format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Pretty => builder.with_target(true).try_init(),
    };
    result.map_err(|e| ConfigError::Telemetry(e.to_string()))
}
