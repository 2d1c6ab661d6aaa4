//! Structured logging bootstrap.
//!
//! Installs a global `tracing` subscriber from [`LoggingConfig`]. The
//! `RUST_LOG` environment variable, when set, overrides the configured
//! level so deployments can raise verbosity without a config change.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Result, TransportError};

/// Initialize the global tracing subscriber.
///
/// # Errors
/// Returns `TransportError::ConfigError` if a subscriber is already
/// installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| TransportError::ConfigError(format!("Failed to init logging: {e}")))
}
