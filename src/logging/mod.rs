//! Logging
//!
//! Installs the global `tracing` subscriber: an env filter seeded from the
//! configured level (`RUST_LOG` wins when set) and a JSON or text formatter.

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter {directive:?}: {message}")]
    InvalidFilter { directive: String, message: String },

    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Build the env filter for `config`
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidFilter {
        directive: config.level.clone(),
        message: e.to_string(),
    })
}

/// Initialize logging with the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = build_filter(config)?;

    let result = match config.format {
        LogFormat::Json => Registry::default()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    result.map_err(|e| LoggingError::InitError(e.to_string()))?;

    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}
