//! Tracing subscriber setup for binaries and tests embedding recourier.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "RECOURIER_LOG";

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `recourier=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Builds the filter, preferring `RECOURIER_LOG` over the configured level.
///
/// # Errors
///
/// Returns `ConfigurationError` if the directive cannot be parsed.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigurationError> {
    let directive = std::env::var(LOG_ENV).unwrap_or_else(|_| config.level.clone());
    EnvFilter::try_new(&directive).map_err(|e| {
        ConfigurationError::new(format!("invalid log filter '{directive}': {e}")).with_field("level")
    })
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns `ConfigurationError` for an invalid filter or if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigurationError> {
    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    result.map_err(|e| ConfigurationError::new(format!("failed to install subscriber: {e}")))
}
