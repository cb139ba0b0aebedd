//! Logging initialisation.
//!
//! Everything in this crate logs through `tracing` macros. Applications (and
//! the `radixroute` binary) install a subscriber once at startup:
//!
//! ```no_run
//! use radixroute::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_env()).expect("logging already initialised");
//! ```
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `RADIXROUTE_LOG_LEVEL` | `trace`/`debug`/`info`/`warn`/`error` | `info` |
//! | `RADIXROUTE_LOG_FORMAT` | `json`/`pretty` | `json` |
//!
//! `RUST_LOG`, when set, takes precedence over `RADIXROUTE_LOG_LEVEL`.

use anyhow::{anyhow, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("RADIXROUTE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("RADIXROUTE_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
        }
    }

    /// Verbose, human-readable configuration for local runs
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_level_fallback() {
        let config = LogConfig {
            log_level: "loud".to_string(),
            format: LogFormat::Json,
        };
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(LogConfig::default_dev().level(), Level::DEBUG);
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
