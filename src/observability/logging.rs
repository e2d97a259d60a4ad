//! Structured logging.

use crate::config::{LogFormat, LoggingSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Env var holding a filter directive, checked before `RUST_LOG`.
pub const LOG_FILTER_ENV: &str = "CATALOG_BATCH_LOG";

/// Logging configuration resolved from settings, env and CLI flags.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Optional log file.
    pub file: Option<PathBuf>,
    /// Event filter.
    pub filter: EnvFilter,
}

impl LoggingConfig {
    /// Builds logging configuration from settings with env overrides.
    ///
    /// Filter precedence: `CATALOG_BATCH_LOG`, `RUST_LOG`, `--verbose` (debug),
    /// then the configured level.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let fallback = if verbose { "debug" } else { settings.level.as_str() };
        Self {
            format: settings.format,
            file: settings.file.clone(),
            filter: build_filter(
                std::env::var(LOG_FILTER_ENV).ok().as_deref(),
                std::env::var("RUST_LOG").ok().as_deref(),
                fallback,
            ),
        }
    }
}

fn build_filter(primary: Option<&str>, secondary: Option<&str>, fallback: &str) -> EnvFilter {
    [primary, secondary]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::try_new(fallback).unwrap_or_else(|_| EnvFilter::new("warn")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_prefers_primary() {
        let filter = build_filter(Some("catalog_batch=trace"), Some("info"), "warn");
        assert_eq!(filter.to_string(), "catalog_batch=trace");
    }

    #[test]
    fn test_filter_skips_blank_and_invalid() {
        let filter = build_filter(Some("  "), Some("catalog_batch=loud"), "info");
        assert_eq!(filter.to_string(), "info");
    }
}
