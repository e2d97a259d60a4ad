//! Prometheus metrics.
//!
//! Batch runs are short-lived, so nothing is scraped. The recorder collects for
//! the lifetime of the process and [`flush`] renders the exposition text to a
//! file that a node exporter textfile collector can pick up.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};

/// Metrics configuration.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Where [`flush`] writes the rendered metrics.
    pub textfile: Option<PathBuf>,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings.
    #[must_use]
    pub fn from_settings(settings: &MetricsSettings) -> Self {
        Self {
            enabled: settings.enabled,
            textfile: settings.textfile.clone(),
        }
    }
}

/// Metrics handle for flushing on shutdown.
#[derive(Debug)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
    textfile: Option<PathBuf>,
}

impl MetricsHandle {
    /// Renders the current metrics in Prometheus exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the Prometheus recorder as the global metrics recorder.
///
/// Returns `None` when metrics are disabled.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let prometheus = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| Error::operation("metrics_recorder_install", e))?;

    Ok(Some(MetricsHandle {
        prometheus,
        textfile: config.textfile.clone(),
    }))
}

/// Writes the rendered metrics to the configured textfile, if any.
///
/// The file is written next to its destination and renamed into place so a
/// collector never reads a partial file. Failures are logged, not returned.
pub fn flush(handle: &MetricsHandle) {
    let Some(path) = &handle.textfile else {
        tracing::debug!("No metrics textfile configured, skipping flush");
        return;
    };

    let mut payload = handle.render();
    if !payload.ends_with('\n') {
        payload.push('\n');
    }

    match write_atomically(path, &payload) {
        Ok(()) => tracing::debug!(bytes = payload.len(), path = %path.display(), "Metrics written"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to write metrics"),
    }
}

fn write_atomically(path: &Path, payload: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, payload)?;
    std::fs::rename(&tmp, path)
}
