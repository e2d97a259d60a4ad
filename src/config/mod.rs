//! Configuration management.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults ([`BatchConfig::default`])
//! 2. A TOML file ([`BatchConfig::load_from_file`] / [`BatchConfig::load_default`])
//! 3. `CATALOG_BATCH_*` environment variables ([`BatchConfig::apply_env_overrides`])
//!
//! ```toml
//! data_dir = "/var/lib/catalog-batch"
//! delimiter = ";"
//!
//! [staging]
//! backend = "sqlite"
//! ttl_secs = 3600
//!
//! [import]
//! progress_batch_size = 100
//!
//! [export]
//! page_size = 50
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! textfile = "/var/lib/node_exporter/catalog_batch.prom"
//! ```

use crate::io::{ExportOptions, ImportOptions};
use crate::storage::StagingBackendType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config directory under the platform config dir.
const APP_DIR: &str = "catalog-batch";

/// Default staging time-to-live.
pub const DEFAULT_STAGING_TTL_SECS: u64 = 3600;

/// Main configuration for catalog-batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Directory holding the catalog snapshot, staging database and files.
    pub data_dir: PathBuf,
    /// Field delimiter for import and export files.
    pub delimiter: u8,
    /// Staging store settings.
    pub staging: StagingSettings,
    /// Rows applied between import progress checkpoints.
    pub progress_batch_size: usize,
    /// Export page size.
    pub page_size: usize,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
}

/// Staging store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingSettings {
    /// Which backend to use.
    pub backend: StagingBackendType,
    /// How long staged batches live.
    pub ttl: Duration,
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Redis connection URL.
    pub redis_url: Option<String>,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            backend: StagingBackendType::default(),
            ttl: Duration::from_secs(DEFAULT_STAGING_TTL_SECS),
            sqlite_path: default_data_dir().join("staging.db"),
            redis_url: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive when no env filter is set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional file to append logs to instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Metrics settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSettings {
    /// Whether the Prometheus recorder is installed.
    pub enabled: bool,
    /// File the rendered metrics are written to on exit.
    pub textfile: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Field delimiter, a single ASCII character.
    pub delimiter: Option<String>,
    /// Staging section.
    pub staging: Option<ConfigFileStaging>,
    /// Import section.
    pub import: Option<ConfigFileImport>,
    /// Export section.
    pub export: Option<ConfigFileExport>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Staging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStaging {
    /// Backend name.
    pub backend: Option<StagingBackendType>,
    /// Time-to-live in seconds.
    pub ttl_secs: Option<u64>,
    /// `SQLite` path.
    pub sqlite_path: Option<String>,
    /// Redis URL.
    pub redis_url: Option<String>,
}

/// Import section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileImport {
    /// Progress checkpoint interval.
    pub progress_batch_size: Option<usize>,
}

/// Export section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileExport {
    /// Page size.
    pub page_size: Option<usize>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// Output format.
    pub format: Option<String>,
    /// Log file.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMetrics {
    /// Enable the recorder.
    pub enabled: Option<bool>,
    /// Textfile path.
    pub textfile: Option<String>,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_DIR).map_or_else(
        || PathBuf::from(".catalog-batch"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

impl Default for BatchConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            staging: StagingSettings {
                sqlite_path: data_dir.join("staging.db"),
                ..StagingSettings::default()
            },
            data_dir,
            delimiter: b';',
            progress_batch_size: ImportOptions::default().progress_batch_size,
            page_size: ExportOptions::default().page_size,
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

impl BatchConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds an
    /// invalid value.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", format!("{}: {e}", path.display())))?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| Error::operation("parse_config_file", e))?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/catalog-batch/` on macOS)
    /// 2. XDG config dir (`~/.config/catalog-batch/` for Unix compatibility)
    ///
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        Self::default_paths()
            .into_iter()
            .filter(|path| path.exists())
            .find_map(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                    None
                },
            })
            .unwrap_or_default()
    }

    /// Candidate config file locations, most specific first.
    #[must_use]
    pub fn default_paths() -> Vec<PathBuf> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Vec::new();
        };
        vec![
            base_dirs.config_dir().join(APP_DIR).join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join(APP_DIR)
                .join("config.toml"),
        ]
    }

    /// Converts a `ConfigFile` to `BatchConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(delimiter) = file.delimiter {
            config.delimiter = parse_delimiter(&delimiter)?;
        }
        if let Some(staging) = file.staging {
            if let Some(backend) = staging.backend {
                config.staging.backend = backend;
            }
            if let Some(ttl) = staging.ttl_secs {
                config.staging.ttl = Duration::from_secs(ttl);
            }
            if let Some(path) = staging.sqlite_path {
                config.staging.sqlite_path = PathBuf::from(path);
            }
            config.staging.redis_url = staging.redis_url.or(config.staging.redis_url);
        }
        if let Some(v) = file.import.and_then(|s| s.progress_batch_size) {
            config.progress_batch_size = v;
        }
        if let Some(v) = file.export.and_then(|s| s.page_size) {
            config.page_size = v;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            if let Some(v) = metrics.enabled {
                config.metrics.enabled = v;
            }
            if let Some(v) = metrics.textfile {
                config.metrics.textfile = Some(PathBuf::from(v));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Applies `CATALOG_BATCH_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an unparsable value.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Split out so tests need not touch
    /// the process environment.
    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup("CATALOG_BATCH_DATA_DIR") {
            self = self.with_data_dir(dir);
        }
        if let Some(delimiter) = lookup("CATALOG_BATCH_DELIMITER") {
            self.delimiter = parse_delimiter(&delimiter)?;
        }
        if let Some(backend) = lookup("CATALOG_BATCH_STAGING_BACKEND") {
            self.staging.backend = backend.parse()?;
        }
        if let Some(ttl) = lookup("CATALOG_BATCH_STAGING_TTL_SECS") {
            self.staging.ttl = Duration::from_secs(parse_number("CATALOG_BATCH_STAGING_TTL_SECS", &ttl)?);
        }
        if let Some(url) = lookup("CATALOG_BATCH_REDIS_URL") {
            self.staging.redis_url = Some(url);
        }
        if let Some(v) = lookup("CATALOG_BATCH_PROGRESS_BATCH_SIZE") {
            self.progress_batch_size = parse_number("CATALOG_BATCH_PROGRESS_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("CATALOG_BATCH_PAGE_SIZE") {
            self.page_size = parse_number("CATALOG_BATCH_PAGE_SIZE", &v)?;
        }
        if let Some(format) = lookup("CATALOG_BATCH_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(file) = lookup("CATALOG_BATCH_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = lookup("CATALOG_BATCH_METRICS_ENABLED") {
            self.metrics.enabled = matches!(enabled.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(path) = lookup("CATALOG_BATCH_METRICS_TEXTFILE") {
            self.metrics.textfile = Some(PathBuf::from(path));
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks values that would make the strategies misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a zero page size or batch size.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidInput("export page_size must be at least 1".to_string()));
        }
        if self.progress_batch_size == 0 {
            return Err(Error::InvalidInput(
                "import progress_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the data directory. The `SQLite` staging path follows it.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self.staging.sqlite_path = self.data_dir.join("staging.db");
        self
    }

    /// Sets the staging backend.
    #[must_use]
    pub const fn with_staging_backend(mut self, backend: StagingBackendType) -> Self {
        self.staging.backend = backend;
        self
    }

    /// Path of the catalog snapshot used by the CLI.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    /// Root of the local file service.
    #[must_use]
    pub fn files_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    /// Options for [`crate::io::ProductImportStrategy`].
    #[must_use]
    pub const fn import_options(&self) -> ImportOptions {
        ImportOptions {
            delimiter: self.delimiter,
            progress_batch_size: self.progress_batch_size,
        }
    }

    /// Options for [`crate::io::ProductExportStrategy`].
    #[must_use]
    pub const fn export_options(&self) -> ExportOptions {
        ExportOptions {
            delimiter: self.delimiter,
            page_size: self.page_size,
        }
    }
}

impl fmt::Display for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data_dir = {}", self.data_dir.display())?;
        writeln!(f, "delimiter = {:?}", char::from(self.delimiter))?;
        writeln!(f, "staging.backend = {}", self.staging.backend.as_str())?;
        writeln!(f, "staging.ttl_secs = {}", self.staging.ttl.as_secs())?;
        writeln!(f, "staging.sqlite_path = {}", self.staging.sqlite_path.display())?;
        // Credentials may be embedded in the URL.
        writeln!(
            f,
            "staging.redis_url = {}",
            if self.staging.redis_url.is_some() { "<set>" } else { "<unset>" }
        )?;
        writeln!(f, "import.progress_batch_size = {}", self.progress_batch_size)?;
        writeln!(f, "export.page_size = {}", self.page_size)?;
        writeln!(f, "logging.level = {}", self.logging.level)?;
        writeln!(f, "logging.format = {}", self.logging.format.as_str())?;
        if let Some(file) = &self.logging.file {
            writeln!(f, "logging.file = {}", file.display())?;
        }
        write!(f, "metrics.enabled = {}", self.metrics.enabled)?;
        if let Some(path) = &self.metrics.textfile {
            write!(f, "\nmetrics.textfile = {}", path.display())?;
        }
        Ok(())
    }
}

fn parse_delimiter(value: &str) -> Result<u8> {
    let value = if value == "\\t" { "\t" } else { value };
    match value.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(*b),
        _ => Err(Error::InvalidInput(format!(
            "delimiter must be a single ASCII character, got {value:?}"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a number, got {value:?}")))
}
