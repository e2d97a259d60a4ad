//! Staging store backends.
//!
//! | Backend | Survives process exit | Expiry |
//! |---------|-----------------------|--------|
//! | `memory` | No | Checked on read |
//! | `sqlite` | Yes | Checked on read, purged on demand |
//! | `redis` | Yes | Enforced by Redis (`EX`) |

mod memory;
mod redis;
mod sqlite;

pub use memory::InMemoryStagingStore;
pub use redis::RedisStagingStore;
pub use sqlite::SqliteStagingStore;

use crate::config::StagingSettings;
use crate::storage::traits::StagingStore;
use crate::{Error, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// Available staging backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingBackendType {
    /// Process-local map.
    Memory,
    /// `SQLite` file in the data directory.
    #[default]
    Sqlite,
    /// Redis server (requires the `redis` feature).
    Redis,
}

impl StagingBackendType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Redis => "redis",
        }
    }
}

impl FromStr for StagingBackendType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "redis" => Ok(Self::Redis),
            other => Err(Error::InvalidInput(format!(
                "unknown staging backend '{other}' (expected memory, sqlite or redis)"
            ))),
        }
    }
}

/// Creates the staging store selected by `settings`.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened, if Redis is selected without
/// a URL, or if Redis is selected without the `redis` feature.
pub fn create_staging_store(settings: &StagingSettings) -> Result<Arc<dyn StagingStore>> {
    let store: Arc<dyn StagingStore> = match settings.backend {
        StagingBackendType::Memory => Arc::new(InMemoryStagingStore::with_ttl(settings.ttl)),
        StagingBackendType::Sqlite => {
            Arc::new(SqliteStagingStore::new(&settings.sqlite_path, settings.ttl)?)
        },
        StagingBackendType::Redis => {
            let url = settings.redis_url.as_deref().ok_or_else(|| {
                Error::InvalidInput("redis_url is required for the redis staging backend".to_string())
            })?;
            Arc::new(RedisStagingStore::new(url, settings.ttl)?)
        },
    };
    tracing::debug!(backend = store.backend_name(), "staging store ready");
    Ok(store)
}
