//! Staging CLI command.

use crate::config::BatchConfig;
use crate::storage::{SqliteStagingStore, StagingBackendType};
use crate::Result;

/// Deletes expired staged batches from the `SQLite` staging store.
///
/// The memory backend does not outlive the process and Redis expires keys on
/// its own, so there is nothing to purge for them.
pub fn purge(config: &BatchConfig) -> Result<()> {
    if config.staging.backend != StagingBackendType::Sqlite {
        println!(
            "Nothing to purge: the {} staging backend expires entries itself",
            config.staging.backend.as_str()
        );
        return Ok(());
    }
    if !config.staging.sqlite_path.exists() {
        println!("No staging database at {}", config.staging.sqlite_path.display());
        return Ok(());
    }

    let store = SqliteStagingStore::new(&config.staging.sqlite_path, config.staging.ttl)?;
    let purged = store.purge_expired()?;
    println!("Purged {purged} expired staged batches");
    Ok(())
}
