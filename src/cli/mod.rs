//! CLI command implementations.
//!
//! Each submodule implements one `catalog-batch` subcommand on top of the
//! in-crate collaborators: an [`InMemoryCatalog`] snapshotted to JSON, a
//! [`LocalFileService`] under the data directory and an [`InMemoryJobStore`].
//! The commands own the job lifecycle, so they are where job statuses change.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `import` | Stage a delimited file, then apply it to the catalog |
//! | `export` | Write every matching product variant to a delimited file |
//! | `region` | Add a region so regional price columns can resolve |
//! | `config` | Show the effective configuration |
//! | `staging` | Maintain the staging store |
//!
//! # Example Usage
//!
//! ```bash
//! catalog-batch region add Denmark --currency dkk
//! catalog-batch import products.csv --dry-run
//! catalog-batch import products.csv
//! catalog-batch export --output products.csv --take 100
//! ```

#![allow(clippy::print_stdout)]

pub mod config;
pub mod export;
pub mod import;
pub mod region;
pub mod staging;

use crate::config::BatchConfig;
use crate::io::BatchDependencies;
use crate::models::BatchJobStatus;
use crate::storage::{InMemoryCatalog, InMemoryJobStore, LocalFileService};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Collaborators a CLI run works against.
pub struct Workspace {
    /// Catalog loaded from the snapshot file.
    pub catalog: Arc<InMemoryCatalog>,
    /// File service rooted in the data directory.
    pub files: Arc<LocalFileService>,
    /// Job records for this run.
    pub jobs: Arc<InMemoryJobStore>,
    catalog_path: PathBuf,
}

impl Workspace {
    /// Opens the catalog snapshot (default: `<data_dir>/catalog.json`) and the
    /// file store.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be parsed or the data directory
    /// cannot be created.
    pub fn open(config: &BatchConfig, catalog: Option<&Path>) -> Result<Self> {
        let catalog_path = catalog.map_or_else(|| config.catalog_path(), Path::to_path_buf);
        Ok(Self {
            catalog: Arc::new(InMemoryCatalog::load(&catalog_path)?),
            files: Arc::new(LocalFileService::new(config.files_dir())?),
            jobs: Arc::new(InMemoryJobStore::new()),
            catalog_path,
        })
    }

    /// Bundles the collaborators for a strategy.
    #[must_use]
    pub fn dependencies(&self) -> BatchDependencies {
        BatchDependencies::new(self.catalog.clone(), self.files.clone(), self.jobs.clone())
    }

    /// Writes the catalog back to its snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn save_catalog(&self) -> Result<()> {
        self.catalog.save(&self.catalog_path)
    }

    /// Path of the catalog snapshot.
    #[must_use]
    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Moves a job to `status` unless it was canceled.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the job does not exist.
    pub fn set_status(&self, job_id: &str, status: BatchJobStatus) -> Result<()> {
        self.jobs.transition(job_id, status).map(|_| ())
    }
}

/// Generates a job id.
#[must_use]
pub fn new_job_id() -> String {
    format!("batch_{}", uuid::Uuid::now_v7().simple())
}
