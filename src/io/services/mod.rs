//! Batch job strategies.
//!
//! Each strategy runs the phases of one job kind against the collaborators in
//! [`BatchDependencies`]:
//!
//! | Strategy | `prepare` | `pre_process` | `process` |
//! |----------|-----------|---------------|-----------|
//! | [`ProductImportStrategy`] | checks the uploaded file key | parse, classify, stage | apply staged batches in one transaction |
//! | [`ProductExportStrategy`] | fills listing defaults | discover the column shape | stream lines page by page |
//!
//! Strategies read and write a job's `context` and `result`. Status transitions
//! belong to the job's owner.

pub mod export;
pub mod import;

pub use export::{ExportOptions, ExportOutcome, ProductExportStrategy};
pub use import::{ImportOptions, ImportSummary, ProductImportStrategy};

use crate::storage::traits::{BatchJobStore, CatalogBackend, FileService};
use std::sync::Arc;

/// Collaborators shared by the strategies.
#[derive(Clone)]
pub struct BatchDependencies {
    /// Entity storage.
    pub catalog: Arc<dyn CatalogBackend>,
    /// File storage.
    pub files: Arc<dyn FileService>,
    /// Job records.
    pub jobs: Arc<dyn BatchJobStore>,
}

impl BatchDependencies {
    /// Bundles the collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        files: Arc<dyn FileService>,
        jobs: Arc<dyn BatchJobStore>,
    ) -> Self {
        Self {
            catalog,
            files,
            jobs,
        }
    }
}

impl std::fmt::Debug for BatchDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDependencies").finish_non_exhaustive()
    }
}

/// Fraction of `done` over `total`, `1.0` when there is nothing to do.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).min(1.0)
    }
}
