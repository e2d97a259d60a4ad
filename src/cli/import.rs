//! Import CLI command.

use super::{Workspace, new_job_id};
use crate::config::BatchConfig;
use crate::io::{ImportSummary, ProductImportStrategy};
use crate::models::{BatchJob, BatchJobStatus};
use crate::storage::{BatchJobStore, StagingStore, create_staging_store};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// Outcome of an import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Id of the job that ran.
    pub job_id: String,
    /// Staged operation counts.
    pub summary: ImportSummary,
    /// Whether the staged operations were applied.
    pub applied: bool,
}

/// Imports `file` into the catalog snapshot.
pub fn execute(
    config: &BatchConfig,
    file: &Path,
    catalog: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let workspace = Workspace::open(config, catalog)?;
    let staging = create_staging_store(&config.staging)?;
    let report = run(&workspace, staging, config, file, dry_run)?;

    let job = workspace.jobs.retrieve(&report.job_id)?;
    for stat in &job.result.stat_descriptors {
        println!("{}", stat.message);
    }
    if report.applied {
        println!(
            "Applied {} operations to {}",
            report.summary.total(),
            workspace.catalog_path().display()
        );
    } else {
        println!("Dry run: nothing was applied");
    }
    Ok(())
}

/// Runs an import job end to end against `workspace`.
///
/// The job moves through `pre_processed`, `confirmed` and `processing` to
/// `completed`, or to `failed` on the first error. A dry run stops after
/// staging and discards the staged batches. The catalog snapshot is saved only
/// after a successful apply.
///
/// # Errors
///
/// Returns the error that failed the job.
pub fn run(
    workspace: &Workspace,
    staging: Arc<dyn StagingStore>,
    config: &BatchConfig,
    file: &Path,
    dry_run: bool,
) -> Result<ImportReport> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("not a file: {}", file.display())))?;
    let job_id = new_job_id();
    let file_key = workspace
        .files
        .put_file(file, &format!("imports/{job_id}/{file_name}"))?;
    workspace.jobs.insert(BatchJob::import(&job_id, file_key));

    let strategy = ProductImportStrategy::new(
        workspace.dependencies(),
        staging.clone(),
        config.import_options(),
    );

    let summary = fail_on_error(workspace, &job_id, strategy.pre_process(&job_id))?;
    workspace.set_status(&job_id, BatchJobStatus::PreProcessed)?;

    if dry_run {
        staging.clear(&job_id)?;
        tracing::info!(job_id = %job_id, total = summary.total(), "dry run, staged batches discarded");
        return Ok(ImportReport {
            job_id,
            summary,
            applied: false,
        });
    }

    workspace.set_status(&job_id, BatchJobStatus::Confirmed)?;
    workspace.set_status(&job_id, BatchJobStatus::Processing)?;
    let summary = fail_on_error(workspace, &job_id, strategy.process(&job_id))?;
    workspace.save_catalog()?;
    workspace.set_status(&job_id, BatchJobStatus::Completed)?;

    Ok(ImportReport {
        job_id,
        summary,
        applied: true,
    })
}

fn fail_on_error<T>(workspace: &Workspace, job_id: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::error!(job_id, error = %e, "import job failed");
        workspace.set_status(job_id, BatchJobStatus::Failed)?;
    }
    result
}
