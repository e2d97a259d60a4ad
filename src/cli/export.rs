//! Export CLI command.

use super::{Workspace, new_job_id};
use crate::config::BatchConfig;
use crate::io::{ExportOutcome, ProductExportStrategy};
use crate::models::{BatchJob, BatchJobStatus, ExportJobContext, ListConfig, SortOrder};
use crate::{Error, Result};
use std::path::PathBuf;

/// Listing options of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportArgs {
    /// Catalog snapshot to read.
    pub catalog: Option<PathBuf>,
    /// Where to copy the finished file.
    pub output: Option<PathBuf>,
    /// Products per page; the configured page size when unset.
    pub take: Option<usize>,
    /// Matching products to skip.
    pub skip: usize,
    /// Oldest products first.
    pub oldest_first: bool,
}

/// Exports the catalog snapshot.
///
/// Ctrl-C cancels the job; the run stops at the next page boundary and the
/// partial file is deleted.
pub fn execute(config: &BatchConfig, args: &ExportArgs) -> Result<()> {
    let workspace = Workspace::open(config, args.catalog.as_deref())?;
    let job_id = new_job_id();

    let jobs = workspace.jobs.clone();
    let cancel_id = job_id.clone();
    ctrlc::set_handler(move || match jobs.cancel(&cancel_id) {
        Ok(_) => tracing::warn!(job_id = %cancel_id, "cancel requested, stopping at the next page"),
        Err(e) => tracing::error!(error = %e, "failed to cancel export job"),
    })
    .map_err(|e| Error::operation("install_signal_handler", e))?;

    let outcome = run(&workspace, config, &job_id, args)?;
    match &outcome {
        ExportOutcome::Completed(result) => {
            let path = output_path(&workspace, &outcome)?;
            let shown = match &args.output {
                Some(output) => {
                    std::fs::copy(&path, output)
                        .map_err(|e| Error::operation("copy_export_file", e))?;
                    output.clone()
                },
                None => path,
            };
            println!(
                "Exported {} products ({} bytes) to {}",
                result.advancement_count,
                result.file_size.unwrap_or_default(),
                shown.display()
            );
        },
        ExportOutcome::Canceled(result) => {
            println!(
                "Export canceled after {} of {} products",
                result.advancement_count, result.count
            );
        },
    }
    Ok(())
}

/// Runs an export job end to end against `workspace` under `job_id`.
///
/// A canceled job keeps its `canceled` status; otherwise the job ends
/// `completed`, or `failed` on error.
///
/// # Errors
///
/// Returns the error that failed the job.
pub fn run(
    workspace: &Workspace,
    config: &BatchConfig,
    job_id: &str,
    args: &ExportArgs,
) -> Result<ExportOutcome> {
    let context = ExportJobContext {
        list_config: ListConfig {
            skip: args.skip,
            take: args.take.unwrap_or(0),
            order: if args.oldest_first {
                SortOrder::CreatedAtAsc
            } else {
                SortOrder::CreatedAtDesc
            },
        },
        ..ExportJobContext::default()
    };
    workspace.jobs.insert(BatchJob::export(job_id, context));

    let strategy = ProductExportStrategy::new(workspace.dependencies(), config.export_options());
    match drive(workspace, &strategy, job_id) {
        Ok(ExportOutcome::Completed(result)) => {
            workspace.set_status(job_id, BatchJobStatus::Completed)?;
            Ok(ExportOutcome::Completed(result))
        },
        Ok(canceled @ ExportOutcome::Canceled(_)) => Ok(canceled),
        Err(e) => {
            tracing::error!(job_id, error = %e, "export job failed");
            workspace.set_status(job_id, BatchJobStatus::Failed)?;
            Err(e)
        },
    }
}

fn drive(
    workspace: &Workspace,
    strategy: &ProductExportStrategy,
    job_id: &str,
) -> Result<ExportOutcome> {
    strategy.prepare(job_id)?;
    strategy.pre_process(job_id)?;
    workspace.set_status(job_id, BatchJobStatus::PreProcessed)?;
    workspace.set_status(job_id, BatchJobStatus::Confirmed)?;
    workspace.set_status(job_id, BatchJobStatus::Processing)?;
    strategy.process(job_id)
}

/// Path of a finished export inside the file store.
///
/// # Errors
///
/// Returns an error if the outcome carries no usable file key.
pub fn output_path(workspace: &Workspace, outcome: &ExportOutcome) -> Result<PathBuf> {
    let file_key = outcome
        .result()
        .file_key
        .as_deref()
        .ok_or_else(|| Error::InvalidInput("export produced no file".to_string()))?;
    workspace.files.path_for(file_key)
}
