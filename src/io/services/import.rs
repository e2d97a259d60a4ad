//! Product import strategy.
//!
//! `pre_process` parses the uploaded file, classifies its rows and parks the four
//! operation batches in the staging store. `process` applies them, in order,
//! inside a single catalog transaction:
//!
//! 1. create products
//! 2. update products
//! 3. create variants
//! 4. update variants
//!
//! Failure policy is fail-fast: the first failing row aborts the run with
//! [`Error::RowFailed`] and the transaction is rolled back. Staged batches are
//! kept so the job can be processed again after the cause is fixed.

use super::{BatchDependencies, ratio};
use crate::io::classifier::{OperationBatches, OperationClassifier};
use crate::io::mapping::{product_input, variant_input};
use crate::io::schema::{ColumnSchema, RowParser, product_import_schema};
use crate::models::{
    BatchJob, BatchJobUpdate, ImportJobContext, JobContext, JobResult, ParsedRow,
    ProductVariant, StatDescriptor, VariantOptionInput,
};
use crate::storage::traits::{
    BatchJobStore, IsolationLevel, OperationType, StagingStore, with_transaction,
};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Tunables of the import strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Field delimiter of the input file.
    pub delimiter: u8,
    /// Progress is persisted every this many applied rows.
    pub progress_batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            progress_batch_size: 100,
        }
    }
}

/// Operation counts of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Products created.
    pub product_create: usize,
    /// Products updated.
    pub product_update: usize,
    /// Variants created.
    pub variant_create: usize,
    /// Variants updated.
    pub variant_update: usize,
}

impl ImportSummary {
    /// Total number of operations.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.product_create + self.product_update + self.variant_create + self.variant_update
    }

    /// Human-readable summary attached to the job result.
    #[must_use]
    pub fn stat_descriptors(&self) -> Vec<StatDescriptor> {
        vec![StatDescriptor {
            key: "product-import-count".to_string(),
            name: "Products/variants to import".to_string(),
            message: format!(
                "There will be {} products created ({} updated). {} variants will be created and {} updated.",
                self.product_create, self.product_update, self.variant_create, self.variant_update
            ),
        }]
    }
}

impl From<&OperationBatches> for ImportSummary {
    fn from(batches: &OperationBatches) -> Self {
        Self {
            product_create: batches.product_create.len(),
            product_update: batches.product_update.len(),
            variant_create: batches.variant_create.len(),
            variant_update: batches.variant_update.len(),
        }
    }
}

/// Persists import progress every `batch_size` rows.
struct ProgressTracker<'a> {
    jobs: &'a dyn BatchJobStore,
    job_id: &'a str,
    context: ImportJobContext,
    result: JobResult,
    batch_size: usize,
}

impl ProgressTracker<'_> {
    fn advance(&mut self) -> Result<()> {
        self.context.progress += 1;
        if self.context.progress % self.batch_size == 0 {
            self.persist()?;
        }
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        self.context.progress = self.context.total;
        self.persist()
    }

    /// Records that nothing was applied after a rollback.
    fn reset(&mut self) -> Result<()> {
        self.context.progress = 0;
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        self.result.count = self.context.total;
        self.result.advancement_count = self.context.progress;
        self.result.progress = ratio(self.context.progress, self.context.total);
        self.jobs.update(
            self.job_id,
            BatchJobUpdate::context(JobContext::Import(self.context.clone()))
                .with_result(self.result.clone()),
        )?;
        tracing::debug!(
            job_id = self.job_id,
            progress = self.context.progress,
            total = self.context.total,
            "import progress"
        );
        Ok(())
    }
}

/// Builds the uniform diagnostic for a failed row.
fn row_failure(op: OperationType, row: &ParsedRow, cause: &Error) -> Error {
    let err = Error::RowFailed {
        product_id: row.product_id().unwrap_or_default().to_string(),
        product_handle: row.product_handle().unwrap_or_default().to_string(),
        variant_id: row.variant_id().unwrap_or_default().to_string(),
        variant_sku: row.variant_sku().unwrap_or_default().to_string(),
        cause: cause.to_string(),
    };
    tracing::warn!(operation = op.as_str(), error = %err, "import row failed");
    metrics::counter!("import_row_failures_total", "operation" => op.as_str()).increment(1);
    err
}

/// Import strategy for products and variants.
pub struct ProductImportStrategy {
    deps: BatchDependencies,
    staging: Arc<dyn StagingStore>,
    schema: ColumnSchema,
    options: ImportOptions,
}

impl ProductImportStrategy {
    /// Creates a strategy using the product import schema.
    #[must_use]
    pub fn new(
        deps: BatchDependencies,
        staging: Arc<dyn StagingStore>,
        options: ImportOptions,
    ) -> Self {
        Self {
            deps,
            staging,
            schema: product_import_schema(),
            options,
        }
    }

    /// Validates that the job is an import job with an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a non-import job or a missing file key.
    pub fn prepare(&self, job_id: &str) -> Result<BatchJob> {
        let job = self.deps.jobs.retrieve(job_id)?;
        let context = job.import_context()?;
        if context.file_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::InvalidInput(format!(
                "import job {job_id} has no file_key"
            )));
        }
        Ok(job)
    }

    /// Parses, classifies and stages the job's file.
    ///
    /// Records `total` in the job context and a summary in the job result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaValidation`] for a malformed file,
    /// [`Error::InvalidData`] for unknown regions, or a collaborator error.
    #[instrument(skip(self), fields(operation = "import_pre_process"))]
    pub fn pre_process(&self, job_id: &str) -> Result<ImportSummary> {
        let start = Instant::now();
        let job = self.prepare(job_id)?;
        let file_key = job.import_context()?.file_key.clone().unwrap_or_default();

        let reader = self.deps.files.open_download(&file_key)?;
        let parser = RowParser::new(&self.schema, reader, self.options.delimiter)?;
        let batches = OperationClassifier::new(self.deps.catalog.as_ref()).classify(parser)?;

        self.staging.clear(job_id)?;
        for (op, rows) in batches.iter() {
            self.staging.put(job_id, op, rows)?;
            metrics::counter!("import_operations_staged_total", "operation" => op.as_str())
                .increment(rows.len() as u64);
        }

        let summary = ImportSummary::from(&batches);
        let context = ImportJobContext {
            file_key: Some(file_key),
            total: summary.total(),
            progress: 0,
        };
        let result = JobResult {
            count: summary.total(),
            stat_descriptors: summary.stat_descriptors(),
            ..JobResult::default()
        };
        self.deps.jobs.update(
            job_id,
            BatchJobUpdate::context(JobContext::Import(context)).with_result(result),
        )?;

        metrics::histogram!("batch_phase_duration_ms", "phase" => "import_pre_process")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(
            job_id,
            total = summary.total(),
            product_create = summary.product_create,
            product_update = summary.product_update,
            variant_create = summary.variant_create,
            variant_update = summary.variant_update,
            "import staged"
        );
        Ok(summary)
    }

    /// Applies the staged batches of a job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowFailed`] for the first failing row (after rolling the
    /// transaction back), or a collaborator error.
    #[instrument(skip(self), fields(operation = "import_process"))]
    pub fn process(&self, job_id: &str) -> Result<ImportSummary> {
        let start = Instant::now();
        let job = self.deps.jobs.retrieve(job_id)?;
        let context = job.import_context()?.clone();

        let mut batches = OperationBatches::default();
        for op in OperationType::ALL {
            *batches.get_mut(op) = self.staging.get(job_id, op)?;
        }
        let summary = ImportSummary::from(&batches);

        let mut tracker = ProgressTracker {
            jobs: self.deps.jobs.as_ref(),
            job_id,
            context: ImportJobContext {
                total: summary.total(),
                progress: 0,
                ..context
            },
            result: job.result.clone(),
            batch_size: self.options.progress_batch_size.max(1),
        };

        tracing::info!(job_id, total = summary.total(), "applying staged import");
        let applied = with_transaction(
            self.deps.catalog.as_ref(),
            IsolationLevel::ReadCommitted,
            || {
                for (op, rows) in batches.iter() {
                    self.apply_batch(op, rows, &mut tracker)?;
                }
                Ok(())
            },
        );
        if let Err(e) = applied {
            if let Err(reset_err) = tracker.reset() {
                tracing::error!(job_id, error = %reset_err, "failed to reset import progress");
            }
            return Err(e);
        }

        tracker.complete()?;
        self.staging.clear(job_id)?;

        metrics::histogram!("batch_phase_duration_ms", "phase" => "import_process")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(job_id, applied = summary.total(), "import applied");
        Ok(summary)
    }

    fn apply_batch(
        &self,
        op: OperationType,
        rows: &[ParsedRow],
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<()> {
        let phase_start = Instant::now();
        for row in rows {
            self.apply_row(op, row)
                .map_err(|e| row_failure(op, row, &e))?;
            metrics::counter!("import_rows_applied_total", "operation" => op.as_str())
                .increment(1);
            tracker.advance()?;
        }
        tracing::debug!(
            operation = op.as_str(),
            rows = rows.len(),
            elapsed_ms = phase_start.elapsed().as_millis(),
            "import phase done"
        );
        Ok(())
    }

    fn apply_row(&self, op: OperationType, row: &ParsedRow) -> Result<()> {
        let catalog = self.deps.catalog.as_ref();
        match op {
            OperationType::ProductCreate => {
                catalog.create_product(product_input(row))?;
            },
            OperationType::ProductUpdate => {
                let id = row
                    .product_id()
                    .ok_or_else(|| Error::InvalidData("product update without id".to_string()))?;
                catalog.update_product(id, product_input(row))?;
            },
            OperationType::VariantCreate => {
                self.create_variant(row)?;
            },
            OperationType::VariantUpdate => {
                self.update_variant(row)?;
            },
        }
        Ok(())
    }

    /// Creates a variant, aligning its option values with the options of the
    /// product created or updated earlier in the run.
    fn create_variant(&self, row: &ParsedRow) -> Result<ProductVariant> {
        let catalog = self.deps.catalog.as_ref();
        let handle = row
            .product_handle()
            .ok_or_else(|| Error::InvalidData("variant row without product handle".to_string()))?;
        let product = catalog
            .retrieve_product_by_handle(handle)?
            .ok_or_else(|| Error::NotFound {
                entity: "product",
                id: handle.to_string(),
            })?;

        let options = row
            .variant_options
            .iter()
            .map(|value| {
                product
                    .option_by_title(&value.title)
                    .map(|option| VariantOptionInput {
                        option_id: option.id.clone(),
                        value: value.value.clone(),
                    })
                    .ok_or_else(|| {
                        Error::InvalidData(format!(
                            "option {} does not exist on product {handle}",
                            value.title
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut input = variant_input(row)?;
        input.options = Some(options);
        catalog.create_variant(&product.id, input)
    }

    /// Updates a variant, resolving option ids by `(product id, option title)`.
    fn update_variant(&self, row: &ParsedRow) -> Result<ProductVariant> {
        let catalog = self.deps.catalog.as_ref();
        let variant_id = row
            .variant_id()
            .ok_or_else(|| Error::InvalidData("variant update without id".to_string()))?;
        let product_id = match row.product_id() {
            Some(id) => id.to_string(),
            None => {
                let handle = row.product_handle().unwrap_or_default();
                catalog
                    .retrieve_product_by_handle(handle)?
                    .ok_or_else(|| Error::NotFound {
                        entity: "product",
                        id: handle.to_string(),
                    })?
                    .id
            },
        };

        let mut options = Vec::with_capacity(row.variant_options.len());
        for value in &row.variant_options {
            let option = catalog
                .find_product_option(&product_id, &value.title)?
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "option {} does not exist on product {product_id}",
                        value.title
                    ))
                })?;
            options.push(VariantOptionInput {
                option_id: option.id,
                value: value.value.clone(),
            });
        }

        let mut input = variant_input(row)?;
        if !options.is_empty() {
            input.options = Some(options);
        }
        catalog.update_variant(variant_id, input)
    }
}
