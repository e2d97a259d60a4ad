//! Product export strategy.
//!
//! Export runs in two passes over the catalog listing. `pre_process` pages
//! through the matching products once to discover the variable-width part of
//! the header (option, image and price columns). `process` pages through them
//! again and streams one line per product variant, checkpointing the job result
//! after every page. Cancellation is polled between pages: a canceled job stops,
//! its partial file is deleted and [`ExportOutcome::Canceled`] is returned. A
//! run that fails mid-stream deletes its partial file as well.

use super::{BatchDependencies, ratio};
use crate::io::export::{ExportColumnDescriptor, ShapeAccumulator, build_export_columns};
use crate::models::{
    BatchJob, BatchJobUpdate, ExportJobContext, ExportShape, JobContext, JobResult, ListConfig,
    StatDescriptor,
};
use crate::storage::traits::{IsolationLevel, UploadDescriptor, UploadStream, with_transaction};
use crate::{Error, Result, current_timestamp_millis};
use std::io::{self, Write};
use std::time::Instant;
use tracing::instrument;

/// Prefix of export file keys.
pub const EXPORT_FILE_PREFIX: &str = "exports/products/product-export-";

/// Tunables of the export strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field delimiter of the output file.
    pub delimiter: u8,
    /// Page size used for shape discovery and as the default listing `take`.
    pub page_size: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            page_size: 50,
        }
    }
}

/// How an export run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// Every page was written and the upload finished.
    Completed(JobResult),
    /// The job was canceled; the partial file was deleted.
    Canceled(JobResult),
}

impl ExportOutcome {
    /// Returns whether the run was canceled.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }

    /// The job result as last persisted.
    #[must_use]
    pub const fn result(&self) -> &JobResult {
        match self {
            Self::Completed(result) | Self::Canceled(result) => result,
        }
    }
}

/// Counts bytes on their way to the upload stream.
struct CountingWriter {
    inner: Box<dyn UploadStream>,
    bytes: u64,
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Export strategy for products and variants.
pub struct ProductExportStrategy {
    deps: BatchDependencies,
    options: ExportOptions,
}

impl ProductExportStrategy {
    /// Creates the strategy.
    #[must_use]
    pub const fn new(deps: BatchDependencies, options: ExportOptions) -> Self {
        Self { deps, options }
    }

    /// Fills listing defaults into the job context.
    ///
    /// A zero `take` becomes the configured page size; an explicit `batch_size`
    /// overrides `take`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a non-export job, or a job store error.
    pub fn prepare(&self, job_id: &str) -> Result<BatchJob> {
        let job = self.deps.jobs.retrieve(job_id)?;
        let mut context = job.export_context()?.clone();

        if let Some(batch_size) = context.batch_size.filter(|&b| b > 0) {
            context.list_config.take = batch_size;
        }
        if context.list_config.take == 0 {
            context.list_config.take = self.options.page_size.max(1);
        }
        self.deps
            .jobs
            .update(job_id, BatchJobUpdate::context(JobContext::Export(context)))
    }

    /// Discovers the export shape and stores it in the job context.
    ///
    /// # Errors
    ///
    /// Returns a collaborator error.
    #[instrument(skip(self), fields(operation = "export_pre_process"))]
    pub fn pre_process(&self, job_id: &str) -> Result<ExportShape> {
        let start = Instant::now();
        let job = self.deps.jobs.retrieve(job_id)?;
        let mut context = job.export_context()?.clone();

        let (shape, products) = self.discover_shape(&context)?;
        context.shape = Some(shape.clone());
        let result = JobResult {
            count: products,
            stat_descriptors: vec![StatDescriptor {
                key: "product-export-count".to_string(),
                name: "Product count to export".to_string(),
                message: format!("There will be {products} products exported by this action"),
            }],
            ..job.result
        };
        self.deps.jobs.update(
            job_id,
            BatchJobUpdate::context(JobContext::Export(context)).with_result(result),
        )?;

        metrics::histogram!("batch_phase_duration_ms", "phase" => "export_pre_process")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(
            job_id,
            products,
            option_columns = shape.dynamic_option_column_count,
            image_columns = shape.dynamic_image_column_count,
            price_columns = shape.prices.len(),
            "export shape discovered"
        );
        Ok(shape)
    }

    /// Pages through the matching products without retaining them.
    fn discover_shape(&self, context: &ExportJobContext) -> Result<(ExportShape, usize)> {
        let page_size = self.options.page_size.max(1);
        let mut accumulator = ShapeAccumulator::new();
        let mut offset = context.list_config.skip;
        loop {
            let config = ListConfig {
                skip: offset,
                take: page_size,
                order: context.list_config.order,
            };
            let (page, count) = self
                .deps
                .catalog
                .list_and_count_products(&context.filterable_fields, &config)?;
            if page.is_empty() {
                break;
            }
            for product in &page {
                accumulator.observe(product);
            }
            offset += page.len();
            if offset >= count {
                break;
            }
        }
        let seen = accumulator.products_seen();
        Ok((accumulator.finish(), seen))
    }

    /// Streams the export file, resuming after `advancement_count` products.
    ///
    /// # Errors
    ///
    /// Returns a collaborator or write error. Cancellation is not an error.
    #[instrument(skip(self), fields(operation = "export_process"))]
    pub fn process(&self, job_id: &str) -> Result<ExportOutcome> {
        let start = Instant::now();
        let job = self.deps.jobs.retrieve(job_id)?;
        let context = job.export_context()?.clone();
        let shape = match &context.shape {
            Some(shape) => shape.clone(),
            None => {
                tracing::debug!(job_id, "export job has no shape, discovering it now");
                self.discover_shape(&context)?.0
            },
        };
        let columns = build_export_columns(&shape);

        let outcome = with_transaction(
            self.deps.catalog.as_ref(),
            IsolationLevel::Serializable,
            || self.stream(job_id, &context, &columns, job.result.clone()),
        )?;

        metrics::histogram!("batch_phase_duration_ms", "phase" => "export_process")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        Ok(outcome)
    }

    fn stream(
        &self,
        job_id: &str,
        context: &ExportJobContext,
        columns: &[ExportColumnDescriptor],
        previous: JobResult,
    ) -> Result<ExportOutcome> {
        let upload = self.deps.files.open_upload(
            &format!("{EXPORT_FILE_PREFIX}{}", current_timestamp_millis()),
            "csv",
        )?;
        let file_key = upload.file_key.clone();
        let outcome = self.write_file(job_id, context, columns, previous, upload);
        if let Err(e) = &outcome {
            tracing::warn!(job_id, file_key = %file_key, error = %e, "export failed, deleting partial file");
            if let Err(delete_err) = self.deps.files.delete(&file_key) {
                tracing::error!(file_key = %file_key, error = %delete_err, "failed to delete partial export file");
            }
        }
        outcome
    }

    fn write_file(
        &self,
        job_id: &str,
        context: &ExportJobContext,
        columns: &[ExportColumnDescriptor],
        previous: JobResult,
        upload: UploadDescriptor,
    ) -> Result<ExportOutcome> {
        let file_key = upload.file_key.clone();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .terminator(csv::Terminator::CRLF)
            .has_headers(false)
            .from_writer(CountingWriter {
                inner: upload.stream,
                bytes: 0,
            });
        writer
            .write_record(columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| Error::operation("write_export_header", e))?;

        let skip = context.list_config.skip;
        let take = context.list_config.take.max(1);
        let mut result = JobResult {
            file_key: Some(file_key.clone()),
            ..previous
        };
        tracing::info!(
            job_id,
            file_key = %file_key,
            resume_from = result.advancement_count,
            "export started"
        );

        loop {
            let config = ListConfig {
                skip: skip + result.advancement_count,
                take,
                order: context.list_config.order,
            };
            let (page, count) = self
                .deps
                .catalog
                .list_and_count_products(&context.filterable_fields, &config)?;
            result.count = count.saturating_sub(skip);
            if page.is_empty() {
                break;
            }

            let mut lines = 0_u64;
            for product in &page {
                for variant in &product.variants {
                    writer
                        .write_record(columns.iter().map(|c| c.value(product, variant)))
                        .map_err(|e| Error::operation("write_export_line", e))?;
                    lines += 1;
                }
            }
            writer
                .flush()
                .map_err(|e| Error::operation("flush_export", e))?;
            metrics::counter!("export_lines_written_total").increment(lines);

            result.advancement_count += page.len();
            result.progress = ratio(result.advancement_count, result.count);
            result.file_size = Some(writer.get_ref().bytes);
            self.deps
                .jobs
                .update(job_id, BatchJobUpdate::result(result.clone()))?;
            tracing::debug!(
                job_id,
                advancement_count = result.advancement_count,
                count = result.count,
                lines,
                "export page written"
            );

            if self.deps.jobs.retrieve(job_id)?.is_canceled() {
                tracing::warn!(
                    job_id,
                    file_key = %file_key,
                    "export canceled, deleting partial file"
                );
                drop(writer);
                self.deps.files.delete(&file_key)?;
                return Ok(ExportOutcome::Canceled(result));
            }
            if skip + result.advancement_count >= count {
                break;
            }
        }

        let counting = writer
            .into_inner()
            .map_err(|e| Error::operation("flush_export", e))?;
        result.file_size = Some(counting.bytes);
        counting.inner.finish()?;
        result.progress = 1.0;
        self.deps
            .jobs
            .update(job_id, BatchJobUpdate::result(result.clone()))?;

        tracing::info!(
            job_id,
            file_key = %file_key,
            products = result.advancement_count,
            "export completed"
        );
        Ok(ExportOutcome::Completed(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceInput, ProductInput, VariantInput};
    use crate::storage::traits::{BatchJobStore, CatalogBackend, FileService};
    use crate::storage::{InMemoryCatalog, InMemoryJobStore, LocalFileService};
    use std::io::Read;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        catalog: Arc<InMemoryCatalog>,
        files: Arc<LocalFileService>,
        jobs: Arc<InMemoryJobStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            Self {
                files: Arc::new(LocalFileService::new(dir.path()).unwrap()),
                _dir: dir,
                catalog: Arc::new(InMemoryCatalog::with_default_profile()),
                jobs: Arc::new(InMemoryJobStore::new()),
            }
        }

        fn strategy(&self) -> ProductExportStrategy {
            ProductExportStrategy::new(
                BatchDependencies::new(self.catalog.clone(), self.files.clone(), self.jobs.clone()),
                ExportOptions::default(),
            )
        }

        fn add_product(&self, handle: &str, amounts: &[i64]) {
            let product = self
                .catalog
                .create_product(ProductInput {
                    handle: Some(handle.to_string()),
                    title: Some(handle.to_uppercase()),
                    ..ProductInput::default()
                })
                .unwrap();
            for amount in amounts {
                self.catalog
                    .create_variant(
                        &product.id,
                        VariantInput {
                            prices: Some(vec![PriceInput {
                                region_id: None,
                                currency_code: Some("dkk".to_string()),
                                amount: *amount,
                            }]),
                            ..VariantInput::default()
                        },
                    )
                    .unwrap();
            }
        }

        fn read(&self, key: &str) -> String {
            let mut content = String::new();
            self.files
                .open_download(key)
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            content
        }
    }

    #[test]
    fn test_prepare_fills_take() {
        let fx = Fixture::new();
        let context = ExportJobContext {
            list_config: ListConfig {
                take: 0,
                ..ListConfig::default()
            },
            ..ExportJobContext::default()
        };
        fx.jobs.insert(BatchJob::export("job_1", context));
        let job = fx.strategy().prepare("job_1").unwrap();
        assert_eq!(job.export_context().unwrap().list_config.take, 50);
    }

    #[test]
    fn test_export_writes_line_per_variant() {
        let fx = Fixture::new();
        fx.add_product("shirt", &[110, 120]);
        fx.jobs.insert(BatchJob::export("job_1", ExportJobContext::default()));
        let strategy = fx.strategy();

        let shape = strategy.pre_process("job_1").unwrap();
        assert_eq!(shape.prices.len(), 1);

        let outcome = strategy.process("job_1").unwrap();
        assert!(!outcome.is_canceled());
        let result = outcome.result();
        let key = result.file_key.clone().unwrap();
        assert!(key.starts_with(EXPORT_FILE_PREFIX));
        assert!(key.ends_with(".csv"));
        assert_eq!(result.advancement_count, 1);

        let content = fx.read(&key);
        let lines: Vec<&str> = content.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Product Id;Product Handle;"));
        assert!(lines[0].ends_with(";Price DKK"));
        assert!(lines[1].ends_with(";110"));
        assert!(lines[2].ends_with(";120"));
        assert_eq!(result.file_size, Some(content.len() as u64));
    }

    #[test]
    fn test_cancel_after_first_page_deletes_file() {
        let fx = Fixture::new();
        for i in 0..5 {
            fx.add_product(&format!("p-{i}"), &[i]);
        }
        let context = ExportJobContext {
            list_config: ListConfig {
                take: 2,
                ..ListConfig::default()
            },
            ..ExportJobContext::default()
        };
        fx.jobs.insert(BatchJob::export("job_1", context));
        let strategy = fx.strategy();
        strategy.pre_process("job_1").unwrap();
        fx.jobs.cancel("job_1").unwrap();

        let outcome = strategy.process("job_1").unwrap();
        assert!(outcome.is_canceled());
        assert_eq!(outcome.result().advancement_count, 2);
        let key = outcome.result().file_key.clone().unwrap();
        assert!(fx.files.open_download(&key).is_err());
        assert_eq!(fx.jobs.retrieve("job_1").unwrap().result.advancement_count, 2);
        assert!(!fx.catalog.in_transaction());
    }

    #[test]
    fn test_resume_starts_after_advancement() {
        let fx = Fixture::new();
        for i in 0..3 {
            fx.add_product(&format!("p-{i}"), &[i]);
        }
        let mut job = BatchJob::export(
            "job_1",
            ExportJobContext {
                list_config: ListConfig {
                    take: 1,
                    ..ListConfig::default()
                },
                ..ExportJobContext::default()
            },
        );
        job.result.advancement_count = 2;
        fx.jobs.insert(job);

        let outcome = fx.strategy().process("job_1").unwrap();
        let result = outcome.result();
        assert_eq!(result.advancement_count, 3);
        assert_eq!(result.count, 3);
        let content = fx.read(result.file_key.as_deref().unwrap());
        assert_eq!(content.split_terminator("\r\n").count(), 2);
    }
}
