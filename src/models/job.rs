//! Batch job records.
//!
//! The job lifecycle (creation, confirmation, scheduling) belongs to an external
//! store. The import and export strategies only read a job and write back its
//! `context` and `result`.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::product::ProductStatus;

/// What a batch job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchJobKind {
    /// Product import from a delimited file.
    ProductImport,
    /// Product export to a delimited file.
    ProductExport,
}

impl BatchJobKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProductImport => "product-import",
            Self::ProductExport => "product-export",
        }
    }
}

/// Lifecycle state of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    /// Created, not yet pre-processed.
    #[default]
    Created,
    /// Pre-process phase done.
    PreProcessed,
    /// Confirmed for processing by its owner.
    Confirmed,
    /// Commit phase running.
    Processing,
    /// Finished successfully.
    Completed,
    /// Canceled by its owner.
    Canceled,
    /// Failed.
    Failed,
}

impl BatchJobStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::PreProcessed => "pre_processed",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context of an import job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportJobContext {
    /// Key of the uploaded file in the file service.
    pub file_key: Option<String>,
    /// Number of staged operations.
    #[serde(default)]
    pub total: usize,
    /// Number of operations applied so far.
    #[serde(default)]
    pub progress: usize,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first.
    CreatedAtAsc,
    /// Newest first.
    #[default]
    CreatedAtDesc,
}

/// Paging and ordering of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Rows to skip.
    pub skip: usize,
    /// Maximum rows to return.
    pub take: usize,
    /// Ordering.
    #[serde(default)]
    pub order: SortOrder,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            skip: 0,
            take: 50,
            order: SortOrder::default(),
        }
    }
}

/// Filters applied to a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Restrict to these ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Restrict to these statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<ProductStatus>>,
    /// Restrict to one collection handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_handle: Option<String>,
    /// Free-text match on title and handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

/// Region part of a regional price column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionColumn {
    /// Region id.
    pub id: String,
    /// Region name.
    pub name: String,
    /// Region currency, used for the column header.
    pub currency_code: String,
}

/// Key of one export price column.
///
/// Exactly one of `currency_code` or `region` is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceColumn {
    /// Currency code for currency-only prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    /// Region for regional prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionColumn>,
}

impl PriceColumn {
    /// A currency-only column.
    #[must_use]
    pub fn currency(code: impl Into<String>) -> Self {
        Self {
            currency_code: Some(code.into().to_lowercase()),
            region: None,
        }
    }

    /// A regional column.
    #[must_use]
    pub fn region(
        id: impl Into<String>,
        name: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            currency_code: None,
            region: Some(RegionColumn {
                id: id.into(),
                name: name.into(),
                currency_code: currency_code.into().to_lowercase(),
            }),
        }
    }
}

/// Variable-width part of the export schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportShape {
    /// Max number of images on any product.
    pub dynamic_image_column_count: usize,
    /// Max number of options on any product.
    pub dynamic_option_column_count: usize,
    /// Distinct price columns, sorted.
    pub prices: Vec<PriceColumn>,
}

/// Context of an export job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportJobContext {
    /// Paging and ordering.
    #[serde(default)]
    pub list_config: ListConfig,
    /// Listing filters.
    #[serde(default)]
    pub filterable_fields: ProductFilter,
    /// Discovered shape, set by pre-processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ExportShape>,
    /// Optional cap on products written per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

/// Job context, one variant per job kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobContext {
    /// Import context.
    Import(ImportJobContext),
    /// Export context.
    Export(ExportJobContext),
}

/// Human-readable statistic attached to a job result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDescriptor {
    /// Machine key.
    pub key: String,
    /// Short label.
    pub name: String,
    /// Sentence describing the statistic.
    pub message: String,
}

/// Job result, written by the strategies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobResult {
    /// Total units of work.
    #[serde(default)]
    pub count: usize,
    /// Units of work done.
    #[serde(default)]
    pub advancement_count: usize,
    /// Fraction done, `0.0..=1.0`.
    #[serde(default)]
    pub progress: f64,
    /// Output file key (export).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
    /// Approximate output size in bytes (export).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Summary statistics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stat_descriptors: Vec<StatDescriptor>,
}

/// A batch job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    /// Job id.
    pub id: String,
    /// Job kind.
    pub kind: BatchJobKind,
    /// Lifecycle state.
    pub status: BatchJobStatus,
    /// Kind-specific context.
    pub context: JobContext,
    /// Result written by the strategies.
    #[serde(default)]
    pub result: JobResult,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl BatchJob {
    /// Creates an import job for an uploaded file.
    #[must_use]
    pub fn import(id: impl Into<String>, file_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BatchJobKind::ProductImport,
            status: BatchJobStatus::Created,
            context: JobContext::Import(ImportJobContext {
                file_key: Some(file_key.into()),
                ..ImportJobContext::default()
            }),
            result: JobResult::default(),
            created_at: Utc::now(),
        }
    }

    /// Creates an export job.
    #[must_use]
    pub fn export(id: impl Into<String>, context: ExportJobContext) -> Self {
        Self {
            id: id.into(),
            kind: BatchJobKind::ProductExport,
            status: BatchJobStatus::Created,
            context: JobContext::Export(context),
            result: JobResult::default(),
            created_at: Utc::now(),
        }
    }

    /// Returns the import context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if this is not an import job.
    pub fn import_context(&self) -> Result<&ImportJobContext> {
        match &self.context {
            JobContext::Import(ctx) => Ok(ctx),
            JobContext::Export(_) => Err(self.wrong_kind(BatchJobKind::ProductImport)),
        }
    }

    /// Returns the export context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if this is not an export job.
    pub fn export_context(&self) -> Result<&ExportJobContext> {
        match &self.context {
            JobContext::Export(ctx) => Ok(ctx),
            JobContext::Import(_) => Err(self.wrong_kind(BatchJobKind::ProductExport)),
        }
    }

    /// Returns whether the job was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.status == BatchJobStatus::Canceled
    }

    fn wrong_kind(&self, expected: BatchJobKind) -> Error {
        Error::InvalidInput(format!(
            "batch job {} is a {} job, expected {}",
            self.id,
            self.kind.as_str(),
            expected.as_str()
        ))
    }
}

/// Partial update of a batch job. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchJobUpdate {
    /// New status.
    pub status: Option<BatchJobStatus>,
    /// New context, replacing the old one.
    pub context: Option<JobContext>,
    /// New result, replacing the old one.
    pub result: Option<JobResult>,
}

impl BatchJobUpdate {
    /// Update that only sets the status.
    #[must_use]
    pub fn status(status: BatchJobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Update that only replaces the context.
    #[must_use]
    pub fn context(context: JobContext) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Update that only replaces the result.
    #[must_use]
    pub fn result(result: JobResult) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    /// Also replaces the result.
    #[must_use]
    pub fn with_result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Applies the update to a job in place.
    pub fn apply_to(self, job: &mut BatchJob) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(context) = self.context {
            job.context = context;
        }
        if let Some(result) = self.result {
            job.result = result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_accessors_check_kind() {
        let job = BatchJob::import("job_1", "uploads/products.csv");
        assert_eq!(
            job.import_context().unwrap().file_key.as_deref(),
            Some("uploads/products.csv")
        );
        assert!(job.export_context().is_err());
    }

    #[test]
    fn test_update_leaves_unset_fields() {
        let mut job = BatchJob::export("job_2", ExportJobContext::default());
        BatchJobUpdate::status(BatchJobStatus::Canceled).apply_to(&mut job);

        assert!(job.is_canceled());
        assert!(job.export_context().is_ok());
    }

    #[test]
    fn test_price_column_ordering_is_total() {
        let mut columns = vec![
            PriceColumn::region("reg_1", "Denmark", "DKK"),
            PriceColumn::currency("EUR"),
            PriceColumn::currency("dkk"),
        ];
        columns.sort();
        assert!(columns[0].region.is_some());
        assert_eq!(columns[1], PriceColumn::currency("dkk"));
        assert_eq!(columns[2], PriceColumn::currency("eur"));
    }

    #[test]
    fn test_job_context_serde_tagged() {
        let context = JobContext::Import(ImportJobContext::default());
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["kind"], "import");
    }
}
