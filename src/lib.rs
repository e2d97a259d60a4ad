//! # catalog-batch
//!
//! Staged, schema-driven bulk import and export of product catalogs.
//!
//! Catalog records (products and their variants) move in and out of the system
//! through semicolon-delimited text files. Both directions run as two-phase batch
//! jobs:
//!
//! - **Import**: a cheap *pre-process* pass parses the file against a declarative
//!   column schema, classifies rows into create/update operation batches and parks
//!   them in an expiring staging store. A later *commit* pass applies the staged
//!   batches inside a single transaction, checkpointing progress as it goes.
//! - **Export**: a *pre-process* pass scans the catalog to discover the
//!   variable-width column shape (option, image and price columns). The *commit*
//!   pass streams one line per product variant, checkpointing after every page and
//!   honouring cancellation at page boundaries.
//!
//! Entity storage, file storage and the batch-job lifecycle record are external
//! collaborators expressed as traits in [`storage`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalog_batch::io::{BatchDependencies, ProductImportStrategy};
//! use catalog_batch::storage::create_staging_store;
//!
//! let deps = BatchDependencies::new(catalog, files, jobs);
//! let staging = create_staging_store(&config.staging)?;
//! let strategy = ProductImportStrategy::new(deps, staging, config.import_options());
//! let summary = strategy.pre_process(&job_id)?;
//! tracing::info!(total = summary.total(), "operations staged");
//! strategy.process(&job_id)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::BatchConfig;
pub use models::{
    BatchJob, BatchJobStatus, FieldValue, ParsedRow, Product, ProductVariant, Region,
};
pub use storage::{BatchJobStore, CatalogBackend, FileService, StagingStore};

/// Error type for catalog batch operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `SchemaValidation` | Required column missing from the header, required value empty, malformed cell |
/// | `InvalidData` | A region or option referenced by a row does not exist, contradictory price entry |
/// | `RowFailed` | Any failure while applying a staged row (wraps the cause with row identifiers) |
/// | `NotFound` | A job, file or entity requested from a collaborator does not exist |
/// | `InvalidInput` | Bad configuration or caller arguments |
/// | `OperationFailed` | I/O, serialization, database or transport errors |
/// | `FeatureNotEnabled` | A backend is configured without its compile-time feature |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The input file does not satisfy the column schema.
    ///
    /// Fatal to the whole pre-process phase.
    #[error("schema validation failed at line {line}: {message}")]
    SchemaValidation {
        /// 1-indexed line of the input file (the header is line 1).
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// A row references data that does not exist or contradicts itself.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Applying a staged row failed.
    ///
    /// Carries the identifiers of the offending row so the failure can be traced
    /// back to the input file.
    #[error(
        "error while processing row with product id: {product_id}, product handle: {product_handle}, variant id: {variant_id}, variant sku: {variant_sku}: {cause}"
    )]
    RowFailed {
        /// Product id of the row, or empty.
        product_id: String,
        /// Product handle of the row, or empty.
        product_handle: String,
        /// Variant id of the row, or empty.
        variant_id: String,
        /// Variant SKU of the row, or empty.
        variant_sku: String,
        /// The underlying error message.
        cause: String,
    },

    /// A requested record does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of record (batch job, file, product, ...).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for catalog batch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Returns the current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_millis() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::SchemaValidation {
            line: 3,
            message: "Product Handle is required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema validation failed at line 3: Product Handle is required"
        );
    }

    #[test]
    fn test_row_failed_display_names_row() {
        let err = Error::RowFailed {
            product_id: String::new(),
            product_handle: "shirt".to_string(),
            variant_id: String::new(),
            variant_sku: "SHIRT-S".to_string(),
            cause: "region missing".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("product handle: shirt"));
        assert!(display.contains("variant sku: SHIRT-S"));
        assert!(display.ends_with("region missing"));
    }
}
