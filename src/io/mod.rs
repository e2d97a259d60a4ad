//! Staged, schema-driven product import and export.
//!
//! # Architecture
//!
//! | Module | Role |
//! |--------|------|
//! | [`columns`] | Header vocabulary shared by both directions |
//! | [`schema`] | Column schema and the streaming row parser |
//! | [`classifier`] | Rows to create/update operation batches |
//! | [`mapping`] | Rows to catalog inputs |
//! | [`export`] | Export shape discovery and column descriptors |
//! | [`services`] | The import and export strategies |
//!
//! # File format
//!
//! A header line followed by data lines, `;`-separated by default, with standard
//! double-quote quoting. Besides the static columns (`Product Handle`,
//! `Variant SKU`, ...) the following repeating columns are understood:
//!
//! | Header | Meaning |
//! |--------|---------|
//! | `Option <N> Name` | Title of the product's n-th option |
//! | `Option <N> Value` | The variant's value for that option |
//! | `Price <CODE>` | Variant price in a currency, e.g. `Price DKK` |
//! | `Price <Region> [<CODE>]` | Variant price in a region, e.g. `Price Denmark [DKK]` |
//! | `Image <N> Url` | The product's n-th image |

pub mod classifier;
pub mod columns;
pub mod export;
pub mod mapping;
pub mod schema;
pub mod services;

pub use classifier::{OperationBatches, OperationClassifier};
pub use export::{ExportColumnDescriptor, ShapeAccumulator, build_export_columns};
pub use schema::{ColumnDescriptor, ColumnSchema, RowParser, product_import_schema};
pub use services::{
    BatchDependencies, ExportOptions, ExportOutcome, ImportOptions, ImportSummary,
    ProductExportStrategy, ProductImportStrategy,
};
