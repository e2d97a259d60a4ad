//! Import pipeline integration tests.
//!
//! Drives [`ProductImportStrategy`] through pre-process and commit against the
//! in-crate collaborators:
//! - schema validation failures are fatal before anything is staged
//! - the commit phase is all-or-nothing
//! - progress is checkpointed on a fixed cadence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use catalog_batch::Error;
use catalog_batch::io::ImportOptions;
use catalog_batch::models::{BatchJobStatus, JobContext};
use catalog_batch::storage::{BatchJobStore, CatalogBackend, OperationType};
use common::{HEADER, Harness};
use std::fmt::Write as _;

fn rows(count: usize) -> String {
    let mut content = HEADER.to_string();
    for i in 0..count {
        writeln!(content, "shirt;Shirt;V{i};SHIRT-{i};Size;S{i};{}", 100 + i).unwrap();
    }
    content
}

#[test]
fn test_missing_required_column_fails_before_staging() {
    let h = Harness::new();
    h.upload_import("job_1", "Product Title;Variant SKU\nShirt;SHIRT-S\n");

    let err = h.importer(ImportOptions::default()).pre_process("job_1").unwrap_err();
    match err {
        Error::SchemaValidation { line, message } => {
            assert_eq!(line, 1);
            assert!(message.contains("Product Handle"), "{message}");
        },
        other => panic!("unexpected error: {other}"),
    }
    assert!(h.staging.get("job_1", OperationType::ProductCreate).unwrap().is_empty());
}

#[test]
fn test_empty_required_value_reports_line() {
    let h = Harness::new();
    h.upload_import("job_1", &format!("{HEADER}shirt;Shirt;S;SHIRT-S;Size;S;100\n;Shirt;M;SHIRT-M;Size;M;110\n"));

    let err = h.importer(ImportOptions::default()).pre_process("job_1").unwrap_err();
    assert!(
        matches!(err, Error::SchemaValidation { line: 3, ref message } if message.contains("is required")),
        "{err}"
    );
}

#[test]
fn test_unknown_region_fails_pre_process() {
    let h = Harness::new();
    h.upload_import(
        "job_1",
        "Product Handle;Variant SKU;Price Narnia [EUR]\nshirt;SHIRT-S;100\n",
    );

    let err = h.importer(ImportOptions::default()).pre_process("job_1").unwrap_err();
    assert!(matches!(err, Error::InvalidData(ref m) if m.contains("Narnia")), "{err}");
}

#[test]
fn test_regional_price_resolves_to_region() {
    let h = Harness::new();
    let region = h.catalog.add_region("Denmark", "dkk");
    h.upload_import(
        "job_1",
        "Product Handle;Product Title;Variant SKU;Price Denmark [DKK]\nshirt;Shirt;SHIRT-S;1500\n",
    );
    let importer = h.importer(ImportOptions::default());
    importer.pre_process("job_1").unwrap();
    importer.process("job_1").unwrap();

    let product = h.catalog.retrieve_product_by_handle("shirt").unwrap().unwrap();
    let price = &product.variants[0].prices[0];
    assert_eq!(price.region_id.as_deref(), Some(region.id.as_str()));
    assert_eq!(price.currency_code, "dkk");
    assert_eq!(price.amount, 1500);
}

#[test]
fn test_failed_row_rolls_back_everything() {
    let h = Harness::new();
    // The second SKU collides with the first one.
    h.upload_import(
        "job_1",
        &format!("{HEADER}shirt;Shirt;S;SHIRT-S;Size;S;100\nshirt;Shirt;M;SHIRT-S;Size;M;110\n"),
    );
    let importer = h.importer(ImportOptions::default());
    importer.pre_process("job_1").unwrap();

    let err = importer.process("job_1").unwrap_err();
    match &err {
        Error::RowFailed {
            product_handle,
            variant_sku,
            ..
        } => {
            assert_eq!(product_handle, "shirt");
            assert_eq!(variant_sku, "SHIRT-S");
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.catalog.product_count(), 0);
    assert!(!h.catalog.in_transaction());
    // Staged batches survive a failed commit so it can be retried.
    assert_eq!(h.staging.get("job_1", OperationType::VariantCreate).unwrap().len(), 2);
}

#[test]
fn test_progress_checkpoints_every_batch() {
    let h = Harness::new();
    h.upload_import("job_1", &rows(249));
    let importer = h.importer(ImportOptions {
        progress_batch_size: 100,
        ..ImportOptions::default()
    });
    importer.pre_process("job_1").unwrap();
    let before = h.jobs.updates().len();

    let summary = importer.process("job_1").unwrap();
    assert_eq!(summary.total(), 250);

    let progress: Vec<usize> = h.jobs.updates()[before..]
        .iter()
        .filter_map(|update| match &update.context {
            Some(JobContext::Import(ctx)) => Some(ctx.progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![100, 200, 250]);

    let job = h.jobs.retrieve("job_1").unwrap();
    assert_eq!(job.result.advancement_count, 250);
    assert!((job.result.progress - 1.0).abs() < f64::EPSILON);
    // Strategies never move the job status.
    assert_eq!(job.status, BatchJobStatus::Created);
}

#[test]
fn test_second_file_updates_existing_product() {
    let h = Harness::new();
    h.upload_import("job_1", &format!("{HEADER}shirt;Shirt;S;SHIRT-S;Size;S;100\n"));
    let importer = h.importer(ImportOptions::default());
    importer.pre_process("job_1").unwrap();
    importer.process("job_1").unwrap();
    let product = h.catalog.retrieve_product_by_handle("shirt").unwrap().unwrap();

    h.upload_import(
        "job_2",
        &format!(
            "Product Id;Product Handle;Product Title;Variant SKU;Option 1 Name;Option 1 Value;Price DKK\n{};shirt;Better Shirt;SHIRT-M;Size;M;120\n",
            product.id
        ),
    );
    let summary = importer.pre_process("job_2").unwrap();
    assert_eq!(summary.product_update, 1);
    assert_eq!(summary.variant_create, 1);
    importer.process("job_2").unwrap();

    let product = h.catalog.retrieve_product_by_handle("shirt").unwrap().unwrap();
    assert_eq!(product.title, "Better Shirt");
    assert_eq!(product.variants.len(), 2);
    assert_eq!(h.catalog.product_count(), 1);
}

#[test]
fn test_expired_staging_applies_nothing() {
    let staging = std::sync::Arc::new(catalog_batch::storage::InMemoryStagingStore::new());
    let h = Harness::with_staging(staging.clone());
    h.upload_import("job_1", &format!("{HEADER}shirt;Shirt;S;SHIRT-S;Size;S;100\n"));
    let importer = h.importer(ImportOptions::default());
    importer.pre_process("job_1").unwrap();

    staging.expire_job("job_1");
    let summary = importer.process("job_1").unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(h.catalog.product_count(), 0);
}
