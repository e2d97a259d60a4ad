//! Benchmarks for the schema-driven row parser and classifier.
//!
//! Benchmark targets:
//! - Parsing: >50k rows/s on a wide file
//! - Parse + classify: dominated by parsing (catalog lookups are cached)

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs, clippy::panic)]

use catalog_batch::io::{OperationClassifier, RowParser, product_import_schema};
use catalog_batch::storage::InMemoryCatalog;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::fmt::Write as _;
use std::hint::black_box;
use std::time::Duration;

const HEADER: &str = "Product Handle;Product Title;Product Description;Product Tags;Product Weight;\
Variant Title;Variant SKU;Variant Inventory Quantity;Variant Allow backorder;\
Option 1 Name;Option 1 Value;Option 2 Name;Option 2 Value;Image 1 Url;\
Price Denmark [DKK];Price EUR";

/// Builds a file with `rows` variants spread over products of four variants each.
fn build_file(rows: usize) -> String {
    let mut content = String::with_capacity(rows * 160);
    content.push_str(HEADER);
    content.push('\n');
    for i in 0..rows {
        let product = i / 4;
        let _ = writeln!(
            content,
            "product-{product};Product {product};A fine product;summer,cotton;{};\
Variant {i};SKU-{i};{};false;Size;{};Color;Red;https://img.example/{product}.png;{};{}",
            250 + product % 100,
            i % 50,
            ["S", "M", "L", "XL"][i % 4],
            1000 + i,
            130 + i,
        );
    }
    content
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_parser");
    group.measurement_time(Duration::from_secs(5));
    let schema = product_import_schema();

    for rows in [100_usize, 1_000, 10_000] {
        let file = build_file(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("parse", rows), &file, |b, file| {
            b.iter(|| {
                let parser = RowParser::new(&schema, black_box(file.as_bytes()), b';')
                    .unwrap_or_else(|e| panic!("bad bench file: {e}"));
                parser.filter(Result::is_ok).count()
            });
        });
    }
    group.finish();
}

fn bench_parse_and_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_classify");
    group.measurement_time(Duration::from_secs(5));
    let schema = product_import_schema();
    let catalog = InMemoryCatalog::with_default_profile();
    catalog.add_region("Denmark", "dkk");

    for rows in [1_000_usize, 10_000] {
        let file = build_file(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("classify", rows), &file, |b, file| {
            b.iter(|| {
                let parser = RowParser::new(&schema, black_box(file.as_bytes()), b';')
                    .unwrap_or_else(|e| panic!("bad bench file: {e}"));
                OperationClassifier::new(&catalog)
                    .classify(parser)
                    .map(|batches| batches.total())
                    .unwrap_or_else(|e| panic!("classification failed: {e}"))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_parse_and_classify);
criterion_main!(benches);
