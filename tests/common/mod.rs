//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use catalog_batch::io::{
    BatchDependencies, ExportOptions, ImportOptions, ProductExportStrategy, ProductImportStrategy,
};
use catalog_batch::models::{BatchJob, BatchJobUpdate};
use catalog_batch::storage::{
    BatchJobStore, FileService, InMemoryCatalog, InMemoryJobStore, InMemoryStagingStore,
    LocalFileService, StagingStore,
};
use catalog_batch::{Error, Result};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Header used by most import fixtures.
pub const HEADER: &str = "Product Handle;Product Title;Variant Title;Variant SKU;Option 1 Name;Option 1 Value;Price DKK\n";

/// Job store that records every update it receives.
///
/// It can also cancel the job or start failing after a given number of further
/// updates, to drive the page-boundary paths of an export.
#[derive(Default)]
pub struct RecordingJobStore {
    inner: InMemoryJobStore,
    updates: Mutex<Vec<BatchJobUpdate>>,
    cancel_at: Mutex<Option<usize>>,
    fail_from: Mutex<Option<usize>>,
}

impl RecordingJobStore {
    pub fn insert(&self, job: BatchJob) {
        self.inner.insert(job);
    }

    pub fn cancel(&self, job_id: &str) {
        self.inner.cancel(job_id).unwrap();
    }

    pub fn updates(&self) -> Vec<BatchJobUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Cancels the job right after the `n`-th update from now is applied.
    pub fn cancel_after_updates(&self, n: usize) {
        let seen = self.updates.lock().unwrap().len();
        *self.cancel_at.lock().unwrap() = Some(seen + n);
    }

    /// Rejects the `n`-th update from now and every later one.
    pub fn fail_updates_from(&self, n: usize) {
        let seen = self.updates.lock().unwrap().len();
        *self.fail_from.lock().unwrap() = Some(seen + n);
    }
}

impl BatchJobStore for RecordingJobStore {
    fn retrieve(&self, job_id: &str) -> Result<BatchJob> {
        self.inner.retrieve(job_id)
    }

    fn update(&self, job_id: &str, update: BatchJobUpdate) -> Result<BatchJob> {
        let n = {
            let mut updates = self.updates.lock().unwrap();
            let n = updates.len() + 1;
            if self.fail_from.lock().unwrap().is_some_and(|from| n >= from) {
                return Err(Error::operation("update_job", "job store unavailable"));
            }
            updates.push(update.clone());
            n
        };
        let job = self.inner.update(job_id, update)?;
        if *self.cancel_at.lock().unwrap() == Some(n) {
            return self.inner.cancel(job_id);
        }
        Ok(job)
    }
}

/// Catalog, files, jobs and staging wired together over a temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub catalog: Arc<InMemoryCatalog>,
    pub files: Arc<LocalFileService>,
    pub jobs: Arc<RecordingJobStore>,
    pub staging: Arc<dyn StagingStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_staging(Arc::new(InMemoryStagingStore::new()))
    }

    pub fn with_staging(staging: Arc<dyn StagingStore>) -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            files: Arc::new(LocalFileService::new(dir.path().join("files")).unwrap()),
            dir,
            catalog: Arc::new(InMemoryCatalog::with_default_profile()),
            jobs: Arc::new(RecordingJobStore::default()),
            staging,
        }
    }

    pub fn deps(&self) -> BatchDependencies {
        BatchDependencies::new(self.catalog.clone(), self.files.clone(), self.jobs.clone())
    }

    pub fn importer(&self, options: ImportOptions) -> ProductImportStrategy {
        ProductImportStrategy::new(self.deps(), self.staging.clone(), options)
    }

    pub fn exporter(&self, options: ExportOptions) -> ProductExportStrategy {
        ProductExportStrategy::new(self.deps(), options)
    }

    /// Uploads `content` and registers an import job for it.
    pub fn upload_import(&self, job_id: &str, content: &str) {
        let mut upload = self
            .files
            .open_upload(&format!("imports/{job_id}"), "csv")
            .unwrap();
        upload.stream.write_all(content.as_bytes()).unwrap();
        upload.stream.finish().unwrap();
        self.jobs.insert(BatchJob::import(job_id, upload.file_key));
    }

    /// Reads a stored file.
    pub fn read(&self, file_key: &str) -> String {
        let mut content = String::new();
        self.files
            .open_download(file_key)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }
}

/// Splits an export file into lines.
pub fn lines(content: &str) -> Vec<&str> {
    content.split_terminator("\r\n").collect()
}

/// Values of column `name` in an export file.
pub fn column<'a>(content: &'a str, name: &str) -> Vec<&'a str> {
    let lines = lines(content);
    let index = lines[0]
        .split(';')
        .position(|h| h == name)
        .unwrap_or_else(|| panic!("no column {name}"));
    lines[1..]
        .iter()
        .map(|line| line.split(';').nth(index).unwrap_or_default())
        .collect()
}
