//! In-memory batch job store.

use crate::models::{BatchJob, BatchJobStatus, BatchJobUpdate};
use crate::storage::connection::acquire_lock;
use crate::storage::traits::BatchJobStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// [`BatchJobStore`] keeping jobs in a map.
///
/// Shared behind an `Arc` so a signal handler can cancel a job while a strategy
/// is processing it.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, BatchJob>>,
}

impl InMemoryJobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a job.
    pub fn insert(&self, job: BatchJob) {
        acquire_lock(&self.jobs).insert(job.id.clone(), job);
    }

    /// Marks a job canceled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such job exists.
    pub fn cancel(&self, job_id: &str) -> Result<BatchJob> {
        self.update(job_id, BatchJobUpdate::status(BatchJobStatus::Canceled))
    }

    /// Moves a job to `status`, leaving a canceled job canceled.
    ///
    /// Check and write happen under one lock, so a concurrent [`Self::cancel`]
    /// is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such job exists.
    pub fn transition(&self, job_id: &str, status: BatchJobStatus) -> Result<BatchJob> {
        let mut jobs = acquire_lock(&self.jobs);
        let job = jobs.get_mut(job_id).ok_or_else(|| Error::NotFound {
            entity: "batch job",
            id: job_id.to_string(),
        })?;
        if !job.is_canceled() {
            job.status = status;
        }
        Ok(job.clone())
    }
}

impl BatchJobStore for InMemoryJobStore {
    fn retrieve(&self, job_id: &str) -> Result<BatchJob> {
        acquire_lock(&self.jobs)
            .get(job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                entity: "batch job",
                id: job_id.to_string(),
            })
    }

    fn update(&self, job_id: &str, update: BatchJobUpdate) -> Result<BatchJob> {
        let mut jobs = acquire_lock(&self.jobs);
        let job = jobs.get_mut(job_id).ok_or_else(|| Error::NotFound {
            entity: "batch job",
            id: job_id.to_string(),
        })?;
        update.apply_to(job);
        Ok(job.clone())
    }
}
