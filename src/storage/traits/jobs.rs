//! Batch job store trait.

use crate::Result;
use crate::models::{BatchJob, BatchJobUpdate};

/// Store owning the batch job lifecycle record.
pub trait BatchJobStore: Send + Sync {
    /// Retrieves a job.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no such job exists.
    fn retrieve(&self, job_id: &str) -> Result<BatchJob>;

    /// Applies a partial update and returns the updated job.
    fn update(&self, job_id: &str, update: BatchJobUpdate) -> Result<BatchJob>;
}
