//! Staging store trait.

use crate::Result;
use crate::models::ParsedRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default lifetime of a staged batch.
pub const DEFAULT_STAGING_TTL: Duration = Duration::from_secs(3600);

/// The four kinds of import operation batches.
///
/// Declaration order is the order the commit phase applies them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// New products.
    ProductCreate,
    /// Existing products.
    ProductUpdate,
    /// New variants.
    VariantCreate,
    /// Existing variants.
    VariantUpdate,
}

impl OperationType {
    /// All operation types in apply order.
    pub const ALL: [Self; 4] = [
        Self::ProductCreate,
        Self::ProductUpdate,
        Self::VariantCreate,
        Self::VariantUpdate,
    ];

    /// Returns the tag used in staging keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCreate => "product_create",
            Self::ProductUpdate => "product_update",
            Self::VariantCreate => "variant_create",
            Self::VariantUpdate => "variant_update",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the staging key for a job's operation batch.
#[must_use]
pub fn staging_key(job_id: &str, op: OperationType) -> String {
    format!("bij:{job_id}:{}", op.as_str())
}

/// Expiring key/value hand-off between the import pre-process and commit phases.
///
/// Implementations must treat an expired entry exactly like a missing one.
pub trait StagingStore: Send + Sync {
    /// Stores a batch under `(job_id, op)`, replacing any previous batch.
    ///
    /// An empty batch writes nothing.
    fn put(&self, job_id: &str, op: OperationType, rows: &[ParsedRow]) -> Result<()>;

    /// Reads the batch stored under `(job_id, op)`.
    ///
    /// Returns an empty vector if nothing is stored or the entry expired.
    fn get(&self, job_id: &str, op: OperationType) -> Result<Vec<ParsedRow>>;

    /// Removes every batch stored for `job_id`.
    fn clear(&self, job_id: &str) -> Result<()>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Serializes a batch for storage.
pub(crate) fn encode_rows(rows: &[ParsedRow]) -> Result<String> {
    serde_json::to_string(rows).map_err(|e| crate::Error::operation("encode_staged_rows", e))
}

/// Deserializes a stored batch.
pub(crate) fn decode_rows(payload: &str) -> Result<Vec<ParsedRow>> {
    serde_json::from_str(payload).map_err(|e| crate::Error::operation("decode_staged_rows", e))
}
