//! Storage backend traits.

mod catalog;
mod files;
mod jobs;
mod staging;

pub use catalog::{CatalogBackend, IsolationLevel, with_transaction};
pub use files::{FileService, UploadDescriptor, UploadStream};
pub use jobs::BatchJobStore;
pub(crate) use staging::{decode_rows, encode_rows};
pub use staging::{DEFAULT_STAGING_TTL, OperationType, StagingStore, staging_key};
