//! Storage layer.
//!
//! - **Traits** ([`traits`]): the collaborators the batch strategies talk to
//!   (entity catalog, files, job records, staging).
//! - **Staging** ([`staging`]): expiring hand-off between pre-process and commit.
//! - **Reference backends**: an in-memory catalog with JSON snapshots, an
//!   in-memory job store and a filesystem file service.

// Allow significant_drop_tightening - dropping locks slightly early provides no
// meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod catalog;
pub mod connection;
pub mod files;
pub mod jobs;
pub mod metrics;
pub mod staging;
pub mod traits;

pub use catalog::{CatalogSnapshot, InMemoryCatalog};
pub use files::LocalFileService;
pub use jobs::InMemoryJobStore;
pub use staging::{
    InMemoryStagingStore, RedisStagingStore, SqliteStagingStore, StagingBackendType,
    create_staging_store,
};
pub use traits::{
    BatchJobStore, CatalogBackend, DEFAULT_STAGING_TTL, FileService, IsolationLevel,
    OperationType, StagingStore, UploadDescriptor, UploadStream, staging_key, with_transaction,
};
