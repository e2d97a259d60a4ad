//! File service trait.

use crate::Result;
use std::io::{BufRead, Write};

/// An open upload.
///
/// Bytes written are not guaranteed to be visible until [`UploadStream::finish`]
/// returns.
pub trait UploadStream: Write + Send {
    /// Flushes and completes the upload.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Descriptor returned when an upload is opened.
pub struct UploadDescriptor {
    /// Key under which the file will be stored.
    pub file_key: String,
    /// Stream to write the file content to.
    pub stream: Box<dyn UploadStream>,
}

impl std::fmt::Debug for UploadDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadDescriptor")
            .field("file_key", &self.file_key)
            .finish_non_exhaustive()
    }
}

/// Streaming access to uploaded and generated files.
pub trait FileService: Send + Sync {
    /// Opens a stored file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the key does not exist.
    fn open_download(&self, file_key: &str) -> Result<Box<dyn BufRead + Send>>;

    /// Opens a new file for writing under `name` with extension `ext`.
    fn open_upload(&self, name: &str, ext: &str) -> Result<UploadDescriptor>;

    /// Deletes a stored file. Deleting a missing file is not an error.
    fn delete(&self, file_key: &str) -> Result<()>;
}
