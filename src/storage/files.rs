//! Filesystem file service.
//!
//! File keys are relative, `/`-separated paths under a root directory.
//!
//! Uploads are written to `<key>.part` and renamed onto the key by
//! [`UploadStream::finish`], so a key only ever names a complete file.
//!
//! # Security
//!
//! Keys are validated before they touch the filesystem: absolute keys and keys
//! containing `..`, `\` or NUL are rejected, so a key can never escape the root.

use crate::storage::traits::{FileService, UploadDescriptor, UploadStream};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

/// [`FileService`] storing files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileService {
    root: PathBuf,
}

impl LocalFileService {
    /// Creates a service rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Error::operation("create_files_root", e))?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the on-disk path of a key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key is not a safe relative path.
    pub fn path_for(&self, file_key: &str) -> Result<PathBuf> {
        if !is_safe_key(file_key) {
            return Err(Error::InvalidInput(format!("unsafe file key: {file_key}")));
        }
        Ok(self.root.join(file_key))
    }

    /// Copies a local file into the store under `file_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unsafe or the copy fails.
    pub fn put_file(&self, source: &Path, file_key: &str) -> Result<String> {
        let target = self.path_for(file_key)?;
        ensure_parent(&target)?;
        fs::copy(source, &target).map_err(|e| Error::operation("put_file", e))?;
        tracing::debug!(file_key, source = %source.display(), "stored file");
        Ok(file_key.to_string())
    }
}

fn is_safe_key(key: &str) -> bool {
    if key.is_empty() || key.contains('\\') || key.contains('\0') {
        return false;
    }
    Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn part_path(path: &Path) -> PathBuf {
    let mut part = path.as_os_str().to_owned();
    part.push(PART_SUFFIX);
    PathBuf::from(part)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::operation("delete_file", e)),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::operation("create_file_dir", e))?;
    }
    Ok(())
}

const PART_SUFFIX: &str = ".part";

struct LocalUpload {
    writer: BufWriter<File>,
    part: PathBuf,
    target: PathBuf,
}

impl Write for LocalUpload {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl UploadStream for LocalUpload {
    fn finish(self: Box<Self>) -> Result<()> {
        let Self {
            writer,
            part,
            target,
        } = *self;
        let file = writer
            .into_inner()
            .map_err(|e| Error::operation("finish_upload", e.into_error()))?;
        file.sync_all()
            .map_err(|e| Error::operation("finish_upload", e))?;
        drop(file);
        fs::rename(&part, &target).map_err(|e| Error::operation("finish_upload", e))
    }
}

impl FileService for LocalFileService {
    fn open_download(&self, file_key: &str) -> Result<Box<dyn BufRead + Send>> {
        let path = self.path_for(file_key)?;
        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound {
                entity: "file",
                id: file_key.to_string(),
            }),
            Err(e) => Err(Error::operation("open_download", e)),
        }
    }

    fn open_upload(&self, name: &str, ext: &str) -> Result<UploadDescriptor> {
        let file_key = format!("{name}.{ext}");
        let path = self.path_for(&file_key)?;
        ensure_parent(&path)?;
        let part = part_path(&path);
        let file = File::create(&part).map_err(|e| Error::operation("open_upload", e))?;
        Ok(UploadDescriptor {
            file_key,
            stream: Box::new(LocalUpload {
                writer: BufWriter::new(file),
                part,
                target: path,
            }),
        })
    }

    fn delete(&self, file_key: &str) -> Result<()> {
        let path = self.path_for(file_key)?;
        remove_if_exists(&part_path(&path))?;
        remove_if_exists(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_upload_then_download() {
        let dir = TempDir::new().unwrap();
        let files = LocalFileService::new(dir.path()).unwrap();

        let mut upload = files.open_upload("exports/products/out", "csv").unwrap();
        assert_eq!(upload.file_key, "exports/products/out.csv");
        upload.stream.write_all(b"a;b\r\n").unwrap();
        upload.stream.finish().unwrap();

        let mut content = String::new();
        files
            .open_download("exports/products/out.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "a;b\r\n");
    }

    #[test]
    fn test_download_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let files = LocalFileService::new(dir.path()).unwrap();
        assert!(matches!(
            files.open_download("missing.csv"),
            Err(Error::NotFound { entity: "file", .. })
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let files = LocalFileService::new(dir.path()).unwrap();
        let upload = files.open_upload("tmp", "csv").unwrap();
        upload.stream.finish().unwrap();

        files.delete("tmp.csv").unwrap();
        files.delete("tmp.csv").unwrap();
        assert!(!dir.path().join("tmp.csv").exists());
    }

    #[test]
    fn test_unfinished_upload_is_invisible_until_deleted() {
        let dir = TempDir::new().unwrap();
        let files = LocalFileService::new(dir.path()).unwrap();

        let mut upload = files.open_upload("exports/partial", "csv").unwrap();
        upload.stream.write_all(b"a;b\r\n").unwrap();
        upload.stream.flush().unwrap();
        drop(upload);

        assert!(matches!(
            files.open_download("exports/partial.csv"),
            Err(Error::NotFound { .. })
        ));
        let part = dir.path().join("exports/partial.csv.part");
        assert!(part.exists());

        files.delete("exports/partial.csv").unwrap();
        assert!(!part.exists());
    }

    #[test]
    fn test_path_traversal_protection() {
        let dir = TempDir::new().unwrap();
        let files = LocalFileService::new(dir.path()).unwrap();

        assert!(files.path_for("../etc/passwd").is_err());
        assert!(files.path_for("/etc/passwd").is_err());
        assert!(files.path_for("a\\b").is_err());
        assert!(files.path_for("").is_err());
        assert!(files.path_for("uploads/products.csv").is_ok());
    }
}
