//! In-memory staging store.
//!
//! Keeps staged batches in a map with per-entry deadlines. Intended for tests and
//! single-process runs where pre-process and commit happen in the same process.

use crate::Result;
use crate::models::ParsedRow;
use crate::storage::connection::acquire_lock;
use crate::storage::traits::{
    DEFAULT_STAGING_TTL, OperationType, StagingStore, decode_rows, encode_rows, staging_key,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry {
    payload: String,
    expires_at: Instant,
}

/// In-memory [`StagingStore`] with manual expiry.
///
/// Entries are stored serialized, as every other backend stores them, so a
/// batch read back is a fresh copy.
#[derive(Debug)]
pub struct InMemoryStagingStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for InMemoryStagingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStagingStore {
    /// Creates a store with the default one hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_STAGING_TTL)
    }

    /// Creates a store with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Expires every entry of `job_id` immediately.
    pub fn expire_job(&self, job_id: &str) {
        let prefix = job_prefix(job_id);
        let now = Instant::now();
        let mut entries = acquire_lock(&self.entries);
        for (_, entry) in entries.iter_mut().filter(|(k, _)| k.starts_with(&prefix)) {
            entry.expires_at = now;
        }
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        acquire_lock(&self.entries)
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// Returns whether there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn job_prefix(job_id: &str) -> String {
    format!("bij:{job_id}:")
}

impl StagingStore for InMemoryStagingStore {
    fn put(&self, job_id: &str, op: OperationType, rows: &[ParsedRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let payload = encode_rows(rows)?;
        acquire_lock(&self.entries).insert(
            staging_key(job_id, op),
            Entry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    fn get(&self, job_id: &str, op: OperationType) -> Result<Vec<ParsedRow>> {
        let key = staging_key(job_id, op);
        let mut entries = acquire_lock(&self.entries);
        let Some(entry) = entries.get(&key) else {
            return Ok(Vec::new());
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(&key);
            return Ok(Vec::new());
        }
        decode_rows(&entry.payload)
    }

    fn clear(&self, job_id: &str) -> Result<()> {
        let prefix = job_prefix(job_id);
        acquire_lock(&self.entries).retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paths;

    fn rows(handles: &[&str]) -> Vec<ParsedRow> {
        handles
            .iter()
            .map(|h| ParsedRow::new().with_text(paths::PRODUCT_HANDLE, *h))
            .collect()
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = InMemoryStagingStore::new();
        store
            .put("job_1", OperationType::ProductCreate, &rows(&["a", "b"]))
            .unwrap();

        let back = store.get("job_1", OperationType::ProductCreate).unwrap();
        assert_eq!(back, rows(&["a", "b"]));
        assert!(
            store
                .get("job_1", OperationType::ProductUpdate)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let store = InMemoryStagingStore::new();
        store.put("job_1", OperationType::VariantCreate, &[]).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_entry_reads_empty() {
        let store = InMemoryStagingStore::new();
        store
            .put("job_1", OperationType::VariantCreate, &rows(&["a"]))
            .unwrap();
        store.expire_job("job_1");

        assert!(
            store
                .get("job_1", OperationType::VariantCreate)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let store = InMemoryStagingStore::with_ttl(Duration::ZERO);
        store
            .put("job_1", OperationType::ProductCreate, &rows(&["a"]))
            .unwrap();
        assert!(
            store
                .get("job_1", OperationType::ProductCreate)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_clear_only_touches_one_job() {
        let store = InMemoryStagingStore::new();
        store
            .put("job_1", OperationType::ProductCreate, &rows(&["a"]))
            .unwrap();
        store
            .put("job_10", OperationType::ProductCreate, &rows(&["b"]))
            .unwrap();

        store.clear("job_1").unwrap();

        assert!(
            store
                .get("job_1", OperationType::ProductCreate)
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.len(), 1);
    }
}
