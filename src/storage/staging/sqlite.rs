//! `SQLite`-backed staging store.
//!
//! Lets the pre-process and commit phases of an import run in different
//! processes. Entries carry an absolute `expires_at` (Unix seconds); reads ignore
//! expired rows and [`SqliteStagingStore::purge_expired`] deletes them.

use crate::models::ParsedRow;
use crate::storage::connection::{acquire_lock, configure_connection, open_connection};
use crate::storage::metrics::{record_operation_metrics, status_label};
use crate::storage::traits::{
    DEFAULT_STAGING_TTL, OperationType, StagingStore, decode_rows, encode_rows, staging_key,
};
use crate::{Error, Result, current_timestamp};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::instrument;

/// `SQLite` [`StagingStore`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE staged_batches (
///     key TEXT PRIMARY KEY,      -- bij:<job_id>:<operation>
///     job_id TEXT NOT NULL,
///     payload TEXT NOT NULL,     -- JSON array of parsed rows
///     expires_at INTEGER NOT NULL
/// )
/// ```
pub struct SqliteStagingStore {
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    ttl: Duration,
}

impl SqliteStagingStore {
    /// Opens (or creates) a staging database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open_connection(&db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
            ttl,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory staging database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::operation("open_sqlite_in_memory", e))?;
        configure_connection(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
            ttl: DEFAULT_STAGING_TTL,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS staged_batches (
                key TEXT PRIMARY KEY,
                job_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_staged_batches_job ON staged_batches(job_id);
            CREATE INDEX IF NOT EXISTS idx_staged_batches_expiry ON staged_batches(expires_at);",
        )
        .map_err(|e| Error::operation("create_staged_batches_table", e))
    }

    /// Deletes every expired entry and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    #[instrument(skip(self))]
    pub fn purge_expired(&self) -> Result<usize> {
        let start = Instant::now();
        let result = acquire_lock(&self.conn)
            .execute(
                "DELETE FROM staged_batches WHERE expires_at <= ?1",
                params![to_sql_int(current_timestamp())],
            )
            .map_err(|e| Error::operation("purge_staged_batches", e));
        record_operation_metrics("sqlite", "purge", start, status_label(&result));
        result
    }

    fn expires_at(&self) -> i64 {
        to_sql_int(current_timestamp().saturating_add(self.ttl.as_secs()))
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl StagingStore for SqliteStagingStore {
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    fn put(&self, job_id: &str, op: OperationType, rows: &[ParsedRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let payload = encode_rows(rows)?;
        let result = acquire_lock(&self.conn)
            .execute(
                "INSERT INTO staged_batches (key, job_id, payload, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    payload = excluded.payload,
                    expires_at = excluded.expires_at",
                params![staging_key(job_id, op), job_id, payload, self.expires_at()],
            )
            .map(|_| ())
            .map_err(|e| Error::operation("put_staged_batch", e));
        record_operation_metrics("sqlite", "put", start, status_label(&result));
        result
    }

    #[instrument(skip(self))]
    fn get(&self, job_id: &str, op: OperationType) -> Result<Vec<ParsedRow>> {
        let start = Instant::now();
        let payload: Result<Option<String>> = acquire_lock(&self.conn)
            .query_row(
                "SELECT payload FROM staged_batches WHERE key = ?1 AND expires_at > ?2",
                params![staging_key(job_id, op), to_sql_int(current_timestamp())],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::operation("get_staged_batch", e));
        record_operation_metrics("sqlite", "get", start, status_label(&payload));

        payload?.map_or_else(|| Ok(Vec::new()), |p| decode_rows(&p))
    }

    #[instrument(skip(self))]
    fn clear(&self, job_id: &str) -> Result<()> {
        let start = Instant::now();
        let result = acquire_lock(&self.conn)
            .execute(
                "DELETE FROM staged_batches WHERE job_id = ?1",
                params![job_id],
            )
            .map(|_| ())
            .map_err(|e| Error::operation("clear_staged_batches", e));
        record_operation_metrics("sqlite", "clear", start, status_label(&result));
        result
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceRecord, paths};

    fn row(handle: &str) -> ParsedRow {
        let mut row = ParsedRow::new().with_text(paths::PRODUCT_HANDLE, handle);
        row.variant_prices.push(PriceRecord::currency("DKK", 110));
        row
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = SqliteStagingStore::in_memory().unwrap();
        store
            .put("job_1", OperationType::VariantCreate, &[row("a"), row("b")])
            .unwrap();

        let back = store.get("job_1", OperationType::VariantCreate).unwrap();
        assert_eq!(back, vec![row("a"), row("b")]);
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let store = SqliteStagingStore::in_memory().unwrap();
        store
            .put("job_1", OperationType::ProductCreate, &[row("a")])
            .unwrap();
        store
            .put("job_1", OperationType::ProductCreate, &[row("b")])
            .unwrap();

        let back = store.get("job_1", OperationType::ProductCreate).unwrap();
        assert_eq!(back, vec![row("b")]);
    }

    #[test]
    fn test_expired_entries_read_empty_and_purge() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStagingStore::new(dir.path().join("staging.db"), Duration::ZERO).unwrap();
        store
            .put("job_1", OperationType::ProductCreate, &[row("a")])
            .unwrap();

        assert!(
            store
                .get("job_1", OperationType::ProductCreate)
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.purge_expired().unwrap(), 1);
    }

    #[test]
    fn test_clear_removes_all_operations_of_job() {
        let store = SqliteStagingStore::in_memory().unwrap();
        for op in OperationType::ALL {
            store.put("job_1", op, &[row("a")]).unwrap();
        }
        store
            .put("job_2", OperationType::ProductCreate, &[row("b")])
            .unwrap();

        store.clear("job_1").unwrap();

        for op in OperationType::ALL {
            assert!(store.get("job_1", op).unwrap().is_empty());
        }
        assert_eq!(store.get("job_2", OperationType::ProductCreate).unwrap().len(), 1);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staging.db");
        {
            let store = SqliteStagingStore::new(&path, DEFAULT_STAGING_TTL).unwrap();
            store
                .put("job_1", OperationType::ProductUpdate, &[row("a")])
                .unwrap();
        }

        let reopened = SqliteStagingStore::new(&path, DEFAULT_STAGING_TTL).unwrap();
        assert_eq!(
            reopened.get("job_1", OperationType::ProductUpdate).unwrap(),
            vec![row("a")]
        );
    }
}
