//! Redis-backed staging store.
//!
//! Batches are stored as JSON strings with `SET key value EX ttl`, so expiry is
//! enforced by Redis itself.

#[cfg(feature = "redis")]
mod implementation {
    use crate::models::ParsedRow;
    use crate::storage::metrics::{record_operation_metrics, status_label};
    use crate::storage::traits::{
        OperationType, StagingStore, decode_rows, encode_rows, staging_key,
    };
    use crate::{Error, Result};
    use redis::{Client, Connection};
    use std::time::{Duration, Instant};
    use tracing::instrument;

    /// Redis [`StagingStore`].
    pub struct RedisStagingStore {
        client: Client,
        ttl: Duration,
    }

    impl RedisStagingStore {
        /// Creates a store for the given connection URL.
        ///
        /// # Errors
        ///
        /// Returns an error if the URL is invalid.
        pub fn new(connection_url: &str, ttl: Duration) -> Result<Self> {
            let client = Client::open(connection_url).map_err(|e| Error::OperationFailed {
                operation: "redis_connect".to_string(),
                cause: e.to_string(),
            })?;
            Ok(Self { client, ttl })
        }

        fn get_connection(&self) -> Result<Connection> {
            self.client
                .get_connection()
                .map_err(|e| Error::operation("redis_get_connection", e))
        }
    }

    impl StagingStore for RedisStagingStore {
        #[instrument(skip(self, rows), fields(rows = rows.len()))]
        fn put(&self, job_id: &str, op: OperationType, rows: &[ParsedRow]) -> Result<()> {
            if rows.is_empty() {
                return Ok(());
            }
            let start = Instant::now();
            let payload = encode_rows(rows)?;
            let mut conn = self.get_connection()?;
            let result = redis::cmd("SET")
                .arg(staging_key(job_id, op))
                .arg(payload)
                .arg("EX")
                .arg(self.ttl.as_secs().max(1))
                .query::<()>(&mut conn)
                .map_err(|e| Error::operation("redis_put_staged_batch", e));
            record_operation_metrics("redis", "put", start, status_label(&result));
            result
        }

        #[instrument(skip(self))]
        fn get(&self, job_id: &str, op: OperationType) -> Result<Vec<ParsedRow>> {
            let start = Instant::now();
            let mut conn = self.get_connection()?;
            let payload = redis::cmd("GET")
                .arg(staging_key(job_id, op))
                .query::<Option<String>>(&mut conn)
                .map_err(|e| Error::operation("redis_get_staged_batch", e));
            record_operation_metrics("redis", "get", start, status_label(&payload));

            payload?.map_or_else(|| Ok(Vec::new()), |p| decode_rows(&p))
        }

        #[instrument(skip(self))]
        fn clear(&self, job_id: &str) -> Result<()> {
            let start = Instant::now();
            let keys: Vec<String> = OperationType::ALL
                .iter()
                .map(|op| staging_key(job_id, *op))
                .collect();
            let mut conn = self.get_connection()?;
            let result = redis::cmd("DEL")
                .arg(&keys)
                .query::<i64>(&mut conn)
                .map(|_| ())
                .map_err(|e| Error::operation("redis_clear_staged_batches", e));
            record_operation_metrics("redis", "clear", start, status_label(&result));
            result
        }

        fn backend_name(&self) -> &'static str {
            "redis"
        }
    }
}

#[cfg(feature = "redis")]
pub use implementation::RedisStagingStore;

#[cfg(not(feature = "redis"))]
mod stub {
    use crate::models::ParsedRow;
    use crate::storage::traits::{OperationType, StagingStore};
    use crate::{Error, Result};
    use std::time::Duration;

    /// Stub Redis staging store when the feature is not enabled.
    pub struct RedisStagingStore;

    impl RedisStagingStore {
        /// Creates a Redis staging store (stub).
        ///
        /// # Errors
        ///
        /// Always returns an error because the feature is not enabled.
        pub fn new(_connection_url: &str, _ttl: Duration) -> Result<Self> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }
    }

    impl StagingStore for RedisStagingStore {
        fn put(&self, _job_id: &str, _op: OperationType, _rows: &[ParsedRow]) -> Result<()> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn get(&self, _job_id: &str, _op: OperationType) -> Result<Vec<ParsedRow>> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn clear(&self, _job_id: &str) -> Result<()> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "redis"
        }
    }
}

#[cfg(not(feature = "redis"))]
pub use stub::RedisStagingStore;
