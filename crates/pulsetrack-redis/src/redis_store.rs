use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use pulsetrack_core::store::{Created, StoreError, TtlStore};

/// Redis-backed [`TtlStore`].
///
/// `create_if_absent` is a single `SET key value NX GET EX ttl` round trip:
/// Redis either sets the key and returns nil, or leaves the live entry in
/// place and returns its value. That one command is the atomic primitive the
/// gates rely on; there is no read-then-write anywhere in this store.
///
/// Every command is bounded by the configured timeout so a slow or
/// partitioned Redis surfaces as [`StoreError::Timeout`] instead of stalling
/// ingestion.
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connect to `url` and establish the managed connection.
    ///
    /// The connection manager reconnects on its own after transient drops;
    /// only the initial handshake is required to succeed here.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn, timeout })
    }

    async fn run<T: redis::FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, StoreError> {
        // ConnectionManager is a cheap handle over one multiplexed connection.
        let mut conn = self.conn.clone();
        match tokio::time::timeout(self.timeout, cmd.query_async::<T>(&mut conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout {
                elapsed_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl TtlStore for RedisStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Created, StoreError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key)
            .arg(value)
            .arg("NX")
            .arg("GET")
            .arg("EX")
            .arg(ttl.as_secs().max(1));
        let previous: Option<String> = self.run(cmd).await?;
        Ok(match previous {
            None => Created::Won,
            Some(current) => Created::Lost(current),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(cmd).await
    }

    async fn refresh(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut cmd = redis::cmd("EXPIRE");
        cmd.arg(key).arg(ttl.as_secs().max(1));
        let updated: i64 = self.run(cmd).await?;
        Ok(updated == 1)
    }
}
