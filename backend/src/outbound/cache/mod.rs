//! Redis-backed counter store.
//!
//! Counters are plain Redis integers bumped with `INCR`, which is atomic on
//! the server; no locking happens in-process. Connections come from a `bb8`
//! pool of multiplexed connections built lazily, so the service starts while
//! Redis is down and reports it through the health endpoint.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, AsyncCommands, RedisError};
use bb8_redis::RedisConnectionManager;
use tracing::debug;

use crate::domain::CounterKey;
use crate::domain::ports::{CounterStore, CounterStoreError};

/// Default pool size for the Redis connection pool.
const DEFAULT_MAX_SIZE: u32 = 16;

/// Redis implementation of the `CounterStore` port.
#[derive(Clone)]
pub struct RedisCounterStore {
    pool: Pool<RedisConnectionManager>,
    timeout: Duration,
}

impl RedisCounterStore {
    /// Build a lazily connecting store for `redis_url`.
    ///
    /// `timeout` bounds both pool checkout and each command.
    ///
    /// # Errors
    ///
    /// Returns [`CounterStoreError::Command`] when the URL cannot be parsed.
    pub fn new(redis_url: &str, timeout: Duration) -> Result<Self, CounterStoreError> {
        let manager = RedisConnectionManager::new(redis_url)
            .map_err(|err| CounterStoreError::command(format!("invalid redis url: {err}")))?;
        let pool = Pool::builder()
            .max_size(DEFAULT_MAX_SIZE)
            .connection_timeout(timeout)
            .build_unchecked(manager);
        Ok(Self { pool, timeout })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, CounterStoreError> {
        self.pool.get().await.map_err(map_run_error)
    }

    async fn timed<T, F>(&self, command: F) -> Result<T, CounterStoreError>
    where
        F: Future<Output = Result<T, CounterStoreError>> + Send,
    {
        tokio::time::timeout(self.timeout, command)
            .await
            .map_err(|_| CounterStoreError::unavailable("redis command timed out"))?
    }
}

fn map_redis_error(error: RedisError) -> CounterStoreError {
    debug!(kind = ?error.kind(), error = %error, "redis command failed");
    if error.is_io_error()
        || error.is_timeout()
        || error.is_connection_refusal()
        || error.is_connection_dropped()
    {
        CounterStoreError::unavailable(error.to_string())
    } else {
        CounterStoreError::command(error.to_string())
    }
}

fn map_run_error(error: RunError<RedisError>) -> CounterStoreError {
    match error {
        RunError::User(err) => CounterStoreError::unavailable(err.to_string()),
        RunError::TimedOut => {
            CounterStoreError::unavailable("timed out waiting for a redis connection")
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_and_get(&self, key: &CounterKey) -> Result<u64, CounterStoreError> {
        self.timed(async {
            let mut conn = self.connection().await?;
            let value: i64 = conn
                .incr(key.as_ref(), 1_i64)
                .await
                .map_err(map_redis_error)?;
            u64::try_from(value).map_err(|_| {
                CounterStoreError::command(format!("counter {key} holds a negative value"))
            })
        })
        .await
    }

    async fn ping(&self) -> Result<(), CounterStoreError> {
        self.timed(async {
            let mut conn = self.connection().await?;
            let reply: String = redis::cmd("PING")
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error)?;
            if reply == "PONG" {
                Ok(())
            } else {
                Err(CounterStoreError::command(format!(
                    "unexpected PING reply: {reply}"
                )))
            }
        })
        .await
    }
}
