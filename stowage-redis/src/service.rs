//! Redis service used by the session engine.

use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use crate::{
    pool::{self, RedisConnection, RedisPool},
    RedisConfig, RedisError, Result,
};

/// Redis service providing a connection pool and the key-value operations
/// the session engine relies on.
///
/// Sessions live as opaque blobs under one key each, so the surface here is
/// deliberately small: plain get/set/delete/exists plus TTL management and
/// the optimistic claim used during session-id allocation.
pub struct RedisService {
    config: RedisConfig,
    pool: RedisPool,
}

impl RedisService {
    /// Create a new Redis service.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = pool::connect(&config).await?;
        Ok(Self { config, pool })
    }

    /// Create from an existing pool.
    pub fn from_pool(config: RedisConfig, pool: RedisPool) -> Self {
        Self { config, pool }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    /// Get a connection from the pool.
    pub async fn get(&self) -> Result<RedisConnection<'_>> {
        let conn = self.pool.get().await?;
        Ok(RedisConnection::new(conn))
    }

    /// Check if the connection is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Get pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Get a value.
    pub async fn get_value<T: redis::FromRedisValue>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get().await?;
        let value: Option<T> = conn.get(key).await?;
        Ok(value)
    }

    /// Set a value.
    pub async fn set_value<T: redis::ToRedisArgs + redis::ToSingleRedisArg + Send + Sync>(
        &self,
        key: &str,
        value: T,
    ) -> Result<()> {
        let mut conn = self.get().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    /// Set a value with expiration.
    pub async fn set_ex<T: redis::ToRedisArgs + redis::ToSingleRedisArg + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let mut conn = self.get().await?;
        let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let deleted: u32 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    /// Check if a key exists.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    /// Set expiration on a key. Returns false if the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.get().await?;
        let result: bool = conn.expire(key, ttl.as_secs() as i64).await?;
        Ok(result)
    }

    /// Get TTL of a key. `None` means the key is absent or has no expiry.
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.get().await?;
        let ttl: i64 = conn.ttl(key).await?;
        if ttl < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(ttl as u64)))
        }
    }

    /// Write a value and its expiry as one MULTI/EXEC transaction.
    ///
    /// The session engine rewrites a whole session record on every mutation;
    /// bundling SET and EXPIRE keeps the record and its expiration window
    /// from ever being observed out of step.
    pub async fn write_with_ttl<T: redis::ToRedisArgs + redis::ToSingleRedisArg + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let mut conn = self.get().await?;
        let _: () = redis::pipe()
            .atomic()
            .set(key, value)
            .ignore()
            .expire(key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    /// Atomically claim a key that must not already exist.
    ///
    /// WATCHes the key, reads it, and only if absent commits a
    /// MULTI(SET, EXPIRE) transaction. Returns `false` when the key was
    /// already present or when EXEC aborted because a concurrent writer
    /// touched the watched key. Callers decide whether to retry with a
    /// different key; this method never retries.
    pub async fn insert_if_absent<T: redis::ToRedisArgs + redis::ToSingleRedisArg + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<bool> {
        let mut conn = self.get().await?;

        let _: () = redis::cmd("WATCH").arg(key).query_async(&mut *conn).await?;

        let existing: Option<Vec<u8>> = conn.get(key).await?;
        if existing.is_some() {
            // Clear the watch before the connection returns to the pool.
            let _: () = redis::cmd("UNWATCH").query_async(&mut *conn).await?;
            debug!(key, "claim skipped, key already present");
            return Ok(false);
        }

        // A nil reply means EXEC aborted: the watched key changed under us.
        let committed: Option<()> = redis::pipe()
            .atomic()
            .set(key, value)
            .ignore()
            .expire(key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut *conn)
            .await?;

        if committed.is_none() {
            debug!(key, "claim aborted, watched key changed");
        }
        Ok(committed.is_some())
    }
}

/// Connection pool statistics.
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total connections.
    pub connections: u32,
    /// Idle connections.
    pub idle_connections: u32,
}
