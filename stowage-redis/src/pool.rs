//! Connection pooling for the session cache.

use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::aio::MultiplexedConnection;
use std::ops::{Deref, DerefMut};
use tracing::info;

use crate::{RedisConfig, RedisError, Result};

/// Type alias for the connection pool.
pub type RedisPool = Pool<RedisConnectionManager>;

/// A connection checked out of the pool for one cache operation.
pub struct RedisConnection<'a> {
    conn: PooledConnection<'a, RedisConnectionManager>,
}

impl<'a> RedisConnection<'a> {
    pub(crate) fn new(conn: PooledConnection<'a, RedisConnectionManager>) -> Self {
        Self { conn }
    }
}

impl<'a> Deref for RedisConnection<'a> {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<'a> DerefMut for RedisConnection<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Build and verify a connection pool for the given configuration.
///
/// The pool is PINGed once before being handed out, so a bad URL or an
/// unreachable server fails here instead of on the first session request.
pub async fn connect(config: &RedisConfig) -> Result<RedisPool> {
    let manager = RedisConnectionManager::new(config.connection_url())
        .map_err(|e| RedisError::Connection(e.to_string()))?;

    let pool = Pool::builder()
        .max_size(config.pool_size)
        .min_idle(config.min_idle)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .await
        .map_err(|e| RedisError::Pool(e.to_string()))?;

    {
        // Scope the probe connection so it is back in the pool before we return
        let mut conn = pool
            .get()
            .await
            .map_err(|e| RedisError::Pool(e.to_string()))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))?;
    }

    info!(
        pool_size = config.pool_size,
        url = %config.url,
        "session cache connection pool ready"
    );

    Ok(pool)
}
