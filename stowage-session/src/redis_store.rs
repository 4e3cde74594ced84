//! Redis-backed session store.

use crate::error::SessionResult;
use crate::store::SessionStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stowage_redis::{RedisConfig, RedisService};

/// Session store over a pooled Redis connection.
///
/// Delegates straight to [`RedisService`]; the session id is the cache key,
/// no compound key scheme. All command failures surface as
/// [`SessionError::Unavailable`](crate::SessionError::Unavailable).
pub struct RedisSessionStore {
    redis: Arc<RedisService>,
}

impl RedisSessionStore {
    /// Connect a new store.
    pub async fn new(config: RedisConfig) -> SessionResult<Self> {
        let redis = RedisService::new(config).await?;
        Ok(Self {
            redis: Arc::new(redis),
        })
    }

    /// Wrap an already-connected service, e.g. one shared with other
    /// subsystems through dependency injection.
    pub fn from_service(redis: Arc<RedisService>) -> Self {
        Self { redis }
    }

    /// The underlying Redis service.
    pub fn service(&self) -> &RedisService {
        &self.redis
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        Ok(self.redis.get_value(key).await?)
    }

    async fn write(&self, key: &str, value: Vec<u8>, ttl: Duration) -> SessionResult<()> {
        Ok(self.redis.write_with_ttl(key, value, ttl).await?)
    }

    async fn delete(&self, key: &str) -> SessionResult<()> {
        self.redis.delete(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> SessionResult<bool> {
        Ok(self.redis.exists(key).await?)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> SessionResult<bool> {
        Ok(self.redis.expire(key, ttl).await?)
    }

    async fn ttl(&self, key: &str) -> SessionResult<Option<Duration>> {
        Ok(self.redis.ttl(key).await?)
    }

    async fn insert_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> SessionResult<bool> {
        Ok(self.redis.insert_if_absent(key, value, ttl).await?)
    }
}
