//! Backend store trait for session records.

use crate::error::SessionResult;
use async_trait::async_trait;
use std::time::Duration;

/// Key-value backend holding encoded session records.
///
/// One key per session; the value is an opaque codec-encoded blob. A record
/// in the store always carries a TTL, so key absence is indistinguishable
/// from expiry, and both simply mean "no such session".
///
/// Implementations must keep absence and failure apart: `Ok(None)` from
/// [`get`](SessionStore::get) means the key does not exist, while any
/// communication problem is an `Err` the engine propagates untouched.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the record stored under `key`. `None` if absent or expired.
    async fn get(&self, key: &str) -> SessionResult<Option<Vec<u8>>>;

    /// Write `value` under `key` and (re)arm its expiry, as one combined write.
    async fn write(&self, key: &str, value: Vec<u8>, ttl: Duration) -> SessionResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> SessionResult<()>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &str) -> SessionResult<bool>;

    /// Reset the expiry window of `key`. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> SessionResult<bool>;

    /// Remaining lifetime of `key`, `None` if absent or unexpiring.
    async fn ttl(&self, key: &str) -> SessionResult<Option<Duration>>;

    /// Atomically claim `key` if and only if it does not exist.
    ///
    /// Returns `false` when the key was present or when a concurrent writer
    /// raced the claim; the caller retries with a different key. This is the
    /// store's optimistic-transaction primitive and the only operation the
    /// engine ever retries on.
    async fn insert_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration)
        -> SessionResult<bool>;
}
