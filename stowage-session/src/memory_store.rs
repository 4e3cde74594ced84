//! In-memory session store.

use crate::error::SessionResult;
use crate::store::SessionStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-process session store with per-key expiry.
///
/// Deterministic substrate for tests and single-process development. Expiry
/// is checked lazily on access; the claim in
/// [`insert_if_absent`](SessionStore::insert_if_absent) is atomic because it
/// runs entirely under the write lock.
pub struct MemorySessionStore {
    data: Arc<RwLock<HashMap<String, StoreEntry>>>,
}

#[derive(Clone)]
struct StoreEntry {
    value: Vec<u8>,
    expires_at: tokio::time::Instant,
}

impl StoreEntry {
    fn is_expired(&self) -> bool {
        tokio::time::Instant::now() > self.expires_at
    }
}

impl MemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (unexpired) records.
    pub async fn len(&self) -> usize {
        let data = self.data.read().await;
        data.values().filter(|e| !e.is_expired()).count()
    }

    /// Whether the store holds no live records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        let data = self.data.read().await;
        match data.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn write(&self, key: &str, value: Vec<u8>, ttl: Duration) -> SessionResult<()> {
        let entry = StoreEntry {
            value,
            expires_at: tokio::time::Instant::now() + ttl,
        };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> SessionResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> SessionResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> SessionResult<bool> {
        let mut data = self.data.write().await;
        match data.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expires_at = tokio::time::Instant::now() + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> SessionResult<Option<Duration>> {
        let data = self.data.read().await;
        match data.get(key) {
            Some(entry) => {
                let now = tokio::time::Instant::now();
                if entry.expires_at > now {
                    Ok(Some(entry.expires_at - now))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    async fn insert_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> SessionResult<bool> {
        let mut data = self.data.write().await;
        match data.get(key) {
            Some(entry) if !entry.is_expired() => Ok(false),
            _ => {
                data.insert(
                    key.to_string(),
                    StoreEntry {
                        value,
                        expires_at: tokio::time::Instant::now() + ttl,
                    },
                );
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_get() {
        let store = MemorySessionStore::new();
        store
            .write("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_insert_if_absent_rejects_existing() {
        let store = MemorySessionStore::new();
        assert!(store
            .insert_if_absent("k", b"a".to_vec(), Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!store
            .insert_if_absent("k", b"b".to_vec(), Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(b"a".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemorySessionStore::new();
        store
            .write("k", b"v".to_vec(), Duration::from_secs(5))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
        // An expired key can be claimed again
        assert!(store
            .insert_if_absent("k", b"w".to_vec(), Duration::from_secs(5))
            .await
            .unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_resets_window() {
        let store = MemorySessionStore::new();
        store
            .write("k", b"v".to_vec(), Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(store.expire("k", Duration::from_secs(10)).await.unwrap());

        tokio::time::advance(Duration::from_secs(8)).await;
        // Still alive because the window was reset
        assert!(store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let store = MemorySessionStore::new();
        assert!(!store.expire("nope", Duration::from_secs(10)).await.unwrap());
    }
}
