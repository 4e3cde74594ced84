//! Session lifecycle and the dict-like facade.
//!
//! Mutating operations apply their change to the in-memory payload and then
//! persist the whole record back to the store together with a fresh expiry
//! window. Read-only operations serve from the in-memory payload but still
//! reset the expiry, so any access counts as activity.
//!
//! Known limitation: mutating a value obtained from [`Session::get`] in
//! place cannot be observed by the facade. Call [`Session::mark_changed`]
//! afterwards to force a write-through of the current in-memory state.

use crate::codec::{Codec, SessionRecord};
use crate::error::{SessionError, SessionResult};
use crate::id::{self, IdGenerator};
use crate::store::SessionStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The in-memory attachment backing one live session identity.
pub(crate) struct SessionState {
    pub(crate) session_id: String,
    pub(crate) record: SessionRecord,
    pub(crate) new: bool,
}

/// A session either has a loaded/allocated state or was invalidated and
/// will lazily allocate a replacement on the next access.
enum Lifecycle {
    Attached(SessionState),
    Detached,
}

/// One client's server-side session.
///
/// Owned by a single logical unit of work (one request); at most one state
/// is attached at a time. Obtained from a
/// [`SessionFactory`](crate::SessionFactory).
pub struct Session {
    store: Arc<dyn SessionStore>,
    codec: Arc<dyn Codec>,
    id_generator: Arc<dyn IdGenerator>,
    default_timeout: u64,
    lifecycle: Lifecycle,
}

impl Session {
    pub(crate) fn attached(
        store: Arc<dyn SessionStore>,
        codec: Arc<dyn Codec>,
        id_generator: Arc<dyn IdGenerator>,
        default_timeout: u64,
        session_id: String,
        record: SessionRecord,
        new: bool,
    ) -> Self {
        Self {
            store,
            codec,
            id_generator,
            default_timeout,
            lifecycle: Lifecycle::Attached(SessionState {
                session_id,
                record,
                new,
            }),
        }
    }

    /// Access the attached state, allocating a replacement session first if
    /// the previous one was invalidated.
    async fn state_mut(&mut self) -> SessionResult<&mut SessionState> {
        if let Lifecycle::Detached = self.lifecycle {
            let (session_id, record) = id::allocate(
                &*self.store,
                &*self.codec,
                self.default_timeout,
                &*self.id_generator,
            )
            .await?;
            debug!(session_id = %session_id, "allocated replacement session after invalidation");
            self.lifecycle = Lifecycle::Attached(SessionState {
                session_id,
                record,
                new: true,
            });
        }

        match &mut self.lifecycle {
            Lifecycle::Attached(state) => Ok(state),
            Lifecycle::Detached => unreachable!("state attached above"),
        }
    }

    /// Write the whole record and re-arm its expiry, as one combined write.
    async fn persist(&mut self) -> SessionResult<()> {
        let (session_id, bytes, timeout) = {
            let Lifecycle::Attached(state) = &self.lifecycle else {
                return Ok(());
            };
            (
                state.session_id.clone(),
                self.codec.encode(&state.record)?,
                state.record.timeout,
            )
        };
        self.store
            .write(&session_id, bytes, Duration::from_secs(timeout))
            .await
    }

    /// Reset the record's expiry window without rewriting it.
    async fn refresh(&mut self) -> SessionResult<()> {
        let (session_id, timeout) = {
            let Lifecycle::Attached(state) = &self.lifecycle else {
                return Ok(());
            };
            (state.session_id.clone(), state.record.timeout)
        };
        self.store
            .expire(&session_id, Duration::from_secs(timeout))
            .await?;
        Ok(())
    }

    // ========== Identity ==========

    /// The session id. Allocates a fresh session if invalidated.
    pub async fn id(&mut self) -> SessionResult<String> {
        Ok(self.state_mut().await?.session_id.clone())
    }

    /// Creation time in float seconds since the epoch.
    pub async fn created(&mut self) -> SessionResult<f64> {
        Ok(self.state_mut().await?.record.created)
    }

    /// Current inactivity timeout in seconds.
    pub async fn timeout(&mut self) -> SessionResult<u64> {
        Ok(self.state_mut().await?.record.timeout)
    }

    /// Whether this session was freshly allocated rather than loaded from a
    /// presented id.
    pub async fn is_new(&mut self) -> SessionResult<bool> {
        Ok(self.state_mut().await?.new)
    }

    /// Whether the session is currently invalidated with no backing state.
    ///
    /// Introspection only; does not trigger allocation.
    pub fn is_detached(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Detached)
    }

    /// Delete the backing record and detach.
    ///
    /// Idempotent: invalidating an already-detached session does nothing,
    /// and no replacement is allocated until the next access.
    pub async fn invalidate(&mut self) -> SessionResult<()> {
        if let Lifecycle::Attached(state) = &self.lifecycle {
            self.store.delete(&state.session_id).await?;
            debug!(session_id = %state.session_id, "session invalidated");
            self.lifecycle = Lifecycle::Detached;
        }
        Ok(())
    }

    /// Permanently change this session's inactivity timeout.
    ///
    /// Persists immediately; every later persist or refresh uses the new
    /// window.
    pub async fn adjust_timeout(&mut self, timeout_secs: u64) -> SessionResult<()> {
        let state = self.state_mut().await?;
        state.record.timeout = timeout_secs;
        self.persist().await
    }

    // ========== Mutating operations (write-through) ==========

    /// Set `key` to `value`.
    pub async fn insert(&mut self, key: &str, value: impl Serialize) -> SessionResult<()> {
        let value = serde_json::to_value(value)?;
        let state = self.state_mut().await?;
        state.record.managed_dict.insert(key.to_string(), value);
        self.persist().await
    }

    /// Delete `key`. Fails with [`SessionError::NotFound`] if absent.
    pub async fn remove(&mut self, key: &str) -> SessionResult<()> {
        let state = self.state_mut().await?;
        if state.record.managed_dict.remove(key).is_none() {
            return Err(SessionError::NotFound(key.to_string()));
        }
        self.persist().await
    }

    /// Remove and return the value under `key`. Fails with
    /// [`SessionError::NotFound`] if absent.
    pub async fn pop<T: DeserializeOwned>(&mut self, key: &str) -> SessionResult<T> {
        let state = self.state_mut().await?;
        let value = state
            .record
            .managed_dict
            .remove(key)
            .ok_or_else(|| SessionError::NotFound(key.to_string()))?;
        self.persist().await?;
        serde_json::from_value(value).map_err(|e| SessionError::Deserialization(e.to_string()))
    }

    /// Remove and return the value under `key`, or `default` if absent.
    pub async fn pop_or<T: DeserializeOwned>(&mut self, key: &str, default: T) -> SessionResult<T> {
        let state = self.state_mut().await?;
        let taken = state.record.managed_dict.remove(key);
        self.persist().await?;
        match taken {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| SessionError::Deserialization(e.to_string())),
            None => Ok(default),
        }
    }

    /// Insert `default` under `key` only if absent; return the effective
    /// value either way.
    pub async fn set_default<T: Serialize + DeserializeOwned>(
        &mut self,
        key: &str,
        default: T,
    ) -> SessionResult<T> {
        let default = serde_json::to_value(default)?;
        let state = self.state_mut().await?;
        let effective = state
            .record
            .managed_dict
            .entry(key.to_string())
            .or_insert(default)
            .clone();
        self.persist().await?;
        serde_json::from_value(effective).map_err(|e| SessionError::Deserialization(e.to_string()))
    }

    /// Merge `entries` into the payload.
    pub async fn update<I>(&mut self, entries: I) -> SessionResult<()>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let state = self.state_mut().await?;
        state.record.managed_dict.extend(entries);
        self.persist().await
    }

    /// Remove and return some entry. Fails with [`SessionError::NotFound`]
    /// when the payload is empty.
    pub async fn pop_item(&mut self) -> SessionResult<(String, Value)> {
        let state = self.state_mut().await?;
        let key = state
            .record
            .managed_dict
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| SessionError::NotFound("session payload is empty".to_string()))?;
        let value = state.record.managed_dict.remove(&key).unwrap_or(Value::Null);
        self.persist().await?;
        Ok((key, value))
    }

    /// Remove every entry from the payload.
    pub async fn clear(&mut self) -> SessionResult<()> {
        let state = self.state_mut().await?;
        state.record.managed_dict.clear();
        self.persist().await
    }

    /// Force a write-through of the current in-memory state.
    ///
    /// The escape hatch for in-place mutation of nested values, which the
    /// facade cannot observe on its own.
    pub async fn mark_changed(&mut self) -> SessionResult<()> {
        self.state_mut().await?;
        self.persist().await
    }

    // ========== Read-only operations (expiry refresh) ==========

    /// Get the value under `key`, if any.
    pub async fn get<T: DeserializeOwned>(&mut self, key: &str) -> SessionResult<Option<T>> {
        let value = {
            let state = self.state_mut().await?;
            state.record.managed_dict.get(key).cloned()
        };
        self.refresh().await?;
        match value {
            Some(value) => Ok(Some(
                serde_json::from_value(value)
                    .map_err(|e| SessionError::Deserialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Get the value under `key`. Fails with [`SessionError::NotFound`] if
    /// absent.
    pub async fn require<T: DeserializeOwned>(&mut self, key: &str) -> SessionResult<T> {
        self.get(key)
            .await?
            .ok_or_else(|| SessionError::NotFound(key.to_string()))
    }

    /// Whether `key` is present.
    pub async fn contains(&mut self, key: &str) -> SessionResult<bool> {
        let present = self.state_mut().await?.record.managed_dict.contains_key(key);
        self.refresh().await?;
        Ok(present)
    }

    /// All payload keys.
    pub async fn keys(&mut self) -> SessionResult<Vec<String>> {
        let keys = {
            let state = self.state_mut().await?;
            state.record.managed_dict.keys().cloned().collect()
        };
        self.refresh().await?;
        Ok(keys)
    }

    /// All payload values.
    pub async fn values(&mut self) -> SessionResult<Vec<Value>> {
        let values = {
            let state = self.state_mut().await?;
            state.record.managed_dict.values().cloned().collect()
        };
        self.refresh().await?;
        Ok(values)
    }

    /// All payload entries.
    pub async fn entries(&mut self) -> SessionResult<Vec<(String, Value)>> {
        let entries = {
            let state = self.state_mut().await?;
            state
                .record
                .managed_dict
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        self.refresh().await?;
        Ok(entries)
    }

    /// Number of payload entries.
    pub async fn len(&mut self) -> SessionResult<usize> {
        let len = self.state_mut().await?.record.managed_dict.len();
        self.refresh().await?;
        Ok(len)
    }

    /// Whether the payload is empty.
    pub async fn is_empty(&mut self) -> SessionResult<bool> {
        Ok(self.len().await? == 0)
    }
}
