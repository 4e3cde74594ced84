//! Session record and its wire codec.

use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// The unit persisted under one cache key.
///
/// The payload dict, creation time and timeout are always written together
/// as one encoded blob; persisting any single mutation rewrites the whole
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Application-visible session payload.
    pub managed_dict: HashMap<String, Value>,
    /// Creation time, seconds since epoch. Set once at allocation.
    pub created: f64,
    /// Seconds of inactivity before expiration. Mutable per session.
    pub timeout: u64,
}

impl SessionRecord {
    /// A freshly allocated, empty record.
    pub fn empty(timeout: u64) -> Self {
        Self {
            managed_dict: HashMap::new(),
            created: epoch_now(),
            timeout,
        }
    }
}

/// Current time as float seconds since the epoch.
pub(crate) fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Serializes session records to the opaque bytes stored in the cache.
///
/// The cache only ever sees codec output; swapping the codec changes the
/// stored representation without touching the engine.
pub trait Codec: Send + Sync {
    /// Encode a record for storage.
    fn encode(&self, record: &SessionRecord) -> SessionResult<Vec<u8>>;

    /// Decode a stored record.
    fn decode(&self, bytes: &[u8]) -> SessionResult<SessionRecord>;
}

/// JSON codec, the default storage representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, record: &SessionRecord) -> SessionResult<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> SessionResult<SessionRecord> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Deserialization(e.to_string()))
    }
}
