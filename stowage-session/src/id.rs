//! Session id generation and allocation.

use crate::codec::{Codec, SessionRecord};
use crate::error::{SessionError, SessionResult};
use crate::store::SessionStore;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

/// Defensive cap on allocation attempts. Collisions in a 256-bit-derived id
/// space are negligible, so hitting this means the generator is broken.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 1000;

/// Produces candidate session ids.
///
/// Generators must be stateless and never repeat in practice; uniqueness is
/// enforced at claim time, not here.
pub trait IdGenerator: Send + Sync {
    /// Produce one candidate id.
    fn generate(&self) -> String;
}

/// Default generator: 20 bytes from the OS random source, double SHA-256,
/// hex-encoded. Yields a fixed-length 64 character opaque id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedIdGenerator;

impl IdGenerator for HashedIdGenerator {
    fn generate(&self) -> String {
        let mut rand_bytes = [0u8; 20];
        OsRng.fill_bytes(&mut rand_bytes);
        let digest = Sha256::digest(Sha256::digest(rand_bytes));
        hex::encode(digest)
    }
}

/// Generator that namespaces ids under a fixed prefix, for operators who
/// want session keys visually distinguishable in the cache.
#[derive(Debug, Clone)]
pub struct PrefixedIdGenerator {
    prefix: String,
    inner: HashedIdGenerator,
}

impl PrefixedIdGenerator {
    /// Create a generator producing `<prefix><hashed-id>` keys.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            inner: HashedIdGenerator,
        }
    }
}

impl IdGenerator for PrefixedIdGenerator {
    fn generate(&self) -> String {
        format!("{}{}", self.prefix, self.inner.generate())
    }
}

/// Allocate a fresh session id and create its empty record in the store.
///
/// Loops over candidates until a claim succeeds: each attempt encodes an
/// initialized empty record and offers it to the store's optimistic
/// insert-if-absent. A rejected claim, whether the key existed or a
/// concurrent allocator won the commit, is not an error; it just triggers
/// the next candidate. Returns the claimed id together with the record that
/// now backs it.
pub async fn allocate(
    store: &dyn SessionStore,
    codec: &dyn Codec,
    timeout: u64,
    generator: &dyn IdGenerator,
) -> SessionResult<(String, SessionRecord)> {
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let session_id = generator.generate();
        let record = SessionRecord::empty(timeout);
        let encoded = codec.encode(&record)?;

        if store
            .insert_if_absent(&session_id, encoded, Duration::from_secs(timeout))
            .await?
        {
            return Ok((session_id, record));
        }

        debug!(attempt, "session id collision, retrying with a fresh candidate");
    }

    Err(SessionError::IdAllocation(format!(
        "no unclaimed id after {MAX_ALLOCATION_ATTEMPTS} attempts; \
         the id generator is not producing unique ids"
    )))
}
