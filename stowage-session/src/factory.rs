//! Session factory.

use crate::codec::Codec;
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::id::{self, IdGenerator};
use crate::session::Session;
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::debug;

/// Builds [`Session`] objects over one store, codec and id generator.
///
/// The transport layer hands in the candidate id it recovered from the
/// request (or `None`) and re-encodes the resulting session's id into the
/// response; everything between those two points is this factory's job.
pub struct SessionFactory {
    store: Arc<dyn SessionStore>,
    codec: Arc<dyn Codec>,
    id_generator: Arc<dyn IdGenerator>,
    timeout: u64,
}

impl SessionFactory {
    /// Create a factory. Fails fast on invalid configuration.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> SessionResult<Self> {
        let (codec, id_generator, timeout) = config.into_parts()?;
        Ok(Self {
            store,
            codec,
            id_generator,
            timeout,
        })
    }

    /// The factory-wide default timeout in seconds.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Obtain the session for `candidate_id`, or a fresh one.
    ///
    /// A presented id whose record still exists attaches that record with
    /// `new == false`. A presented id with no record (expired, invalidated
    /// elsewhere) falls back to a fresh allocation; so does an absent id.
    /// Store failures propagate; only a legitimately missing key triggers
    /// the fallback.
    pub async fn session(&self, candidate_id: Option<&str>) -> SessionResult<Session> {
        if let Some(session_id) = candidate_id {
            if let Some(bytes) = self.store.get(session_id).await? {
                let record = self.codec.decode(&bytes)?;
                debug!(session_id = %session_id, "attached existing session");
                return Ok(Session::attached(
                    self.store.clone(),
                    self.codec.clone(),
                    self.id_generator.clone(),
                    self.timeout,
                    session_id.to_string(),
                    record,
                    false,
                ));
            }
            debug!(candidate = %session_id, "presented session id has no record, allocating fresh");
        }

        let (session_id, record) = id::allocate(
            &*self.store,
            &*self.codec,
            self.timeout,
            &*self.id_generator,
        )
        .await?;
        debug!(session_id = %session_id, "allocated new session");
        Ok(Session::attached(
            self.store.clone(),
            self.codec.clone(),
            self.id_generator.clone(),
            self.timeout,
            session_id,
            record,
            true,
        ))
    }
}
