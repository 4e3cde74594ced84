//! CSRF tokens and flash queues, built entirely on the session facade.

use crate::error::SessionResult;
use crate::session::Session;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;

/// Reserved payload key holding the CSRF token.
pub const CSRF_TOKEN_KEY: &str = "_csrft_";

/// Reserved payload key prefix for flash queues.
pub const FLASH_KEY_PREFIX: &str = "_f_";

/// Fixed-length hex token from the OS random source.
fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn flash_key(queue: &str) -> String {
    format!("{FLASH_KEY_PREFIX}{queue}")
}

impl Session {
    /// Generate, store and return a new CSRF token, replacing any existing
    /// one.
    pub async fn new_csrf_token(&mut self) -> SessionResult<String> {
        let token = generate_csrf_token();
        self.insert(CSRF_TOKEN_KEY, &token).await?;
        Ok(token)
    }

    /// Return the session's CSRF token, generating and persisting one on
    /// first call. Idempotent until the session is invalidated.
    pub async fn get_csrf_token(&mut self) -> SessionResult<String> {
        match self.get::<String>(CSRF_TOKEN_KEY).await? {
            Some(token) => Ok(token),
            None => self.new_csrf_token().await,
        }
    }

    /// Append `msg` to the named flash queue (`""` is the default queue).
    ///
    /// With `allow_duplicate` false the message is skipped when already
    /// queued. Always writes through: the queue is a nested list, so this
    /// goes via the mark-changed path rather than relying on the facade
    /// noticing the mutation.
    pub async fn flash(
        &mut self,
        msg: impl Serialize,
        queue: &str,
        allow_duplicate: bool,
    ) -> SessionResult<()> {
        let msg = serde_json::to_value(msg)?;
        let key = flash_key(queue);

        let mut queued: Vec<Value> = self.set_default(&key, Vec::new()).await?;
        if allow_duplicate || !queued.contains(&msg) {
            queued.push(msg);
        }
        self.insert(&key, queued).await
    }

    /// Return the named queue's messages without consuming them.
    pub async fn peek_flash(&mut self, queue: &str) -> SessionResult<Vec<Value>> {
        Ok(self.get(&flash_key(queue)).await?.unwrap_or_default())
    }

    /// Remove and return the named queue's messages. An absent queue yields
    /// an empty list, never an error.
    pub async fn pop_flash(&mut self, queue: &str) -> SessionResult<Vec<Value>> {
        self.pop_or(&flash_key(queue), Vec::new()).await
    }
}
