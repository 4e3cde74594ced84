//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
///
/// `Unavailable` is deliberately distinct from `NotFound`: a key that is
/// legitimately absent from the cache falls back to a fresh session, while a
/// cache that cannot be reached must surface as a hard failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A key was not present in the session payload.
    #[error("Key not found in session: {0}")]
    NotFound(String),

    /// The backing store could not be reached or failed a command.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// Encoding a session record failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Decoding a session record or a stored value failed.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Invalid or conflicting configuration, rejected before any session is served.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session id allocation exhausted its defensive retry cap.
    #[error("Session id allocation failed: {0}")]
    IdAllocation(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<stowage_redis::RedisError> for SessionError {
    fn from(err: stowage_redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
