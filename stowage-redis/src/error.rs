//! Error types for the session cache client.

use thiserror::Error;

/// Result type for Redis operations.
pub type Result<T> = std::result::Result<T, RedisError>;

/// Failures talking to the session cache.
///
/// The session engine treats every variant the same way, as a fatal
/// store-unavailable condition; the split exists for logging and for
/// embedders that manage the connection themselves.
#[derive(Debug, Error)]
pub enum RedisError {
    /// Could not establish or keep a connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection pool refused or timed out a checkout.
    #[error("Pool error: {0}")]
    Pool(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A command exceeded the client's timeout.
    #[error("Operation timed out")]
    Timeout,

    /// Any other error reported by the Redis client.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RedisError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout | Self::Pool(_))
    }

    /// Check if this error indicates connection loss.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl<E> From<bb8::RunError<E>> for RedisError
where
    E: std::error::Error + 'static,
{
    fn from(err: bb8::RunError<E>) -> Self {
        Self::Pool(err.to_string())
    }
}
