//! Session engine configuration.

use crate::codec::{Codec, JsonCodec};
use crate::error::{SessionError, SessionResult};
use crate::id::{HashedIdGenerator, IdGenerator, PrefixedIdGenerator};
use std::sync::Arc;

/// Default inactivity timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1200;

/// Session engine configuration.
///
/// Connection parameters for the backing store belong to the store's own
/// config; cookie signing belongs to the transport layer. This only
/// configures the engine itself.
#[derive(Clone)]
pub struct SessionConfig {
    /// Seconds of inactivity before a session expires. Default 1200.
    pub timeout: u64,
    /// Optional fixed prefix for generated session keys.
    pub key_prefix: Option<String>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    codec: Arc<dyn Codec>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            key_prefix: None,
            id_generator: None,
            codec: Arc::new(JsonCodec),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("timeout", &self.timeout)
            .field("key_prefix", &self.key_prefix)
            .field("custom_id_generator", &self.id_generator.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `SESSION_TIMEOUT` (seconds) and `SESSION_KEY_PREFIX`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("SESSION_TIMEOUT")
            && let Ok(secs) = timeout.parse()
        {
            config.timeout = secs;
        }

        if let Ok(prefix) = std::env::var("SESSION_KEY_PREFIX") {
            config.key_prefix = Some(prefix);
        }

        config
    }

    /// Set the inactivity timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    /// Prefix generated session keys with a fixed namespace.
    ///
    /// Mutually exclusive with [`with_id_generator`](Self::with_id_generator):
    /// the prefix is itself an id-generation strategy.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Supply a custom id generator.
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Supply a custom record codec.
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Validate and resolve into the pieces the factory needs.
    ///
    /// Fails fast with [`SessionError::Configuration`] before any session is
    /// served.
    pub(crate) fn into_parts(self) -> SessionResult<(Arc<dyn Codec>, Arc<dyn IdGenerator>, u64)> {
        if self.timeout == 0 {
            return Err(SessionError::Configuration(
                "timeout must be a positive number of seconds".to_string(),
            ));
        }

        let generator: Arc<dyn IdGenerator> = match (self.key_prefix, self.id_generator) {
            (Some(_), Some(_)) => {
                return Err(SessionError::Configuration(
                    "cannot combine a key prefix with a custom id generator".to_string(),
                ));
            }
            (Some(prefix), None) => Arc::new(PrefixedIdGenerator::new(prefix)),
            (None, Some(generator)) => generator,
            (None, None) => Arc::new(HashedIdGenerator),
        };

        Ok((self.codec, generator, self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout, 1200);
        assert!(config.key_prefix.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = match SessionConfig::new().with_timeout(0).into_parts() {
            Ok(_) => panic!("expected configuration error"),
            Err(e) => e,
        };
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn test_prefix_and_generator_conflict() {
        let err = match SessionConfig::new()
            .with_key_prefix("app:")
            .with_id_generator(Arc::new(HashedIdGenerator))
            .into_parts()
        {
            Ok(_) => panic!("expected configuration error"),
            Err(e) => e,
        };
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn test_prefix_folds_into_generator() {
        let (_, generator, _) = SessionConfig::new()
            .with_key_prefix("app:")
            .into_parts()
            .unwrap();
        assert!(generator.generate().starts_with("app:"));
    }
}
