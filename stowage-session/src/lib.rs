//! Server-side session storage over a key-value cache with expiration.
//!
//! A session is a dict-like payload persisted as one encoded record under
//! one cache key. Every mutation writes the whole record back immediately
//! and re-arms the expiration window; every read re-arms the window too, so
//! sessions expire only through inactivity.
//!
//! Session identity is claimed through the store's optimistic transaction
//! primitive: concurrent allocators can never both win the same candidate
//! id. Invalidation deletes the record and detaches the session; the next
//! access transparently allocates a replacement with a fresh id.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use stowage_session::{RedisSessionStore, SessionConfig, SessionFactory};
//! use stowage_redis::RedisConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RedisSessionStore::new(RedisConfig::new("redis://localhost:6379")).await?;
//!     let factory = SessionFactory::new(Arc::new(store), SessionConfig::default())?;
//!
//!     // The transport layer recovered no session id from the request
//!     let mut session = factory.session(None).await?;
//!     assert!(session.is_new().await?);
//!
//!     session.insert("user_id", 123).await?;
//!     let user_id: Option<i64> = session.get("user_id").await?;
//!     assert_eq!(user_id, Some(123));
//!
//!     // Log out: drop the record, next access gets a fresh identity
//!     session.invalidate().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! A session is request-scoped: one logical unit of work owns it, nothing
//! is shared. Cross-process races are resolved only at id allocation;
//! ordinary mutations are blind whole-record overwrites, so two requests
//! mutating the same session id race with last-writer-wins semantics.
//!
//! # Known limitation
//!
//! In-place mutation of a nested value obtained via [`Session::get`] is
//! invisible to the facade; call [`Session::mark_changed`] to force the
//! write-through.

pub mod codec;
pub mod config;
pub mod error;
pub mod extensions;
pub mod factory;
pub mod id;
pub mod memory_store;
pub mod session;
pub mod store;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use codec::{Codec, JsonCodec, SessionRecord};
pub use config::{SessionConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{SessionError, SessionResult};
pub use extensions::{CSRF_TOKEN_KEY, FLASH_KEY_PREFIX};
pub use factory::SessionFactory;
pub use id::{HashedIdGenerator, IdGenerator, PrefixedIdGenerator, MAX_ALLOCATION_ATTEMPTS};
pub use memory_store::MemorySessionStore;
pub use session::Session;
pub use store::SessionStore;

#[cfg(feature = "redis")]
pub use redis_store::RedisSessionStore;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::codec::{Codec, JsonCodec, SessionRecord};
    pub use crate::config::SessionConfig;
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::factory::SessionFactory;
    pub use crate::id::{HashedIdGenerator, IdGenerator};
    pub use crate::memory_store::MemorySessionStore;
    pub use crate::session::Session;
    pub use crate::store::SessionStore;

    #[cfg(feature = "redis")]
    pub use crate::redis_store::RedisSessionStore;
}
