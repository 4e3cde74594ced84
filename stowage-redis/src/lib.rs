//! # Stowage Redis
//!
//! Pooled Redis client for the stowage session engine.
//!
//! ## Features
//!
//! - **Connection Pooling**: Efficient connection management with bb8
//! - **Atomic writes**: SET + EXPIRE committed as one transaction
//! - **Optimistic claims**: WATCH/MULTI/EXEC insert-if-absent, the primitive
//!   behind collision-free session-id allocation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stowage_redis::{RedisService, RedisConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::builder()
//!         .url("redis://localhost:6379")
//!         .pool_size(10)
//!         .build();
//!
//!     let redis = RedisService::new(config).await?;
//!
//!     // Write a record together with its expiration window
//!     redis
//!         .write_with_ttl("session-key", b"payload".as_slice(), Duration::from_secs(1200))
//!         .await?;
//!
//!     // Claim a key only if nobody else holds it
//!     let claimed = redis
//!         .insert_if_absent("candidate", b"fresh".as_slice(), Duration::from_secs(1200))
//!         .await?;
//!     assert!(claimed || !claimed);
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod pool;
mod service;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use error::{RedisError, Result};
pub use pool::{RedisConnection, RedisPool};
pub use service::{PoolStats, RedisService};

// Re-export redis crate for convenience
pub use redis;
pub use redis::{AsyncCommands, RedisResult, Value};

/// Prelude for common imports.
///
/// ```
/// use stowage_redis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::error::{RedisError, Result};
    pub use crate::pool::{RedisConnection, RedisPool};
    pub use crate::service::RedisService;
    pub use redis::AsyncCommands;
}
