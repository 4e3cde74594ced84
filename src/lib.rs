// Stowage - server-side sessions over Redis-style key-value caches.
//
// This library provides a dict-like session surface with write-through
// persistence, sliding expiration, and collision-free session-id
// allocation.

// Re-export the session engine
pub use stowage_session::*;

// Re-export the Redis client crate
#[cfg(feature = "redis")]
pub use stowage_redis;

// Prelude for common imports
pub mod prelude {
    pub use stowage_session::prelude::*;

    #[cfg(feature = "redis")]
    pub use stowage_redis::{RedisConfig, RedisService};
}
