//! # Portico Cache
//!
//! Fixed-window counters for the rate limiter, behind [`RateLimitStore`].
//!
//! - [`MemoryRateLimitStore`]: process-local map, reset on restart
//! - [`RedisRateLimitStore`]: shared across instances through Redis

pub mod memory;
pub mod redis;
pub mod store;

pub use memory::MemoryRateLimitStore;
pub use self::redis::RedisRateLimitStore;
pub use store::{CacheError, RateLimitStore, WindowState};
