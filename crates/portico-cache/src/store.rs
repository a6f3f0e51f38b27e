use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] ::redis::RedisError),

    #[error("Unexpected reply from store: {0}")]
    Reply(String),
}

/// Counter state right after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Hits in the current window, including this one.
    pub count: u64,
    /// Time until the window resets.
    pub resets_in: Duration,
}

/// Per-key fixed-window counters.
///
/// `increment` is a single atomic step: concurrent calls for the same key
/// never observe the same count.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowState, CacheError>;
}
