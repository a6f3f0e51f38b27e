//! Redis-backed rate-limit windows.
//!
//! Each key is a Redis integer incremented by a Lua script, so the increment
//! and the expiry of a new window happen atomically on the server.

use std::time::Duration;

use async_trait::async_trait;
use redis::{Client, Script, aio::ConnectionManager};
use tracing::{debug, instrument};

use crate::store::{CacheError, RateLimitStore, WindowState};

const KEY_PREFIX: &str = "portico:ratelimit:";

const INCREMENT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
";

#[derive(Clone)]
pub struct RedisRateLimitStore {
    conn: ConnectionManager,
    script: Script,
}

impl std::fmt::Debug for RedisRateLimitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimitStore").finish_non_exhaustive()
    }
}

impl RedisRateLimitStore {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or the server
    /// cannot be reached.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            script: Script::new(INCREMENT_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    #[instrument(skip(self), fields(cache.operation = "RATE_LIMIT_INCR"))]
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowState, CacheError> {
        let mut conn = self.conn.clone();
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);

        let (count, ttl_ms): (i64, i64) = self
            .script
            .key(format!("{KEY_PREFIX}{key}"))
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        let count = u64::try_from(count).map_err(|_| CacheError::Reply(count.to_string()))?;
        let resets_in = Duration::from_millis(u64::try_from(ttl_ms).unwrap_or(window_ms));

        debug!(cache.key = %key, count, "Rate limit window incremented");

        Ok(WindowState { count, resets_in })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_increment_counts_and_expires() {
        let store = RedisRateLimitStore::new(&redis_url()).await.unwrap();
        let key = format!("test-{}", std::process::id());
        let window = Duration::from_millis(200);

        let first = store.increment(&key, window).await.unwrap();
        let second = store.increment(&key, window).await.unwrap();
        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);
        assert!(second.resets_in <= window);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.increment(&key, window).await.unwrap().count, 1);
    }
}
