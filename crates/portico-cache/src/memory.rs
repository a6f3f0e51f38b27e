use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::store::{CacheError, RateLimitStore, WindowState};

/// Above this many tracked keys, expired windows are dropped on write.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u64,
}

/// In-memory [`RateLimitStore`]. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn hit(&self, key: &str, window: Duration, now: Instant) -> WindowState {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count += 1;

        WindowState {
            count: entry.count,
            resets_in: window.saturating_sub(now.duration_since(entry.started)),
        }
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowState, CacheError> {
        Ok(self.hit(key, window, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counts_within_window() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);
        let start = Instant::now();

        assert_eq!(store.hit("1.2.3.4", window, start).count, 1);
        let state = store.hit("1.2.3.4", window, start + Duration::from_secs(10));
        assert_eq!(state.count, 2);
        assert_eq!(state.resets_in, Duration::from_secs(50));
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);
        let start = Instant::now();

        store.hit("1.2.3.4", window, start);
        store.hit("1.2.3.4", window, start);
        let state = store.hit("1.2.3.4", window, start + Duration::from_secs(60));
        assert_eq!(state.count, 1);
        assert_eq!(state.resets_in, window);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);
        let now = Instant::now();

        store.hit("a", window, now);
        store.hit("a", window, now);
        assert_eq!(store.hit("b", window, now).count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let window = Duration::from_secs(60);

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment("burst", window).await.unwrap().count })
            })
            .collect();

        let mut counts = Vec::new();
        for task in tasks {
            counts.push(task.await.unwrap());
        }
        counts.sort_unstable();

        assert_eq!(counts, (1..=50).collect::<Vec<u64>>());
    }
}
