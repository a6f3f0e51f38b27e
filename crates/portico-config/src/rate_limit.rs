//! Fixed-window rate limiting configuration.
//!
//! - `RATE_LIMIT_WINDOW_MS`: window length in milliseconds (default: 900000, 15 minutes)
//! - `RATE_LIMIT_MAX_REQUESTS`: requests allowed per client per window (default: 100)
//! - `REDIS_URL`: when set, window counters live in Redis instead of process memory

use std::time::Duration;

use crate::{ConfigError, parse_or, read};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u64,
    pub redis_url: Option<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(900_000),
            max_requests: 100,
            redis_url: None,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let window_ms: u64 = parse_or(lookup, "RATE_LIMIT_WINDOW_MS", 900_000)?;
        if window_ms == 0 {
            return Err(ConfigError::Constraint {
                key: "RATE_LIMIT_WINDOW_MS",
                reason: "must be greater than zero",
            });
        }

        let max_requests: u64 = parse_or(lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?;
        if max_requests == 0 {
            return Err(ConfigError::Constraint {
                key: "RATE_LIMIT_MAX_REQUESTS",
                reason: "must be greater than zero",
            });
        }

        Ok(Self {
            window: Duration::from_millis(window_ms),
            max_requests,
            redis_url: read(lookup, "REDIS_URL"),
        })
    }
}
