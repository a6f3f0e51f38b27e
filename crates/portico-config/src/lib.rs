//! # Portico Config
//!
//! Configuration types for the Portico gateway, loaded once at startup
//! from environment variables.
//!
//! - [`server`]: bind address, execution environment, shutdown grace
//! - [`jwt`]: credential signing secret and token lifetime
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: fixed-window throttle settings
//! - [`logging`]: log level, format and optional file sink
//! - [`database`]: optional PostgreSQL connection
//!
//! Every type exposes `from_env()` and a `from_lookup()` variant taking a
//! `Fn(&str) -> Option<String>`, which tests use instead of mutating the
//! process environment.
//!
//! # Example
//!
//! ```ignore
//! use portico_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env()?;
//! println!("listening on {}", config.server.addr());
//! ```

pub mod cors;
pub mod database;
pub mod jwt;
pub mod logging;
pub mod rate_limit;
pub mod server;

use std::str::FromStr;

pub use cors::{AllowedOrigins, CorsConfig};
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use rate_limit::RateLimitConfig;
pub use server::{AppEnv, ServerConfig};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} {reason}")]
    Constraint { key: &'static str, reason: &'static str },
}

/// Complete gateway configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub log: LogConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server: ServerConfig::from_lookup(&lookup)?,
            jwt: JwtConfig::from_lookup(&lookup)?,
            cors: CorsConfig::from_lookup(&lookup),
            rate_limit: RateLimitConfig::from_lookup(&lookup)?,
            log: LogConfig::from_lookup(&lookup)?,
            database: DatabaseConfig::from_lookup(&lookup)?,
        })
    }
}

/// Reads a variable, treating blank values as unset.
pub(crate) fn read<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses a variable, falling back to `default` when unset.
pub(crate) fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match read(lookup, key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
