use crate::{ConfigError, parse_or, read};

/// PostgreSQL settings. Without `DATABASE_URL` the gateway falls back to an
/// in-memory user store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: read(lookup, "DATABASE_URL"),
            max_connections: parse_or(lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }
}
