use crate::{ConfigError, parse_or, read};

pub const MIN_SECRET_LEN: usize = 32;

/// 7 days.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 604_800;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of issued tokens, in seconds.
    pub expires_in: u64,
}

impl JwtConfig {
    /// Builds a config directly, enforcing the minimum secret length.
    pub fn new(secret: impl Into<String>, expires_in: u64) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Constraint {
                key: "JWT_SECRET",
                reason: "must be at least 32 characters",
            });
        }
        Ok(Self { secret, expires_in })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = read(lookup, "JWT_SECRET").ok_or(ConfigError::Missing { key: "JWT_SECRET" })?;
        let expires_in = parse_or(lookup, "JWT_EXPIRES_IN", DEFAULT_EXPIRES_IN_SECS)?;
        Self::new(secret, expires_in)
    }
}
