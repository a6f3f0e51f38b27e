use crate::read;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// `*`: every origin is echoed back.
    Any,
    List(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub origins: AllowedOrigins,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: AllowedOrigins::Any,
        }
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Reads `CORS_ORIGIN`: `*` or a comma-separated list of origins.
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(raw) = read(lookup, "CORS_ORIGIN") else {
            return Self::default();
        };

        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            return Self::default();
        }

        Self {
            origins: AllowedOrigins::List(origins),
        }
    }
}
