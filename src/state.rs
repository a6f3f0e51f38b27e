use std::sync::Arc;
use std::time::Instant;

use portico_auth::{CredentialVerifier, JwtVerifier};
use portico_cache::{MemoryRateLimitStore, RateLimitStore};
use portico_config::AppConfig;
use portico_db::{MemoryUserStore, UserStore};

use crate::shutdown::ShutdownSignal;

/// Shared collaborators handed to every handler and route layer.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
    pub shutdown: ShutdownSignal,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        rate_limiter: Arc<dyn RateLimitStore>,
        shutdown: ShutdownSignal,
    ) -> Self {
        let verifier = Arc::new(JwtVerifier::new(&config.jwt));
        Self {
            users,
            verifier,
            rate_limiter,
            config: Arc::new(config),
            started_at: Instant::now(),
            shutdown,
        }
    }

    /// State backed entirely by in-process stores.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryRateLimitStore::new()),
            ShutdownSignal::new(),
        )
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}
