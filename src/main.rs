use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use portico::logging::init_tracing;
use portico::router::init_router;
use portico::server::serve;
use portico::shutdown::ShutdownSignal;
use portico::state::AppState;
use portico_cache::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore};
use portico_config::AppConfig;
use portico_db::{MemoryUserStore, PgUserStore, UserStore, init_db_pool, run_migrations};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(&config.log) {
        eprintln!("Failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let users = init_user_store(&config).await?;
    let rate_limiter = init_rate_limit_store(&config).await?;

    let shutdown = ShutdownSignal::with_os_signals();
    let addr = config.server.addr();
    let grace = config.server.shutdown_grace;
    let env = config.server.env;

    let state = AppState::new(config, users, rate_limiter, shutdown.clone());
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, environment = env.as_str(), "Starting Portico");

    serve(listener, app, shutdown, grace).await
}

async fn init_user_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    match &config.database.url {
        Some(url) => {
            let pool = init_db_pool(&config.database, url)
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Using PostgreSQL user store");
            Ok(Arc::new(PgUserStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL is not set, users are kept in memory");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

async fn init_rate_limit_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RateLimitStore>> {
    match &config.rate_limit.redis_url {
        Some(url) => {
            let store = RedisRateLimitStore::new(url)
                .await
                .context("Failed to connect to Redis")?;
            info!("Using Redis rate limit store");
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryRateLimitStore::new())),
    }
}
