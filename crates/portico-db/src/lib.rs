//! # Portico DB
//!
//! User storage behind the [`UserStore`] trait.
//!
//! - [`MemoryUserStore`]: process-local, used in tests and when no database
//!   is configured
//! - [`PgUserStore`]: PostgreSQL via SQLx
//!
//! # Example
//!
//! ```ignore
//! use portico_db::{PgUserStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&config.database, url).await?;
//! run_migrations(&pool).await?;
//! let store = PgUserStore::new(pool);
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryUserStore;
pub use postgres::{PgUserStore, init_db_pool, run_migrations};
pub use store::UserStore;
