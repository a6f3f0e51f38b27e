//! # Portico
//!
//! An HTTP API gateway pipeline built with Rust and Axum: request
//! hardening, CORS, body-size limits, request correlation, access logging,
//! rate limiting, bearer-token authentication, declarative validation and a
//! uniform JSON envelope, in front of a small user resource.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── pipeline/         # Stage trait, dispatcher, terminal error handler
//! ├── middleware/       # Stages, route layers and extractors
//! ├── modules/          # Feature modules
//! │   ├── health/      # Liveness and health report
//! │   └── users/       # User CRUD
//! ├── logging.rs        # Subscriber setup and access log
//! ├── router.rs         # Route table and layer order
//! ├── server.rs         # Serving with graceful shutdown
//! ├── shutdown.rs       # Process-wide shutdown signal
//! └── state.rs          # Shared collaborators
//! ```
//!
//! Each feature module follows the same structure:
//!
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: Business logic over the store
//! - `router.rs`: Axum router configuration
//!
//! ## Request flow
//!
//! ```text
//! hardening headers → CORS → body-size guard → request id → access log
//!   → rate limit (/api only) → route → auth → validation → handler
//! ```
//!
//! Every error raised anywhere in that chain is rendered once, by the
//! pipeline, into
//!
//! ```json
//! { "success": false, "error": { "message": "...", "code": "..." }, "requestId": "...", "timestamp": "..." }
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! JWT_SECRET=change-me-to-at-least-32-characters cargo run --bin portico
//! cargo run --bin portico-cli -- issue-token --user-id 42 --email a@example.com
//! ```
//!
//! Without `DATABASE_URL` users are kept in memory; without `REDIS_URL`
//! rate-limit counters are kept in memory.

pub mod logging;
pub mod middleware;
pub mod modules;
pub mod pipeline;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export workspace crates for convenience
pub use portico_auth;
pub use portico_cache;
pub use portico_config;
pub use portico_core;
pub use portico_db;
pub use portico_models;
