//! Request-processing stages, route layers and extractors.
//!
//! # Modules
//!
//! - [`security`]: hardening headers and the CORS policy (tower layers)
//! - [`body_limit`]: rejects oversized declared bodies
//! - [`request_id`]: publishes the request context
//! - [`rate_limit`]: per-client fixed-window limiting under `/api`
//! - [`auth`]: bearer-token authentication layers and the `AuthUser` extractor
//! - [`validation`]: the `Validated` extractor
//!
//! The access log stage lives in [`crate::logging`].

pub mod auth;
pub mod body_limit;
pub mod rate_limit;
pub mod request_id;
pub mod security;
pub mod validation;
