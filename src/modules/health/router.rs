use axum::{Router, routing::get};

use crate::modules::health::controller::{liveness, report};
use crate::state::AppState;

/// `GET /health`, outside the API prefix.
pub fn init_liveness_router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}

/// `GET /api/v1/health`.
pub fn init_health_router() -> Router<AppState> {
    Router::new().route("/", get(report))
}
