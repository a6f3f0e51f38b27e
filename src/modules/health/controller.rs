use axum::{Json, extract::State};
use portico_core::{RequestContext, Success, envelope::timestamp};
use portico_db::StoreError;
use portico_models::{HealthReport, HealthStatus, Liveness};
use tracing::warn;

use crate::state::AppState;

/// Whether the user store answers. A "no rows" reply still counts as up.
async fn store_reachable(state: &AppState) -> bool {
    match state.users.ping().await {
        Ok(()) | Err(StoreError::NotFound) => true,
        Err(err) => {
            warn!(error = %err, "Health check failed");
            false
        }
    }
}

/// Liveness probe, sent without the envelope. Always 200.
pub async fn liveness(State(state): State<AppState>) -> Json<Liveness> {
    let status = if store_reachable(&state).await {
        HealthStatus::Ok
    } else {
        HealthStatus::Unhealthy
    };

    Json(Liveness {
        status,
        timestamp: timestamp(),
    })
}

pub async fn report(State(state): State<AppState>, ctx: RequestContext) -> Success<HealthReport> {
    let status = if store_reachable(&state).await {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    ctx.ok(HealthReport {
        status,
        timestamp: timestamp(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.server.env.as_str().to_string(),
    })
}
