use std::any::Any;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
};
use portico_core::AppError;
use tower_http::catch_panic::CatchPanicLayer;

use crate::logging::{AccessLog, record_route};
use crate::middleware::auth::require_auth;
use crate::middleware::body_limit::{BodySizeGuard, MAX_BODY_BYTES};
use crate::middleware::rate_limit::RateLimit;
use crate::middleware::request_id::AssignRequestId;
use crate::middleware::security::{cors_layer, harden};
use crate::modules::health::router::{init_health_router, init_liveness_router};
use crate::modules::users::router::init_users_router;
use crate::pipeline::{Pipeline, dispatch};
use crate::state::AppState;

/// The cross-cutting stages, in the order they run.
pub fn init_pipeline(state: &AppState) -> Pipeline {
    Pipeline::new(
        state.config.server.env.is_development(),
        state.shutdown.clone(),
    )
    .stage(BodySizeGuard::default())
    .stage(AssignRequestId)
    .stage(AccessLog)
    .stage(RateLimit::new(
        state.rate_limiter.clone(),
        &state.config.rate_limit,
    ))
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::unexpected(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

/// Builds the application.
///
/// Outermost to innermost: hardening headers, CORS, the pipeline, panic
/// recovery, the body limit, then routing.
pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/health", init_health_router())
        .nest(
            "/users",
            init_users_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    let router = Router::new()
        .merge(init_liveness_router())
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .route_layer(middleware::from_fn(record_route))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            Arc::new(init_pipeline(&state)),
            dispatch,
        ))
        .layer(cors_layer(&state.config.cors));

    harden(router)
}
