mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode, header};
use axum::middleware;
use axum::routing::get;
use chrono::Utc;
use common::{TEST_SECRET, request, send, setup_test_app, test_config, test_token, token_for};
use portico::middleware::auth::{AuthUser, optional_auth};
use portico::pipeline::dispatch;
use portico::router::init_pipeline;
use portico::state::AppState;
use portico_auth::Claims;
use portico_auth::jwt::encode_claims;
use serde_json::Map;

fn now() -> u64 {
    Utc::now().timestamp() as u64
}

fn claims(user_id: Option<&str>, exp: u64) -> Claims {
    Claims {
        user_id: user_id.map(str::to_string),
        email: Some("user@example.com".to_string()),
        iat: Some(now()),
        exp: Some(exp),
        extra: Map::new(),
    }
}

async fn list_users_with_header(value: Option<&str>) -> common::TestResponse {
    let app = setup_test_app();
    let mut builder = Request::builder().uri("/api/v1/users");
    if let Some(value) = value {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    send(&app, builder.body(Body::empty()).unwrap()).await
}

fn assert_auth_error(response: &common::TestResponse, message: &str) {
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"]["code"], "AUTHENTICATION_ERROR");
    assert_eq!(response.body["error"]["message"], message);
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let response = list_users_with_header(None).await;
    assert_auth_error(&response, "Authorization header is required");
}

#[tokio::test]
async fn test_empty_bearer_token_is_rejected() {
    let response = list_users_with_header(Some("Bearer ")).await;
    assert_auth_error(&response, "Token is required");
}

#[tokio::test]
async fn test_expired_token_has_specific_message() {
    let token = encode_claims(&claims(Some("user-1"), now() - 60), TEST_SECRET).unwrap();
    let response = list_users_with_header(Some(&format!("Bearer {token}"))).await;
    assert_auth_error(&response, "Token has expired");
}

#[tokio::test]
async fn test_tampered_signature_is_rejected() {
    let token = encode_claims(
        &claims(Some("user-1"), now() + 3600),
        "some-other-secret-that-is-also-32-chars",
    )
    .unwrap();
    let response = list_users_with_header(Some(&format!("Bearer {token}"))).await;
    assert_auth_error(&response, "Invalid or expired token");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let response = list_users_with_header(Some("Bearer not.a.jwt")).await;
    assert_auth_error(&response, "Invalid or expired token");
}

#[tokio::test]
async fn test_token_without_subject_is_rejected() {
    let token = encode_claims(&claims(None, now() + 3600), TEST_SECRET).unwrap();
    let response = list_users_with_header(Some(&format!("Bearer {token}"))).await;
    assert_auth_error(&response, "Invalid token: userId is missing");
}

#[tokio::test]
async fn test_valid_token_is_accepted_with_or_without_prefix() {
    let token = test_token();

    let prefixed = list_users_with_header(Some(&format!("Bearer {token}"))).await;
    assert_eq!(prefixed.status, StatusCode::OK);

    let bare = list_users_with_header(Some(&token)).await;
    assert_eq!(bare.status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_errors_carry_request_id() {
    let app = setup_test_app();
    let response = send(&app, request("DELETE", "/api/v1/users/abc", None, None)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers["x-request-id"].to_str().unwrap(),
        response.body["requestId"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_health_routes_do_not_require_auth() {
    let app = setup_test_app();

    let liveness = send(&app, request("GET", "/health", None, None)).await;
    let report = send(&app, request("GET", "/api/v1/health", None, None)).await;

    assert_eq!(liveness.status, StatusCode::OK);
    assert_eq!(report.status, StatusCode::OK);
}

async fn whoami(request: axum::extract::Request) -> axum::Json<serde_json::Value> {
    let (mut parts, _) = request.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &()).await.ok();
    axum::Json(serde_json::json!({
        "userId": user.as_ref().map(AuthUser::user_id),
        "email": user.as_ref().and_then(AuthUser::email),
    }))
}

fn optional_auth_app() -> axum::Router {
    let state = AppState::in_memory(test_config(&[]));
    axum::Router::new()
        .route("/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            Arc::new(init_pipeline(&state)),
            dispatch,
        ))
}

#[tokio::test]
async fn test_optional_auth_lets_anonymous_requests_through() {
    let response = send(&optional_auth_app(), request("GET", "/whoami", None, None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userId"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_optional_auth_attaches_principal() {
    let token = token_for("user-42");
    let response = send(&optional_auth_app(), request("GET", "/whoami", Some(&token), None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userId"], "user-42");
    assert_eq!(response.body["email"], "tester@example.com");
}

#[tokio::test]
async fn test_optional_auth_rejects_bad_credential() {
    let response = send(&optional_auth_app(), request("GET", "/whoami", Some("forged"), None)).await;
    assert_auth_error(&response, "Invalid or expired token");
}

#[tokio::test]
async fn test_lone_bearer_is_rejected_as_invalid_token() {
    let response = list_users_with_header(Some("Bearer")).await;
    assert_auth_error(&response, "Invalid or expired token");
}
