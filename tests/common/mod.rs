#![allow(dead_code)]

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use fake::Fake;
use fake::faker::name::en::Name;
use http_body_util::BodyExt;
use portico::router::init_router;
use portico::state::AppState;
use portico_auth::create_access_token;
use portico_config::AppConfig;
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "portico-integration-test-secret-0123456789";

/// Test configuration, with `overrides` applied on top.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("APP_ENV", "test"),
        ("JWT_SECRET", TEST_SECRET),
        ("RATE_LIMIT_MAX_REQUESTS", "1000"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    AppConfig::from_lookup(move |key| vars.get(key).cloned()).unwrap()
}

pub fn setup_test_app() -> Router {
    setup_test_app_with(test_config(&[]))
}

pub fn setup_test_app_with(config: AppConfig) -> Router {
    init_router(AppState::in_memory(config))
}

pub fn token_for(user_id: &str) -> String {
    let config = test_config(&[]);
    create_access_token(user_id, Some("tester@example.com"), Map::new(), &config.jwt).unwrap()
}

pub fn test_token() -> String {
    token_for(&Uuid::new_v4().to_string())
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn generate_name() -> String {
    Name().fake()
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Creates a user through the API and returns its `data`.
pub async fn create_user(app: &Router, token: &str, email: &str) -> Value {
    let response = send(
        app,
        request(
            "POST",
            "/api/v1/users",
            Some(token),
            Some(serde_json::json!({ "email": email, "name": generate_name() })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["data"].clone()
}
