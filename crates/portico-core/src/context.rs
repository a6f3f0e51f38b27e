use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, StatusCode, request::Parts},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::envelope::Success;
use crate::errors::AppError;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation identifier for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuses a non-empty inbound `X-Request-Id` verbatim, otherwise
    /// generates a fresh one.
    #[must_use]
    pub fn resolve(headers: &HeaderMap) -> Self {
        headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .unwrap_or_else(Self::generate)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identity established from a verified credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPrincipal {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Remaining claims of the credential, untouched.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Per-request context created on pipeline entry and read by every later
/// stage and handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    principal: Option<UserPrincipal>,
}

impl RequestContext {
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            principal: None,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    #[must_use]
    pub fn principal(&self) -> Option<&UserPrincipal> {
        self.principal.as_ref()
    }

    pub fn set_principal(&mut self, principal: UserPrincipal) {
        self.principal = Some(principal);
    }

    pub fn ok<T>(&self, data: T) -> Success<T> {
        Success::new(StatusCode::OK, data, &self.request_id)
    }

    pub fn created<T>(&self, data: T) -> Success<T> {
        Success::new(StatusCode::CREATED, data, &self.request_id)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::internal("Request context is not available"))
    }
}
