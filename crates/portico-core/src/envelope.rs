//! The uniform JSON response envelope.
//!
//! Every response body the gateway produces (success or failure) has the
//! same shape:
//!
//! ```json
//! { "success": true, "data": { ... }, "requestId": "...", "timestamp": "..." }
//! { "success": false, "error": { "message": "...", "code": "..." }, "requestId": "...", "timestamp": "..." }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::context::RequestId;
use crate::errors::{AppError, FieldError};

/// Current time as an ISO-8601 UTC string with millisecond precision.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ErrorBody {
    #[must_use]
    pub fn from_error(error: &AppError, expose_internal: bool) -> Self {
        Self {
            message: error.public_message(expose_internal).to_string(),
            code: error.code().to_string(),
            field_errors: error.field_errors().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub request_id: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: &RequestId) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_id: request_id.to_string(),
            timestamp: timestamp(),
        }
    }
}

impl ApiResponse<()> {
    #[must_use]
    pub fn failure(error: ErrorBody, request_id: &RequestId) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            request_id: request_id.to_string(),
            timestamp: timestamp(),
        }
    }
}

/// A successful handler result wrapped in the envelope.
#[derive(Debug)]
pub struct Success<T> {
    status: StatusCode,
    body: ApiResponse<T>,
}

impl<T> Success<T> {
    pub fn new(status: StatusCode, data: T, request_id: &RequestId) -> Self {
        Self {
            status,
            body: ApiResponse::success(data, request_id),
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_success_envelope_shape() {
        let id = RequestId::from("req-1");
        let value = serde_json::to_value(ApiResponse::success(json!({"a": 1}), &id)).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["a"], 1);
        assert_eq!(value["requestId"], "req-1");
        assert!(value.get("error").is_none());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_failure_envelope_omits_empty_field_errors() {
        let id = RequestId::from("req-2");
        let body = ErrorBody::from_error(&AppError::not_found("User not found"), false);
        let value = serde_json::to_value(ApiResponse::failure(body, &id)).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "NOT_FOUND");
        assert_eq!(value["error"]["message"], "User not found");
        assert!(value["error"].get("fieldErrors").is_none());
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_failure_envelope_lists_field_errors() {
        let id = RequestId::from("req-3");
        let err = AppError::validation(vec![FieldError::new("body.name", "Name is required")]);
        let value: Value =
            serde_json::to_value(ApiResponse::failure(ErrorBody::from_error(&err, false), &id))
                .unwrap();

        assert_eq!(value["error"]["fieldErrors"][0]["field"], "body.name");
        assert_eq!(value["error"]["fieldErrors"][0]["message"], "Name is required");
    }
}
