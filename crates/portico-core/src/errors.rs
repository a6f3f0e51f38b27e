//! Application error taxonomy.
//!
//! Every failure that reaches a client is an [`AppError`] of one of the
//! fixed [`ErrorKind`]s. The kind determines the HTTP status and the
//! machine-readable code; callers only choose the message and, for
//! validation failures, the per-field details.
//!
//! Errors that were not constructed through one of the kind constructors
//! (anything converted through `From`, e.g. a storage or I/O failure) are
//! *unexpected*: they are reported as `Internal` and their message is only
//! disclosed when the formatter is told to expose internal errors.
//!
//! # Example
//!
//! ```ignore
//! use portico_core::errors::AppError;
//!
//! fn find(id: &str) -> Result<User, AppError> {
//!     store.get(id).ok_or_else(|| AppError::not_found("User not found"))
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Message sent in place of an unexpected error's own message outside
/// development mode.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// The closed set of application error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    RateLimited,
    Internal,
}

impl ErrorKind {
    /// HTTP status fixed for this kind.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code fixed for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::RateLimited => "RATE_LIMIT_ERROR",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// A single invalid input field, named by its location (e.g. `body.email`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    field_errors: Vec<FieldError>,
    source: Option<anyhow::Error>,
    unexpected: bool,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: Vec::new(),
            source: None,
            unexpected: false,
        }
    }

    /// Validation failure carrying every offending field, in order.
    pub fn validation(field_errors: Vec<FieldError>) -> Self {
        Self {
            field_errors,
            ..Self::new(ErrorKind::Validation, "Validation failed")
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// A deliberately raised internal error; its message is always shown.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Wraps an error nobody classified. Reported as `Internal` with the
    /// message hidden unless internal errors are exposed.
    pub fn unexpected<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        let err = err.into();
        Self {
            kind: ErrorKind::Internal,
            message: err.to_string(),
            field_errors: Vec::new(),
            source: Some(err),
            unexpected: true,
        }
    }

    /// Attaches an underlying cause, kept for logs only.
    #[must_use]
    pub fn with_source<E>(mut self, err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        self.source = Some(err.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    #[must_use]
    pub fn source(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        self.unexpected
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    /// The message a client is allowed to see.
    #[must_use]
    pub fn public_message(&self, expose_internal: bool) -> &str {
        if self.unexpected && !expose_internal {
            GENERIC_INTERNAL_MESSAGE
        } else {
            &self.message
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code(), self.status().as_u16(), self.message)
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        AppError::unexpected(err)
    }
}

/// An [`AppError`] travelling in response extensions until the pipeline's
/// terminal stage renders it.
#[derive(Debug, Clone)]
pub struct ErrorReport(Arc<AppError>);

impl ErrorReport {
    #[must_use]
    pub fn error(&self) -> &AppError {
        &self.0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(ErrorReport(Arc::new(self)));
        response
    }
}
