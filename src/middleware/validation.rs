//! Declarative request validation.
//!
//! A handler names a schema for each part of the request it cares about,
//! and [`Validated`] decodes and checks all of them before the handler
//! runs:
//!
//! ```ignore
//! async fn update(
//!     input: Validated<NoInput, UserIdParams, UpdateUserDto>,
//! ) -> Result<Success<User>, AppError> {
//!     // input.params.id is already a Uuid, input.body is already checked
//! }
//! ```
//!
//! Every violation across query, params and body is reported in one
//! `Validation` error with fields named by location (`query.limit`,
//! `params.id`, `body.email`). Parts left as [`NoInput`] are not read.

use std::collections::{BTreeSet, HashMap};

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::PathRejection},
    http::{StatusCode, Uri},
};
use portico_core::{AppError, FieldError};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use serde_path_to_error::Segment;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::middleware::body_limit::PAYLOAD_TOO_LARGE_MESSAGE;

/// A type that can be decoded from one part of a request and validated.
pub trait Schema: DeserializeOwned + Validate + Send + 'static {
    /// The value used instead of reading the part at all. Only
    /// [`NoInput`] provides one.
    fn skipped() -> Option<Self> {
        None
    }
}

/// Marks a request part as not validated.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NoInput;

impl Validate for NoInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Schema for NoInput {
    fn skipped() -> Option<Self> {
        Some(NoInput)
    }
}

#[derive(Debug, Clone)]
pub struct Validated<Q = NoInput, P = NoInput, B = NoInput> {
    pub query: Q,
    pub params: P,
    pub body: B,
}

impl<S, Q, P, B> FromRequest<S> for Validated<Q, P, B>
where
    S: Send + Sync,
    Q: Schema,
    P: Schema,
    B: Schema,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let mut errors = Vec::new();

        let query = match Q::skipped() {
            Some(skipped) => Some(skipped),
            None => match query_object(&parts.uri) {
                Some(raw) => decode::<Q>("query", raw, &mut errors),
                None => {
                    errors.push(FieldError::new("query", "Malformed query string"));
                    None
                }
            },
        };

        let params = match P::skipped() {
            Some(skipped) => Some(skipped),
            None => {
                match Path::<HashMap<String, String>>::from_request_parts(&mut parts, state).await
                {
                    Ok(Path(params)) => decode::<P>("params", string_object(params), &mut errors),
                    Err(PathRejection::MissingPathParams(_)) => {
                        decode::<P>("params", Value::Object(Map::new()), &mut errors)
                    }
                    Err(_) => {
                        errors.push(FieldError::new("params", "Malformed path parameters"));
                        None
                    }
                }
            }
        };

        let body = match B::skipped() {
            Some(skipped) => Some(skipped),
            None => {
                let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
                    .await
                    .map_err(|rejection| {
                        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                            AppError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE)
                        } else {
                            AppError::validation(vec![FieldError::new(
                                "body",
                                "Unable to read request body",
                            )])
                        }
                    })?;
                match body_object(&bytes) {
                    Some(raw) => decode::<B>("body", raw, &mut errors),
                    None => {
                        errors.push(FieldError::new("body", "Malformed JSON body"));
                        None
                    }
                }
            }
        };

        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        match (query, params, body) {
            (Some(query), Some(params), Some(body)) => Ok(Self {
                query,
                params,
                body,
            }),
            _ => Err(AppError::internal("Request validation produced no value")),
        }
    }
}

fn string_object(pairs: HashMap<String, String>) -> Value {
    Value::Object(
        pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

fn query_object(uri: &Uri) -> Option<Value> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .map(|Query(pairs)| string_object(pairs))
}

/// An empty body counts as `{}`.
fn body_object(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).ok()
}

/// Decodes `value` into `T` and runs its rules, appending every problem to
/// `errors` as `{location}.{field}`.
///
/// A field that fails to decode is reported and dropped so the remaining
/// fields can still be decoded and checked.
fn decode<T: Schema>(location: &str, mut value: Value, errors: &mut Vec<FieldError>) -> Option<T> {
    let mut rejected = BTreeSet::new();

    let parsed = loop {
        let err = match serde_path_to_error::deserialize::<_, T>(&value) {
            Ok(parsed) => break Some(parsed),
            Err(err) => err,
        };

        let message = err.inner().to_string();
        let field = match err.path().iter().next() {
            Some(Segment::Map { key }) => key.clone(),
            _ => {
                let missing = missing_field(&message);
                if missing.as_ref().is_some_and(|name| rejected.contains(name)) {
                    break None;
                }
                let field = missing.clone().unwrap_or_else(|| location.to_string());
                let text = match missing {
                    Some(name) => format!("{name} is required"),
                    None => format!("{location} is invalid"),
                };
                errors.push(FieldError::new(qualify(location, &field), text));
                break None;
            }
        };

        errors.push(FieldError::new(
            qualify(location, &field),
            decode_message(&field, &message),
        ));

        let removed = value
            .as_object_mut()
            .and_then(|object| object.remove(&field))
            .is_some();
        rejected.insert(field);
        if !removed {
            break None;
        }
    };

    let parsed = parsed?;

    match parsed.validate() {
        Ok(()) if rejected.is_empty() => Some(parsed),
        Ok(()) => None,
        Err(validation) => {
            let mut found = Vec::new();
            flatten(&validation, "", &mut found);
            found.sort_by(|a, b| a.0.cmp(&b.0));

            for (path, message) in found {
                let top = path.split(['.', '[']).next().unwrap_or_default();
                if !rejected.contains(top) {
                    errors.push(FieldError::new(qualify(location, &path), message));
                }
            }
            None
        }
    }
}

fn qualify(location: &str, field: &str) -> String {
    if field == location {
        field.to_string()
    } else {
        format!("{location}.{field}")
    }
}

fn missing_field(message: &str) -> Option<String> {
    message
        .split("missing field `")
        .nth(1)
        .and_then(|rest| rest.split('`').next())
        .map(str::to_string)
}

/// Serde's own type errors get a generic message; custom messages from
/// field deserializers are kept.
fn decode_message(field: &str, message: &str) -> String {
    const GENERIC: [&str; 4] = ["invalid type", "invalid value", "invalid length", "unknown variant"];

    if GENERIC.iter().any(|prefix| message.starts_with(prefix)) {
        format!("{field} is invalid")
    } else if message.starts_with(|c: char| c.is_ascii_lowercase()) {
        format!("{field} {message}")
    } else {
        message.to_string()
    }
}

fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid"));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}
