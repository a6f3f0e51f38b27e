use axum::{extract::Request, http::header};
use portico_core::AppError;

use crate::pipeline::{BoxFuture, Exchange, Flow, Stage, StageResult};

/// Ceiling for request bodies.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request entity too large";

/// Rejects requests whose declared `Content-Length` exceeds the ceiling,
/// before anything reads the body.
#[derive(Debug, Clone)]
pub struct BodySizeGuard {
    limit: u64,
}

impl BodySizeGuard {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit as u64,
        }
    }

    fn declared_length(request: &Request) -> Option<u64> {
        request
            .headers()
            .get(header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl Default for BodySizeGuard {
    fn default() -> Self {
        Self::new(MAX_BODY_BYTES)
    }
}

impl Stage for BodySizeGuard {
    fn name(&self) -> &'static str {
        "body-size-guard"
    }

    fn before<'a>(
        &'a self,
        _exchange: &'a mut Exchange,
        request: &'a mut Request,
    ) -> BoxFuture<'a, StageResult> {
        Box::pin(async move {
            match Self::declared_length(request) {
                Some(length) if length > self.limit => {
                    Err(AppError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE))
                }
                _ => Ok(Flow::Continue),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    fn request_with_length(length: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/users")
            .header(header::CONTENT_LENGTH, length)
            .body(Body::empty())
            .unwrap()
    }

    async fn run(guard: &BodySizeGuard, mut request: Request) -> StageResult {
        let mut exchange = Exchange::new(&request);
        guard.before(&mut exchange, &mut request).await
    }

    #[tokio::test]
    async fn test_rejects_declared_length_over_limit() {
        let guard = BodySizeGuard::default();
        let too_big = (MAX_BODY_BYTES + 1).to_string();

        let err = run(&guard, request_with_length(&too_big)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.message(), PAYLOAD_TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_allows_length_at_limit() {
        let guard = BodySizeGuard::default();
        let at_limit = MAX_BODY_BYTES.to_string();

        assert!(matches!(
            run(&guard, request_with_length(&at_limit)).await,
            Ok(Flow::Continue)
        ));
    }

    #[tokio::test]
    async fn test_ignores_missing_or_garbled_length() {
        let guard = BodySizeGuard::new(10);
        let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();

        assert!(matches!(run(&guard, request).await, Ok(Flow::Continue)));
        assert!(matches!(
            run(&guard, request_with_length("lots")).await,
            Ok(Flow::Continue)
        ));
    }
}
