use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use portico_core::errors::GENERIC_INTERNAL_MESSAGE;
use portico_core::{ApiResponse, AppError, ErrorBody, ErrorKind, ErrorReport, REQUEST_ID_HEADER};
use tracing::{Instrument, debug, error, info_span, warn};

use super::{Exchange, Flow, Stage};
use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// Ordered stages plus the terminal error handler.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    expose_internal_errors: bool,
    shutdown: ShutdownSignal,
}

impl Pipeline {
    /// `expose_internal_errors` passes unexpected error messages through
    /// to clients instead of the generic text.
    #[must_use]
    pub fn new(expose_internal_errors: bool, shutdown: ShutdownSignal) -> Self {
        Self {
            stages: Vec::new(),
            expose_internal_errors,
            shutdown,
        }
    }

    #[must_use]
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    async fn run(&self, mut exchange: Exchange, mut request: Request, next: Next) -> Response {
        let mut ran = 0;
        let mut outcome = None;

        for stage in &self.stages {
            ran += 1;
            match stage.before(&mut exchange, &mut request).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Respond(response)) => {
                    debug!(stage = stage.name(), "Stage responded");
                    outcome = Some(response);
                    break;
                }
                Err(err) => {
                    debug!(stage = stage.name(), code = err.code(), "Stage failed");
                    outcome = Some(err.into_response());
                    break;
                }
            }
        }

        let mut response = match outcome {
            Some(response) => response,
            None => next.run(request).await,
        };

        for stage in self.stages[..ran].iter().rev() {
            stage.after(&exchange, &mut response);
        }

        self.finish(&exchange, response)
    }

    /// Renders errors into the envelope and stamps the request id.
    fn finish(&self, exchange: &Exchange, mut response: Response) -> Response {
        let report = response.extensions_mut().remove::<ErrorReport>();
        let status = response.status();

        let rendered = match report {
            Some(report) => self.render(exchange, report.error(), response),
            None if status.is_client_error() || status.is_server_error() => {
                let error = unclassified(status);
                self.render(exchange, &error, response)
            }
            None => Ok(response),
        };

        let mut response = match rendered {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Failed to format error response");
                self.shutdown.trigger(ShutdownReason::Fatal);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };

        if let Ok(value) = HeaderValue::from_str(exchange.request_id().as_str()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    fn render(
        &self,
        exchange: &Exchange,
        error: &AppError,
        response: Response,
    ) -> Result<Response, serde_json::Error> {
        log_error(exchange, error);

        let body = ErrorBody::from_error(error, self.expose_internal_errors);
        let bytes = serde_json::to_vec(&ApiResponse::failure(body, exchange.request_id()))?;

        let (mut parts, _) = response.into_parts();
        parts.status = error.status();
        parts.headers.remove(header::CONTENT_LENGTH);
        parts.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(Response::from_parts(parts, Body::from(bytes)))
    }
}

/// An error response produced below the pipeline without an [`AppError`].
fn unclassified(status: StatusCode) -> AppError {
    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Forbidden,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::PayloadTooLarge,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        s if s.is_client_error() => ErrorKind::Validation,
        _ => ErrorKind::Internal,
    };

    let message = if kind == ErrorKind::Internal {
        GENERIC_INTERNAL_MESSAGE
    } else {
        status.canonical_reason().unwrap_or("Request failed")
    };
    AppError::new(kind, message)
}

fn log_error(exchange: &Exchange, error: &AppError) {
    let method = exchange.method().as_str();
    let path = exchange.uri().path();

    if error.is_server_error() {
        error!(
            request_id = %exchange.request_id(),
            method,
            path,
            status = error.status().as_u16(),
            code = error.code(),
            error = %error.message(),
            stack = ?error.source(),
            "{}",
            if error.is_unexpected() { "Unhandled error" } else { "Application error" }
        );
    } else {
        warn!(
            request_id = %exchange.request_id(),
            method,
            path,
            status = error.status().as_u16(),
            code = error.code(),
            error = %error.message(),
            "Client error"
        );
    }
}

/// Axum middleware entry point: runs the pipeline around the router.
pub async fn dispatch(
    State(pipeline): State<Arc<Pipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let exchange = Exchange::new(&request);
    let span = info_span!(
        "request",
        request_id = %exchange.request_id(),
        method = %exchange.method(),
        path = %exchange.uri().path(),
    );

    pipeline.run(exchange, request, next).instrument(span).await
}
