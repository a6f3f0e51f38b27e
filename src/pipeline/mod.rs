//! The request pipeline.
//!
//! Cross-cutting concerns run as an ordered list of [`Stage`]s driven by a
//! single dispatcher ([`dispatch`]). Each stage's `before` hook returns a
//! tagged outcome:
//!
//! - `Ok(Flow::Continue)`: hand the request to the next stage
//! - `Ok(Flow::Respond(response))`: stop and send `response`
//! - `Err(AppError)`: stop and send the error envelope
//!
//! Once a response exists, the `after` hooks of every stage that ran are
//! called in reverse order, then the terminal handler renders any error into
//! the envelope and stamps the `X-Request-Id` header. Errors are rendered in
//! exactly one place.
//!
//! # Example
//!
//! ```ignore
//! struct Deny;
//!
//! impl Stage for Deny {
//!     fn name(&self) -> &'static str { "deny" }
//!
//!     fn before<'a>(&'a self, _: &'a mut Exchange, _: &'a mut Request) -> BoxFuture<'a, StageResult> {
//!         Box::pin(async { Err(AppError::forbidden("Nope")) })
//!     }
//! }
//! ```

mod dispatch;

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use axum::{
    extract::Request,
    http::{Extensions, Method, Uri},
    response::Response,
};
use portico_core::{AppError, RequestContext, RequestId};

pub use dispatch::{Pipeline, dispatch};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a stage that did not fail.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Respond(Response),
}

pub type StageResult = Result<Flow, AppError>;

/// State of one request as it moves through the pipeline.
#[derive(Debug)]
pub struct Exchange {
    context: RequestContext,
    method: Method,
    uri: Uri,
    started: Instant,
    /// Scratch space for stages to pass data from `before` to `after`.
    pub extensions: Extensions,
}

impl Exchange {
    /// Creates the request context, reusing an inbound request id.
    #[must_use]
    pub fn new(request: &Request) -> Self {
        Self {
            context: RequestContext::new(RequestId::resolve(request.headers())),
            method: request.method().clone(),
            uri: request.uri().clone(),
            started: Instant::now(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        self.context.request_id()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn started(&self) -> Instant {
        self.started
    }
}

pub trait Stage: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn before<'a>(
        &'a self,
        exchange: &'a mut Exchange,
        request: &'a mut Request,
    ) -> BoxFuture<'a, StageResult>;

    /// Called with the final status and headers, before error rendering.
    fn after(&self, _exchange: &Exchange, _response: &mut Response) {}
}
