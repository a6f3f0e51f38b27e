use axum::extract::Request;

use crate::pipeline::{BoxFuture, Exchange, Flow, Stage, StageResult};

/// Publishes the request context to extractors and later middleware.
///
/// The id itself is resolved when the exchange is created, so it is known
/// even for requests rejected by earlier stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignRequestId;

impl Stage for AssignRequestId {
    fn name(&self) -> &'static str {
        "request-id"
    }

    fn before<'a>(
        &'a self,
        exchange: &'a mut Exchange,
        request: &'a mut Request,
    ) -> BoxFuture<'a, StageResult> {
        Box::pin(async move {
            request.extensions_mut().insert(exchange.context().clone());
            Ok(Flow::Continue)
        })
    }
}
