use std::fs;

use axum::{
    extract::{FromRequestParts, MatchedPath, RawPathParams, Request},
    middleware::Next,
    response::Response,
};
use portico_config::{LogConfig, LogFormat};
use tracing::{debug, error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::pipeline::{BoxFuture, Exchange, Flow, Stage, StageResult};

/// Installs the global subscriber: console output plus, when a log
/// directory is configured, a daily-rolling JSON file.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},tower_http=warn,hyper=warn,sqlx=warn",
            config.level.as_str()
        ))
    });

    let console_layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .compact()
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    let file_layer = match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "portico.json");
            Some(
                fmt::layer()
                    .json()
                    .with_writer(appender)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_ansi(false)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Matched route and raw path parameters, attached to the response for the
/// access log.
#[derive(Debug, Clone, Default)]
pub struct RouteInfo {
    pub matched_path: Option<String>,
    pub params: Vec<(String, String)>,
}

/// Route layer recording which route served the request.
pub async fn record_route(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let matched_path = parts
        .extensions
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());
    let params = RawPathParams::from_request_parts(&mut parts, &())
        .await
        .map(|raw| {
            raw.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let mut response = next.run(Request::from_parts(parts, body)).await;
    response.extensions_mut().insert(RouteInfo {
        matched_path,
        params,
    });
    response
}

/// Writes one access log line per request once its status is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl Stage for AccessLog {
    fn name(&self) -> &'static str {
        "access-log"
    }

    fn before<'a>(
        &'a self,
        exchange: &'a mut Exchange,
        _request: &'a mut Request,
    ) -> BoxFuture<'a, StageResult> {
        Box::pin(async move {
            debug!(uri = %exchange.uri(), "Incoming request");
            Ok(Flow::Continue)
        })
    }

    fn after(&self, exchange: &Exchange, response: &mut Response) {
        let status = response.status().as_u16();
        let route = response.extensions().get::<RouteInfo>();
        let route_path = route
            .and_then(|info| info.matched_path.as_deref())
            .unwrap_or_else(|| exchange.uri().path());
        let params = route.map(|info| info.params.as_slice()).unwrap_or_default();
        let query = exchange.uri().query().unwrap_or_default();
        let latency_ms = exchange.started().elapsed().as_millis() as u64;

        macro_rules! access {
            ($level:ident) => {
                $level!(
                    route = route_path,
                    query,
                    params = ?params,
                    status,
                    latency_ms,
                    "{} {} {}",
                    exchange.method(),
                    exchange.uri(),
                    status
                )
            };
        }

        match status {
            500.. => access!(error),
            400..=499 => access!(warn),
            _ => access!(info),
        }
    }
}
