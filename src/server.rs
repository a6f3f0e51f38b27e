use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// Serves `app` until `shutdown` fires, then drains in-flight requests for
/// at most `grace`.
///
/// Returns an error when draining times out, the server fails, or the
/// shutdown was caused by a fatal error.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: ShutdownSignal,
    grace: Duration,
) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, "Server listening");

    let mut server = tokio::spawn(
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.clone().wait_owned())
        .into_future(),
    );

    let reason = tokio::select! {
        result = &mut server => {
            shutdown.trigger(ShutdownReason::ServerExited);
            return match result {
                Ok(Ok(())) => bail!("Server stopped unexpectedly"),
                Ok(Err(err)) => Err(err).context("Server error"),
                Err(err) => Err(err).context("Server task failed"),
            };
        }
        reason = shutdown.wait() => reason,
    };

    info!(?reason, grace_secs = grace.as_secs(), "Draining in-flight requests");

    match tokio::time::timeout(grace, server).await {
        Err(_) => {
            error!("Forced shutdown after timeout");
            bail!("Forced shutdown after timeout");
        }
        Ok(Err(err)) => return Err(err).context("Server task failed"),
        Ok(Ok(Err(err))) => return Err(err).context("Server error"),
        Ok(Ok(Ok(()))) => {}
    }

    if reason == ShutdownReason::Fatal {
        bail!("Shut down after a fatal error");
    }

    info!("Server closed");
    Ok(())
}
