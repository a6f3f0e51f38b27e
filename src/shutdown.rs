//! Process-wide shutdown signal.
//!
//! One [`ShutdownSignal`] is shared by the server, the OS signal listener
//! and the pipeline. The first trigger wins; later triggers are ignored.
//!
//! # Example
//!
//! ```ignore
//! let shutdown = ShutdownSignal::with_os_signals();
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(shutdown.clone().wait_owned())
//!     .await?;
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM.
    Signal,
    /// The server task ended on its own.
    ServerExited,
    /// An error response could not be produced, or a background task
    /// panicked.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a signal that also fires on SIGINT/SIGTERM.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let listener = signal.clone();

        signal.spawn_supervised("os-signal-listener", async move {
            wait_for_os_signal().await;
            info!("Received shutdown signal, closing server gracefully");
            listener.trigger(ShutdownReason::Signal);
        });

        signal
    }

    /// Spawns a background task whose panic triggers a fatal shutdown.
    ///
    /// The returned handle completes once the task has ended.
    pub fn spawn_supervised<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let signal = self.clone();

        tokio::spawn(async move {
            match handle.await {
                Ok(()) => {}
                Err(err) if err.is_panic() => {
                    error!(task = name, error = %err, "Background task panicked");
                    signal.trigger(ShutdownReason::Fatal);
                }
                Err(err) => warn!(task = name, error = %err, "Background task was cancelled"),
            }
        })
    }

    pub fn trigger(&self, reason: ShutdownReason) {
        self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    #[must_use]
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.sender.borrow()
    }

    /// Resolves once the signal has been triggered.
    pub async fn wait(&self) -> ShutdownReason {
        let mut receiver = self.sender.subscribe();
        match receiver.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(ShutdownReason::Signal),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => ShutdownReason::Signal,
        }
    }

    pub async fn wait_owned(self) {
        self.wait().await;
    }
}

async fn wait_for_os_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
