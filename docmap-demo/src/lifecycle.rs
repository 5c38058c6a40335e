//! Running work against an embedded server that is always disposed afterwards.

use std::{future::Future, panic::AssertUnwindSafe};

use anyhow::{Context, anyhow};
use futures::FutureExt;
use tracing::warn;

use docmap::server::EmbeddedServer;

/// Resolves with the name of the first shutdown signal received.
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "ctrl-c"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}

/// Connects to `database`, runs `work` with the backend and disposes `server`.
///
/// `work` stops early if it panics or if `shutdown` resolves first. The server is disposed
/// in every case, before the outcome is returned.
///
/// # Errors
///
/// Returns the error of `work`, an error describing the panic or signal that stopped it, or
/// the error raised while connecting or disposing.
pub async fn serve<S, F, Fut, T, Sd>(server: S, database: &str, shutdown: Sd, work: F) -> anyhow::Result<T>
where
    S: EmbeddedServer,
    F: FnOnce(S::Backend) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    Sd: Future<Output = std::io::Result<&'static str>>,
{
    let outcome = async {
        let backend = server
            .connect(database)
            .await
            .with_context(|| format!("failed to connect to database {}", database))?;
        let run = AssertUnwindSafe(async move { work(backend).await }).catch_unwind();

        tokio::select! {
            outcome = run => match outcome {
                Ok(result) => result,
                Err(_) => Err(anyhow!("scenario panicked")),
            },
            signal = shutdown => {
                let signal = signal.context("failed to listen for shutdown signals")?;
                warn!(signal, "interrupted");
                Err(anyhow!("interrupted by {}", signal))
            }
        }
    }
    .await;

    let disposed = server.dispose().await.context("failed to dispose the server");

    match (outcome, disposed) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), _) | (Ok(_), Err(e)) => Err(e),
    }
}
