use anyhow::Result;
use tokio::signal;

/// Resolve once the process is asked to stop (Ctrl+C, or SIGTERM on unix).
///
/// # Errors
/// Returns an error if a signal handler cannot be installed.
pub async fn wait_for_shutdown() -> Result<()> {
    let source = tokio::select! {
        result = signal::ctrl_c() => result.map(|()| "ctrl_c")?,
        result = wait_sigterm() => result?,
    };

    tracing::info!(signal = source, "shutdown signal received");
    Ok(())
}

#[cfg(unix)]
async fn wait_sigterm() -> Result<&'static str> {
    let mut handler = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
        tracing::error!(%e, "failed to install SIGTERM handler");
        e
    })?;
    handler.recv().await;
    Ok("sigterm")
}

#[cfg(not(unix))]
async fn wait_sigterm() -> Result<&'static str> {
    std::future::pending().await
}
