use tokio::signal;

/// Resolves when SIGINT or SIGTERM arrives, logging which one fired.
pub(crate) async fn shutdown_signal() {
    tokio::select! {
        _ = sigint() => tracing::info!(signal = "SIGINT", "shutdown signal received"),
        _ = sigterm() => tracing::info!(signal = "SIGTERM", "shutdown signal received"),
    }
}

async fn sigint() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn sigterm() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
