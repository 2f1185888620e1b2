//! Termination signal handling.

use tracing::warn;

use crate::error::ExitCode;

/// Waits for SIGINT (Ctrl+C) or SIGTERM and returns the matching exit code.
#[cfg(unix)]
pub async fn shutdown_signal() -> i32 {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            () = ctrl_c() => ExitCode::INTERRUPTED,
            _ = sigterm.recv() => ExitCode::TERMINATED,
        },
        Err(e) => {
            warn!(error = %e, "failed to register SIGTERM handler");
            ctrl_c().await;
            ExitCode::INTERRUPTED
        }
    }
}

/// Waits for Ctrl+C and returns the matching exit code.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> i32 {
    ctrl_c().await;
    ExitCode::INTERRUPTED
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
