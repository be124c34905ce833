//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and, on Unix, SIGTERM both end the process gracefully.

use crate::lifecycle::shutdown::Shutdown;

/// Wait for the first termination signal.
pub async fn terminated() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Trigger `shutdown` when the process is asked to terminate.
pub async fn listen(shutdown: Shutdown) {
    terminated().await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}
