//! # Termination signals.
//!
//! [`wait_for_shutdown_signal`] completes when the process is asked to stop.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].
//!
//! If a handler cannot be installed the failure is logged and the helper falls
//! back to `Ctrl-C` alone, so a pipeline never shuts down on its own because of
//! a registration error.

use tracing::warn;

/// Waits for a termination signal.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let installed = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    );

    match installed {
        (Ok(mut sigint), Ok(mut sigterm), Ok(mut sigquit)) => {
            tokio::select! {
                _ = sigint.recv()  => {},
                _ = sigterm.recv() => {},
                _ = sigquit.recv() => {},
            }
        }
        (a, b, c) => {
            let error = [a.err(), b.err(), c.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%error, "signal handlers unavailable, listening for ctrl-c only");
            ctrl_c_or_forever().await;
        }
    }
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() {
    ctrl_c_or_forever().await;
}

async fn ctrl_c_or_forever() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
