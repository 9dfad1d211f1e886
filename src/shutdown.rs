use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Install a shutdown handler that listens for SIGTERM and SIGINT.
///
/// Returns the process-wide token every group's evaluator and driver watch.
/// It is cancelled on either signal; loops return at their next check and a
/// fetch in flight is abandoned.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    watch_signals(token.clone());
    token
}

/// Cancel `token` on SIGTERM or SIGINT.
///
/// The listener also exits, without a signal, once `token` is cancelled by
/// anyone else, so a monitor stopped from code leaves no task behind.
pub fn watch_signals(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, stopping all groups");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, stopping all groups");
            }
            _ = token.cancelled() => {
                tracing::debug!("Shutdown requested in-process, signal listener exiting");
            }
        }

        token.cancel();
    })
}
