use console::Term;
use tokio::sync::watch;

/// Install the Ctrl+C handler for graceful shutdown.
///
/// Must be called before the first cycle starts, so a Ctrl+C during a long
/// cycle is caught instead of killing the process. The first Ctrl+C flips
/// the returned flag; the caller finishes the cycle in flight and returns.
/// A second Ctrl+C exits the process immediately with status 130.
pub(crate) fn setup_shutdown_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler, running until killed");
            // Keep the sender alive so waiters never see a closed channel.
            std::future::pending::<()>().await;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current sync cycle...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current sync cycle");
        }

        let _ = tx.send(true);

        // Wait for second Ctrl+C for force quit
        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });

    rx
}

/// Resolves once shutdown has been requested, including before this is first
/// polled.
pub(crate) async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        // Handler gone without a request: never shut down on our own.
        std::future::pending::<()>().await;
    }
}
