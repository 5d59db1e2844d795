//! Signal handling for cancelling a running sync
//!
//! CTRL-C and SIGTERM cancel a shared token; the CLI forwards that to
//! [`SyncCoordinator::cancel`](super::SyncCoordinator::cancel) so the pass
//! ends in `Done(Cancelled)` without persisting anything.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Turns process signals into a cancelled token
pub struct SignalHandler {
    shutdown: CancellationToken,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled when a signal arrives
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn the listener task
    pub fn setup(&self) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to listen for SIGTERM: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, cancelling sync"),
                _ = terminate => info!("Received terminate signal, cancelling sync"),
                _ = shutdown.cancelled() => return,
            }

            shutdown.cancel();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    /// The listener exits once the token is cancelled elsewhere
    #[tokio::test]
    async fn test_listener_stops_on_manual_cancel() {
        let handler = SignalHandler::new();
        let handle = handler.setup();

        handler.token().cancel();
        let result = timeout(Duration::from_millis(200), handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_tokens_are_shared() {
        let handler = SignalHandler::new();
        let a = handler.token();
        let b = handler.token();
        a.cancel();
        assert!(b.is_cancelled());
    }
}
