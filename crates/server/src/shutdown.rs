//! Graceful shutdown on Ctrl+C or SIGTERM
//!
//! Shutdown is a `CancellationToken`: cloned into every task that must stop,
//! with child tokens for components that can also be stopped on their own.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates graceful shutdown across components.
#[derive(Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Controller cancelled by Ctrl+C, or SIGTERM on unix.
    ///
    /// Spawns the listening task, so it must be called inside a runtime.
    pub fn with_signals() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            info!(signal, "Received signal, initiating graceful shutdown...");
            token.cancel();
        });

        controller
    }

    /// Child token, cancelled with this controller but also cancellable alone.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger shutdown manually
    pub fn shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
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
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Token cancelled on Ctrl+C or SIGTERM
pub fn shutdown_signal() -> CancellationToken {
    ShutdownController::with_signals().token()
}
