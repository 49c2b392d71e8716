//! Server lifecycle traits

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A long-running server with graceful shutdown.
///
/// Implemented by [`HttpServer`](crate::http::HttpServer).
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Bound address while running; `None` before bind and after shutdown.
    fn address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    /// Bind, serve until `shutdown` is cancelled, then drain in-flight
    /// requests and return `Ok(())`.
    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Convenience methods for every [`Server`].
pub trait ServerExt: Server + Sized {
    /// Run on a new task. Cancel the returned token to stop it.
    fn spawn(self) -> (tokio::task::JoinHandle<Result<()>>, CancellationToken) {
        let token = CancellationToken::new();
        let token_clone = token.clone();
        let handle = tokio::spawn(async move { self.run(token_clone).await });
        (handle, token)
    }

    /// Run until Ctrl+C or SIGTERM.
    fn run_until_signal(self) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            let shutdown = crate::shutdown::ShutdownController::with_signals();
            self.run(shutdown.token()).await
        }
    }
}

impl<T: Server + Sized> ServerExt for T {}
