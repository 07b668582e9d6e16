//! HTTP server lifecycle for the gateway router.

use std::net::SocketAddr;

use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::GatewayError;

/// Binds a listener, serves a router on a background task and shuts it down
/// gracefully on request.
pub struct GatewayServer {
    addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl GatewayServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            local_addr: None,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Bind the listener and spawn the server. Returns the bound address,
    /// which differs from the configured one when binding port 0.
    pub async fn start(&mut self, app: Router) -> Result<SocketAddr, GatewayError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::StartupFailed {
                reason: format!("Failed to bind to {}: {}", self.addr, e),
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::StartupFailed {
                reason: e.to_string(),
            })?;

        tracing::info!(addr = %local_addr, "Gateway listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Gateway shutting down");
                })
                .await
            {
                tracing::error!(error = %e, "Gateway server error");
            }
        });

        self.handle = Some(handle);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Signal graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;

    use super::*;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut server = GatewayServer::new("127.0.0.1:0".parse().unwrap());
        let app = Router::new().route("/ping", get(|| async { "pong" }));
        let addr = server.start(app).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(server.local_addr(), Some(addr));

        let body = reqwest::get(format!("http://{addr}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let mut server = GatewayServer::new("127.0.0.1:0".parse().unwrap());
        server.shutdown().await;
        assert!(server.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_startup_failure() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let mut server = GatewayServer::new(addr);
        let err = server.start(Router::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::StartupFailed { .. }));
    }
}
