//! HTTP API implementation
//!
//! Receives Alertmanager webhooks and exposes health and metrics endpoints.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::Result;

/// HTTP API server
pub struct HttpServer {
    state: AppState,
    webhook_path: String,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(state: AppState, webhook_path: impl Into<String>) -> Self {
        Self {
            state,
            webhook_path: webhook_path.into(),
        }
    }

    /// Serve until Ctrl+C is received
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = create_router(self.state, &self.webhook_path);

        let listener = TcpListener::bind(addr).await?;

        info!(addr, path = %self.webhook_path, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, shutting down...");
}
