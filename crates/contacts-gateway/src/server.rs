use std::sync::Arc;

use contacts_common::{Error, Result};
use contacts_config::AppConfig;
use contacts_db::Database;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// The HTTP server that binds to a port and serves the contacts API.
pub struct GatewayServer {
    config: AppConfig,
    db: Arc<Database>,
}

impl GatewayServer {
    /// `db` must already have its migrations applied.
    pub fn new(config: AppConfig, db: Arc<Database>) -> Self {
        Self { config, db }
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);

        let state = Arc::new(AppState::new(self.db));
        let app = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("contacts API listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Gateway(format!("server error: {e}")))?;

        info!("contacts API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
