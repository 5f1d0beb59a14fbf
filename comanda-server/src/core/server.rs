use std::net::SocketAddr;

use tracing::{error, info};

use crate::core::{Config, ServerState};

/// HTTP server lifecycle: bind, serve, shut down on ctrl-c.
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Prefer this over `new` when state is already initialized, so a
    /// failed startup surfaces before the listener binds.
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let state = match &self.state {
            Some(state) => state.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let app = crate::api::build_app(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("🍽️ Comanda server listening on {}", addr);

        // Cancelling the hub lets long-lived WebSocket sessions exit, which
        // in turn lets the graceful shutdown below complete.
        let hub = state.hub.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                hub.shutdown();
            })
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down...");
}
