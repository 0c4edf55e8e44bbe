use crate::{create_router, AppState};
use anyhow::{Context, Result};
use hierarchy_core::Settings;
use hierarchy_graph::{GraphClient, Neo4jClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Server {
    state: AppState,
    settings: Settings,
}

impl Server {
    /// Connect the graph pool and assemble application state.
    pub async fn new(settings: Settings) -> Result<Self> {
        let client = Neo4jClient::connect(&settings.graph)
            .await
            .context("connecting to graph database")?;
        Ok(Self::with_client(Arc::new(client), settings))
    }

    pub fn with_client(client: Arc<dyn GraphClient>, settings: Settings) -> Self {
        let state = AppState::new(client, &settings);
        Self { state, settings }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .settings
            .server
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address {}", self.settings.server.bind_addr))?;

        let cancel = CancellationToken::new();
        let monitor = self
            .state
            .health
            .clone()
            .spawn_monitor(self.settings.health.interval(), cancel.clone());

        let listener = {
            let socket = if addr.is_ipv6() {
                tokio::net::TcpSocket::new_v6()
            } else {
                tokio::net::TcpSocket::new_v4()
            }?;
            let _ = socket.set_reuseaddr(true);
            let _ = socket.set_keepalive(true);
            socket
                .bind(addr)
                .with_context(|| format!("binding {}", addr))?;
            socket.listen(1024)?
        };

        info!(
            %addr,
            hierarchy_api_url = %self.settings.links.hierarchy_api_url,
            code_list_api_url = %self.settings.links.code_list_api_url,
            url_rewriting = self.settings.links.enable_url_rewriting,
            "Hierarchy API listening"
        );

        let store = self.state.store().clone();
        let served = axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        cancel.cancel();
        if let Err(e) = monitor.await {
            warn!(error = %e, "Health monitor ended abnormally");
        }

        let shutdown_timeout = self.settings.server.shutdown_timeout();
        match tokio::time::timeout(shutdown_timeout, store.close()).await {
            Ok(Ok(())) => info!("Graph connection pool closed"),
            Ok(Err(e)) => error!(error = %e, "Failed to close graph connection pool"),
            Err(_) => error!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Shutdown timed out closing graph connection pool"
            ),
        }

        served.context("serving HTTP")?;
        info!("Shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
