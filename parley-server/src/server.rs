use crate::{Relay, RelayConfig, ws_handler};
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::{Router, routing::get};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

/// Serves a [`Relay`] over WebSocket.
pub struct RelayServer {
    relay: Relay,
    config: RelayConfig,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            relay: Relay::new(),
            config,
        }
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn router(&self) -> Result<Router> {
        self.config.validate()?;

        let router = Router::new()
            .route(&self.config.ws_path, get(ws_handler))
            .with_state(self.relay.clone());

        let Some(origin) = &self.config.allow_origin else {
            return Ok(router);
        };

        let allow_origin = if origin == "*" {
            AllowOrigin::from(Any)
        } else {
            let value = HeaderValue::from_str(origin)
                .with_context(|| format!("invalid allow-origin: {origin}"))?;
            AllowOrigin::exact(value)
        };
        let cors = CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST]);

        Ok(router.layer(cors))
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind_addr))
    }

    /// Runs until `shutdown` resolves, then shuts the relay down so open
    /// sockets are closed.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router()?;
        let relay = self.relay.clone();

        let addr = listener.local_addr()?;
        info!(
            "Signaling relay listening on ws://{}{}",
            addr, self.config.ws_path
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                relay.shutdown();
            })
            .await
            .context("Relay server failed")?;

        info!("Signaling relay stopped");
        Ok(())
    }
}
