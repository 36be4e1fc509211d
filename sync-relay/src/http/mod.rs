//! HTTP endpoints for sync-relay.
//!
//! Serves the WebSocket upgrade, a health check, and a plain-text banner.

pub mod health;

use crate::error::{RelayError, Result};
use crate::protocol::{ws_handler, WS_PATH};
use crate::server::RelayHub;
use axum::{routing::get, Extension, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(hub: Arc<RelayHub>) -> Router {
    Router::new()
        .route("/", get(banner_handler))
        .route(WS_PATH, get(ws_handler))
        .route("/health", get(health::health_handler))
        .layer(Extension(hub))
}

/// Plain-text banner for humans who open the session URL in a browser.
async fn banner_handler() -> String {
    format!(
        "waveland relay v{}\nConnect with: waveland join <this url>\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Bind the configured listen address.
///
/// Fails before binding if the hub's limits are unusable.
pub async fn bind(hub: &RelayHub) -> Result<TcpListener> {
    hub.config().validate()?;
    let address = &hub.config().server.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| RelayError::Bind {
            address: address.clone(),
            source,
        })
}

/// Serve the router on `listener` until `shutdown` resolves.
///
/// On shutdown every peer is closed so upgraded sockets do not outlive
/// the server.
pub async fn serve<F>(listener: TcpListener, hub: Arc<RelayHub>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Relay listening on {}", addr);
    }

    let app = build_router(Arc::clone(&hub));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutting down relay");
            hub.close_all().await;
        })
        .await?;
    Ok(())
}
