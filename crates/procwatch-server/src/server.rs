//! HTTP server implementation using Axum.

use crate::handler::{handle_health, handle_ws};
use crate::origin::OriginPolicy;
use axum::{routing::get, Router};
use procwatch_core::{ServerConfig, SubscriptionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Per-client polling sessions
    pub manager: SubscriptionManager,
    /// Origins allowed to open a WebSocket
    pub origins: OriginPolicy,
}

/// Build the router: WebSocket at `/ws` (and `/`), health at `/health`.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = state.origins.cors_layer()?;

    Ok(Router::new()
        .route("/", get(handle_ws))
        .route(ServerConfig::WS_PATH, get(handle_ws))
        .route(ServerConfig::HEALTH_PATH, get(handle_health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

/// Start the server.
///
/// Returns the actual address the server is bound to (useful when port=0) and
/// the shared state, so the caller can shut sessions down.
pub async fn start_server(
    manager: SubscriptionManager,
    origins: OriginPolicy,
    host: &str,
    port: u16,
) -> anyhow::Result<(SocketAddr, Arc<AppState>)> {
    let state = Arc::new(AppState { manager, origins });
    let app = router(state.clone())?;

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, state))
}
