//! HTTP layer: router composition and server startup.
//!
//! WebSocket endpoints are mounted under `/api/{endpoint}`; `/health`
//! sits at the root.

pub mod system;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete router with all HTTP and WebSocket routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/{endpoint}", get(ws_handler))
        .merge(system::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the router on `listener` until the server fails.
///
/// Peer addresses are made available to handlers through
/// [`axum::extract::ConnectInfo`].
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
