//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::Endpoint;

/// `GET /api/{endpoint}` — Upgrade HTTP connection to a WebSocket for the
/// named endpoint.
///
/// Unknown endpoint names answer `404` before any upgrade is attempted.
pub async fn ws_handler(
    Path(name): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let endpoint = match name.parse::<Endpoint>() {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::debug!(%peer, endpoint = %name, "upgrade for unknown endpoint");
            return e.into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let shared = Arc::clone(&state.shared);
    let push_period = state.push_period;
    ws.on_upgrade(move |socket| run_connection(socket, endpoint, shared, push_period, peer))
}
