//! Per-connection push loop.
//!
//! Every accepted WebSocket runs its own loop: a push timer that sends the
//! current record for the connection's endpoint, and a reader that merges
//! incoming updates into the shared state. The loop (and with it the push
//! timer) ends when the peer closes or a write fails. A connection is
//! `Accepted` until then and `Closed` afterwards; there is no way back.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::time::MissedTickBehavior;

use super::messages::{parse_paused_update, parse_pose_update};
use crate::domain::{Endpoint, SharedState};
use crate::error::UpdateError;

/// Runs the push/read loop for a single WebSocket connection.
pub async fn run_connection(
    socket: WebSocket,
    endpoint: Endpoint,
    shared: Arc<SharedState>,
    push_period: Duration,
    peer: SocketAddr,
) {
    let conn_id = uuid::Uuid::new_v4();
    tracing::info!(%conn_id, %endpoint, %peer, "ws connection accepted");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut push = tokio::time::interval(push_period);
    push.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = push.tick() => {
                let json = match shared.payload_json(endpoint).await {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(%conn_id, error = %e, "failed to serialize state");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(%conn_id, %endpoint, payload = %text.as_str(), "incoming update");
                        if let Err(e) = apply_update(endpoint, &shared, text.as_str()).await {
                            tracing::warn!(%conn_id, %endpoint, error = %e, "dropping update frame");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%conn_id, error = %e, "ws read error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(%conn_id, %endpoint, %peer, "ws connection closed");
}

/// Parses `text` as an update for `endpoint` and merges it into `shared`.
///
/// Individually rejected fields are logged and skipped; valid fields in
/// the same frame still apply.
///
/// # Errors
///
/// Returns an [`UpdateError`] if the frame as a whole is unusable (not
/// JSON, or not an object). Nothing is applied in that case.
pub async fn apply_update(
    endpoint: Endpoint,
    shared: &SharedState,
    text: &str,
) -> Result<(), UpdateError> {
    match endpoint {
        Endpoint::Pose => {
            let parsed = parse_pose_update(text)?;
            log_rejected(endpoint, &parsed.rejected);
            if !parsed.update.is_empty() {
                let pose = shared.apply_pose_update(&parsed.update).await;
                tracing::debug!(x = pose.x, y = pose.y, angle = pose.angle, "pose updated");
            }
        }
        Endpoint::Paused => {
            let parsed = parse_paused_update(text)?;
            log_rejected(endpoint, &parsed.rejected);
            if let Some(paused) = parsed.update {
                shared.set_paused(paused).await;
                tracing::info!(paused, "paused flag updated");
            }
        }
    }
    Ok(())
}

fn log_rejected(endpoint: Endpoint, rejected: &[UpdateError]) {
    for error in rejected {
        tracing::warn!(%endpoint, error = %error, "rejected update field");
    }
}
