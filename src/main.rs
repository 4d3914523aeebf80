//! robot-link server entry point.
//!
//! Starts the simulation tick and the Axum server with the pose and
//! paused WebSocket endpoints.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use robot_link::api;
use robot_link::app_state::AppState;
use robot_link::config::ServerConfig;
use robot_link::domain::SharedState;
use robot_link::service::Simulation;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load `.env` before the subscriber reads RUST_LOG / LOG_FORMAT.
    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting robot-link");

    // Build domain layer
    let shared = Arc::new(SharedState::default());

    // Start background simulation
    let simulation = Simulation::new(Arc::clone(&shared), config.motion, config.tick_period).spawn();

    // Build application state
    let app_state = AppState {
        shared,
        push_period: config.push_period,
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let served = api::serve(listener, app_state).await;
    simulation.abort();
    served?;

    Ok(())
}

/// Installs the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
