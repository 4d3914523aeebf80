//! Shared helpers for integration tests.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use robot_link::api;
use robot_link::app_state::AppState;
use robot_link::config::StreamConfig;
use robot_link::domain::{MotionProfile, SharedState, StateRecord};
use robot_link::service::Simulation;

/// A running server bound to a loopback port.
#[derive(Debug)]
pub struct TestServer {
    /// Bound address.
    pub addr: SocketAddr,
    /// The record the server pushes from.
    pub shared: Arc<SharedState>,
    server: JoinHandle<()>,
    simulation: JoinHandle<()>,
}

impl TestServer {
    /// Base WebSocket URL of this server.
    pub fn base_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Base HTTP URL of this server.
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stream config pointing at this server with a short liveness interval.
    pub fn stream_config(&self) -> StreamConfig {
        fast_stream_config(&self.base_url())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
        self.simulation.abort();
    }
}

/// Stream config with a 100 ms liveness interval.
pub fn fast_stream_config(base_url: &str) -> StreamConfig {
    StreamConfig::new(base_url)
        .with_check_interval(Duration::from_millis(100))
        .with_connect_timeout(Duration::from_secs(2))
}

/// Starts a server with the given initial record on an ephemeral port.
pub async fn start_server(initial: StateRecord) -> TestServer {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind loopback");
    };
    serve_on(listener, initial).await
}

/// Starts a server on an already-bound listener.
pub async fn serve_on(listener: TcpListener, initial: StateRecord) -> TestServer {
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has an address");
    };
    let shared = Arc::new(SharedState::new(initial));
    let simulation = Simulation::new(
        Arc::clone(&shared),
        MotionProfile::default(),
        Duration::from_millis(10),
    )
    .spawn();

    let state = AppState {
        shared: Arc::clone(&shared),
        push_period: Duration::from_millis(20),
    };
    let server = tokio::spawn(async move {
        let _ = api::serve(listener, state).await;
    });

    TestServer {
        addr,
        shared,
        server,
        simulation,
    }
}

/// Reserves a loopback address with nothing listening on it.
pub async fn unused_addr() -> SocketAddr {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind loopback");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has an address");
    };
    drop(listener);
    addr
}

/// Polls `condition` every 10 ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
