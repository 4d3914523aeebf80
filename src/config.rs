//! Configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). [`ServerConfig`] drives the
//! broadcaster binary, [`StreamConfig`] drives client streams.

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::MotionProfile;

/// Default client liveness-check interval.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(1000);

/// Default upper bound on a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default server push and tick period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(50);

/// Broadcaster configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Interval between state pushes on each connection.
    pub push_period: Duration,

    /// Interval between simulation ticks.
    pub tick_period: Duration,

    /// Motion applied to `x` on every unpaused tick.
    pub motion: MotionProfile,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let push_period = parse_env_millis("PUSH_PERIOD_MS", DEFAULT_PERIOD);
        let tick_period = parse_env_millis("TICK_PERIOD_MS", DEFAULT_PERIOD);

        let defaults = MotionProfile::default();
        let motion = MotionProfile::new(
            parse_env("MOTION_AMPLITUDE", defaults.amplitude),
            parse_env("MOTION_SPEED", defaults.speed),
        );

        Ok(Self {
            listen_addr,
            push_period,
            tick_period,
            motion,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            push_period: DEFAULT_PERIOD,
            tick_period: DEFAULT_PERIOD,
            motion: MotionProfile::default(),
        }
    }
}

/// Client stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Base WebSocket URL of the broadcaster (e.g. `ws://localhost:3000`).
    pub base_url: String,

    /// Interval between liveness checks.
    pub check_interval: Duration,

    /// How long a single connection attempt may stay pending before it is
    /// abandoned and counted as a failed attempt.
    pub connect_timeout: Duration,
}

impl StreamConfig {
    /// Creates a configuration for `base_url` with the default interval.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Overrides the liveness-check interval. A zero interval keeps the
    /// default, since tokio intervals cannot have a zero period.
    #[must_use]
    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        if !check_interval.is_zero() {
            self.check_interval = check_interval;
        }
        self
    }

    /// Overrides the connection attempt timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Loads `STREAM_BASE_URL`, `CHECK_INTERVAL_MS` and
    /// `CONNECT_TIMEOUT_MS` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("STREAM_BASE_URL")
            .unwrap_or_else(|_| "ws://localhost:3000".to_string());

        Self::new(base_url)
            .with_check_interval(parse_env_millis("CHECK_INTERVAL_MS", DEFAULT_CHECK_INTERVAL))
            .with_connect_timeout(parse_env_millis("CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new("ws://localhost:3000")
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable holding milliseconds. Zero is rejected
/// since tokio intervals cannot have a zero period.
fn parse_env_millis(key: &str, default: Duration) -> Duration {
    match parse_env::<u64>(key, 0) {
        0 => default,
        ms => Duration::from_millis(ms),
    }
}
