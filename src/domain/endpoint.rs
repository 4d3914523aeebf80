//! Logical channel identifiers and their payload bindings.
//!
//! [`Endpoint`] names a channel on the wire. [`Channel`] ties an endpoint to
//! the payload types flowing in each direction so that a
//! [`crate::client::ResilientStream`] is typed by the channel it talks to.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::payload::{PausedState, Pose, PoseUpdate};
use crate::error::ServerError;

/// A named logical channel. Endpoints are fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Robot pose: `{x, y, angle}`.
    Pose,
    /// Pause/resume control: `{paused}`.
    Paused,
}

impl Endpoint {
    /// Every endpoint the server exposes.
    pub const ALL: [Self; 2] = [Self::Pose, Self::Paused];

    /// Short name used in the URL path.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pose => "pose",
            Self::Paused => "paused",
        }
    }

    /// HTTP path the endpoint is served on (e.g. `/api/pose`).
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Pose => "/api/pose",
            Self::Paused => "/api/paused",
        }
    }

    /// Resolves the WebSocket URL for this endpoint against `base_url`
    /// (e.g. `ws://localhost:3000`). A trailing slash on the base is ignored.
    #[must_use]
    pub fn url(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == s)
            .ok_or_else(|| ServerError::UnknownEndpoint(s.to_string()))
    }
}

/// Binds an [`Endpoint`] to the payload types it carries.
pub trait Channel: Send + Sync + 'static {
    /// The endpoint this channel connects to.
    const ENDPOINT: Endpoint;
    /// Payload pushed by the server.
    type Incoming: DeserializeOwned + Send + Sync + 'static;
    /// Payload sent by the client.
    type Outgoing: Serialize + Send + Sync + 'static;
}

/// The pose channel. The server pushes full poses; clients send partial
/// updates.
#[derive(Debug, Clone, Copy)]
pub struct PoseChannel;

impl Channel for PoseChannel {
    const ENDPOINT: Endpoint = Endpoint::Pose;
    type Incoming = Pose;
    type Outgoing = PoseUpdate;
}

/// The paused-flag channel. Same payload in both directions.
#[derive(Debug, Clone, Copy)]
pub struct PausedChannel;

impl Channel for PausedChannel {
    const ENDPOINT: Endpoint = Endpoint::Paused;
    type Incoming = PausedState;
    type Outgoing = PausedState;
}
