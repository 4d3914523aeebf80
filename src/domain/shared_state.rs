//! Process-wide state shared by every connection and the simulation tick.
//!
//! [`SharedState`] owns a single [`StateRecord`] behind a
//! [`tokio::sync::RwLock`]. Every mutation is a read-modify-write under the
//! write guard, so the tick and incoming updates never interleave inside a
//! record and no reader sees a half-applied update.

use tokio::sync::RwLock;

use super::Endpoint;
use super::motion::MotionProfile;
use super::payload::{PausedState, Pose, PoseUpdate};

/// The full server-side record. There is exactly one per process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateRecord {
    /// Current robot pose.
    pub pose: Pose,
    /// Whether the simulation is held still.
    pub paused: bool,
}

/// Authoritative state for all endpoints.
///
/// Shared via `Arc` between the simulation task and every WebSocket
/// connection. Last writer wins.
#[derive(Debug, Default)]
pub struct SharedState {
    record: RwLock<StateRecord>,
}

impl SharedState {
    /// Creates the shared state with the given initial record.
    #[must_use]
    pub fn new(initial: StateRecord) -> Self {
        Self {
            record: RwLock::new(initial),
        }
    }

    /// Returns a copy of the whole record.
    pub async fn snapshot(&self) -> StateRecord {
        *self.record.read().await
    }

    /// Returns the current pose.
    pub async fn pose(&self) -> Pose {
        self.record.read().await.pose
    }

    /// Returns the current paused flag.
    pub async fn paused(&self) -> PausedState {
        PausedState::new(self.record.read().await.paused)
    }

    /// Merges a partial pose update and returns the resulting pose.
    pub async fn apply_pose_update(&self, update: &PoseUpdate) -> Pose {
        let mut record = self.record.write().await;
        record.pose.apply(update);
        record.pose
    }

    /// Sets the paused flag.
    pub async fn set_paused(&self, paused: bool) -> PausedState {
        let mut record = self.record.write().await;
        record.paused = paused;
        PausedState::new(record.paused)
    }

    /// Advances the simulation by one tick at `now_ms`.
    ///
    /// Returns the new pose, or `None` if the record is paused and nothing
    /// moved.
    pub async fn advance(&self, profile: &MotionProfile, now_ms: i64) -> Option<Pose> {
        let mut record = self.record.write().await;
        if record.paused {
            return None;
        }
        record.pose.x += profile.step(now_ms);
        Some(record.pose)
    }

    /// Serializes the current payload for `endpoint` as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; this does not happen for the payload
    /// types defined in this crate.
    pub async fn payload_json(&self, endpoint: Endpoint) -> Result<String, serde_json::Error> {
        let record = self.snapshot().await;
        match endpoint {
            Endpoint::Pose => serde_json::to_string(&record.pose),
            Endpoint::Paused => serde_json::to_string(&PausedState::new(record.paused)),
        }
    }
}
