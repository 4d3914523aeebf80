//! Background simulation tick.
//!
//! Stands in for the controlled robot: the pose evolves on its own,
//! independently of any client connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::{MotionProfile, SharedState};

/// Drives the shared pose forward on a fixed period.
#[derive(Debug)]
pub struct Simulation {
    shared: Arc<SharedState>,
    profile: MotionProfile,
    period: Duration,
}

impl Simulation {
    /// Creates a simulation over `shared`.
    #[must_use]
    pub fn new(shared: Arc<SharedState>, profile: MotionProfile, period: Duration) -> Self {
        Self {
            shared,
            profile,
            period,
        }
    }

    /// Runs a single tick at the current wall-clock time.
    pub async fn tick(&self) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        if let Some(pose) = self.shared.advance(&self.profile, now_ms).await {
            tracing::trace!(x = pose.x, "simulation tick");
        }
    }

    /// Spawns the tick loop. The loop runs until the returned handle is
    /// aborted.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            tracing::info!(period = ?self.period, "simulation started");
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }
}
