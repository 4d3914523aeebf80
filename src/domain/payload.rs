//! Wire payloads for each endpoint.

use serde::{Deserialize, Serialize};

/// Current robot pose. Always pushed in full.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Heading in radians.
    pub angle: f64,
}

impl Pose {
    /// Creates a pose from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, angle: f64) -> Self {
        Self { x, y, angle }
    }

    /// Merges a partial update into this pose. Absent fields are left as
    /// they are.
    pub fn apply(&mut self, update: &PoseUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(angle) = update.angle {
            self.angle = angle;
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(60.0, 40.0, 1.5707)
    }
}

/// Partial pose sent by clients. Any subset of the fields may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseUpdate {
    /// New horizontal position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// New vertical position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// New heading in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

impl PoseUpdate {
    /// An update that only moves `x`.
    #[must_use]
    pub const fn x(x: f64) -> Self {
        Self {
            x: Some(x),
            y: None,
            angle: None,
        }
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.angle.is_none()
    }
}

impl From<Pose> for PoseUpdate {
    fn from(pose: Pose) -> Self {
        Self {
            x: Some(pose.x),
            y: Some(pose.y),
            angle: Some(pose.angle),
        }
    }
}

/// Pause/resume flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausedState {
    /// `true` while the robot is held still.
    pub paused: bool,
}

impl PausedState {
    /// Creates the payload for the given flag.
    #[must_use]
    pub const fn new(paused: bool) -> Self {
        Self { paused }
    }
}
