//! Domain layer: endpoints, payloads, motion model and shared state.
//!
//! This module contains the types both sides of the link agree on plus
//! the server-side record that every connection observes.

pub mod endpoint;
pub mod motion;
pub mod payload;
pub mod shared_state;

pub use endpoint::{Channel, Endpoint, PausedChannel, PoseChannel};
pub use motion::MotionProfile;
pub use payload::{PausedState, Pose, PoseUpdate};
pub use shared_state::{SharedState, StateRecord};
