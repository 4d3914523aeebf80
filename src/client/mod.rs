//! Client layer: self-healing typed streams and their consumer binding.
//!
//! ```text
//! consumer ─▶ StreamBinding ─▶ ResilientStream ─▶ transport (tokio-tungstenite)
//!                  ▲                  │
//!                  └── open/close ────┘── ObserverRegistry (message/open/close)
//! ```

pub mod binding;
pub mod observer;
pub mod stream;
pub mod transport;

pub use binding::{StreamBinding, StreamFactory};
pub use observer::{EventCallback, MessageCallback, ObserverRegistry};
pub use stream::{LinkState, ResilientStream, paused_stream, pose_stream};
