//! # robot-link
//!
//! Self-healing, typed WebSocket streams and the periodic state
//! broadcaster they talk to.
//!
//! The server holds one shared record (robot pose and a paused flag),
//! advances the pose on a simulation tick and pushes the record to every
//! connected peer on a fixed period. Clients hold a [`client::ResilientStream`]
//! per endpoint that reconnects on its own until it is closed.
//!
//! ## Architecture
//!
//! ```text
//! Client                                   Server
//!   StreamBinding (client/)                  Router (api/)
//!     │                                        ├── /health
//!     ├── ResilientStream ── /api/pose ───────▶├── WS handler (ws/)
//!     │     └── liveness timer  /api/paused    │     └── push loop per connection
//!     │                                        │
//!     └── ObserverRegistry                     ├── Simulation tick (service/)
//!                                              └── SharedState (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
