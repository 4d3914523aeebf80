//! WebSocket layer: upgrade handling, per-connection push loops and update
//! parsing.
//!
//! Each endpoint is served at `/api/<name>`. A connection pushes the
//! endpoint's current record on a fixed period and merges whatever the
//! peer sends back into the shared state.

pub mod connection;
pub mod handler;
pub mod messages;
