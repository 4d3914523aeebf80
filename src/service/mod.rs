//! Service layer: background work that owns no connection.

pub mod simulation;

pub use simulation::Simulation;
