//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::SharedState;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The process-wide record every connection pushes from.
    pub shared: Arc<SharedState>,
    /// Interval between pushes on each connection.
    pub push_period: Duration,
}
