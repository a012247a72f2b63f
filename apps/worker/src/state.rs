use std::sync::Arc;

use crate::config::Config;
use crate::monitoring::PerformanceTracker;

/// Shared application state injected into route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<PerformanceTracker>,
    pub config: Config,
}
