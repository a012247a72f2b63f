pub mod health;
pub mod metrics;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(state)
}
