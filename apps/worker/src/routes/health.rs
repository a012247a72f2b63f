use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::monitoring::HealthStatus;
use crate::state::AppState;

/// GET /health
/// Reports the monitoring engine's view of the trailing hour. Unhealthy maps
/// to 503 so orchestrators can act on it; degraded still serves 200.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.tracker.system_health(Utc::now());
    let status_code = match health.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (
        status_code,
        Json(json!({
            "service": "dossier-worker",
            "version": env!("CARGO_PKG_VERSION"),
            "generation_budget_ms": state.config.generation_budget_ms(),
            "health": health,
        })),
    )
}
