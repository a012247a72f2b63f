use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::monitoring::DateRange;
use crate::state::AppState;

/// Days of history the summary endpoint reports over.
const SUMMARY_WINDOW_DAYS: i64 = 7;

/// GET /metrics
/// Aggregated performance and quality over the trailing week.
pub async fn metrics_handler(State(state): State<AppState>) -> Json<Value> {
    let now = Utc::now();
    let summary = state.tracker.performance_summary(&DateRange {
        from: now - Duration::days(SUMMARY_WINDOW_DAYS),
        to: now,
    });
    Json(json!({
        "window_days": SUMMARY_WINDOW_DAYS,
        "summary": summary,
    }))
}
