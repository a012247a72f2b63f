//! System health evaluation over the trailing hour.
//!
//! Thresholds:
//! - success rate < 95% → degraded, < 80% → unhealthy
//! - mean latency above the generation budget → degraded
//! - mean quality score below 4.0 (when samples exist) → degraded
//! - more than 10 concurrently active operations → advisory alert only
//!
//! Simultaneous conditions escalate to the worst status.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::monitoring::tracker::PerformanceTracker;

const DEGRADED_SUCCESS_RATE: f64 = 0.95;
const UNHEALTHY_SUCCESS_RATE: f64 = 0.80;
const MIN_QUALITY_SCORE: f64 = 4.0;
const MAX_ACTIVE_OPERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn escalate(self, other: HealthStatus) -> HealthStatus {
        self.max(other)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub success_rate: Option<f64>,
    pub average_duration_ms: Option<f64>,
    pub average_quality: Option<f64>,
    pub active_operations: usize,
    pub alerts: Vec<String>,
}

impl PerformanceTracker {
    /// Evaluates system health over the hour trailing `now`.
    pub fn system_health(&self, now: DateTime<Utc>) -> SystemHealth {
        let spans = self.spans_between(now - Duration::hours(1), now);
        let quality = self.quality_between(now - Duration::hours(1), now);
        let active_operations = self.active_operations();

        let mut status = HealthStatus::Healthy;
        let mut alerts = Vec::new();

        let success_rate = if spans.is_empty() {
            None
        } else {
            Some(spans.iter().filter(|s| s.success).count() as f64 / spans.len() as f64)
        };
        if let Some(rate) = success_rate {
            if rate < UNHEALTHY_SUCCESS_RATE {
                status = status.escalate(HealthStatus::Unhealthy);
                alerts.push(format!("success rate {:.0}% below 80%", rate * 100.0));
            } else if rate < DEGRADED_SUCCESS_RATE {
                status = status.escalate(HealthStatus::Degraded);
                alerts.push(format!("success rate {:.0}% below 95%", rate * 100.0));
            }
        }

        let durations: Vec<i64> = spans.iter().filter_map(|s| s.duration_ms).collect();
        let average_duration_ms = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
        };
        if let Some(avg) = average_duration_ms {
            if avg > self.generation_budget_ms() as f64 {
                status = status.escalate(HealthStatus::Degraded);
                alerts.push(format!(
                    "mean latency {avg:.0}ms exceeds the {}ms generation budget",
                    self.generation_budget_ms()
                ));
            }
        }

        let average_quality = if quality.is_empty() {
            None
        } else {
            Some(quality.iter().map(|q| q.quality_score).sum::<f64>() / quality.len() as f64)
        };
        if let Some(avg) = average_quality {
            if avg < MIN_QUALITY_SCORE {
                status = status.escalate(HealthStatus::Degraded);
                alerts.push(format!("mean quality score {avg:.2} below {MIN_QUALITY_SCORE}"));
            }
        }

        // Advisory only: high concurrency never changes the status by itself.
        if active_operations > MAX_ACTIVE_OPERATIONS {
            alerts.push(format!(
                "{active_operations} operations in flight (advisory ceiling {MAX_ACTIVE_OPERATIONS})"
            ));
        }

        SystemHealth {
            status,
            success_rate,
            average_duration_ms,
            average_quality,
            active_operations,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{CriteriaScores, QualityMetric};
    use crate::monitoring::tracker::{OperationMetadata, PerformanceSpan};
    use uuid::Uuid;

    fn tracker() -> PerformanceTracker {
        PerformanceTracker::new(30, 30_000)
    }

    fn span(duration_ms: i64, success: bool) -> PerformanceSpan {
        let started = Utc::now() - Duration::minutes(10);
        PerformanceSpan {
            operation_name: "generate_report".to_string(),
            started_at: started,
            ended_at: Some(started + Duration::milliseconds(duration_ms)),
            duration_ms: Some(duration_ms),
            success,
            error_message: None,
            metadata: OperationMetadata::default(),
        }
    }

    fn record_rate(tracker: &PerformanceTracker, successes: usize, failures: usize) {
        for _ in 0..successes {
            tracker.record_span(span(100, true));
        }
        for _ in 0..failures {
            tracker.record_span(span(100, false));
        }
    }

    #[test]
    fn test_70_percent_success_is_unhealthy() {
        let t = tracker();
        record_rate(&t, 70, 30);
        assert_eq!(t.system_health(Utc::now()).status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_90_percent_success_is_degraded() {
        let t = tracker();
        record_rate(&t, 90, 10);
        assert_eq!(t.system_health(Utc::now()).status, HealthStatus::Degraded);
    }

    #[test]
    fn test_99_percent_success_is_healthy() {
        let t = tracker();
        record_rate(&t, 99, 1);
        assert_eq!(t.system_health(Utc::now()).status, HealthStatus::Healthy);
    }

    #[test]
    fn test_no_spans_is_healthy() {
        let t = tracker();
        let health = t.system_health(Utc::now());
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.success_rate.is_none());
    }

    #[test]
    fn test_slow_mean_latency_degrades() {
        let t = tracker();
        t.record_span(span(45_000, true));
        let health = t.system_health(Utc::now());
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(health.alerts.iter().any(|a| a.contains("generation budget")));
    }

    #[test]
    fn test_low_quality_degrades() {
        let t = tracker();
        t.record_span(span(100, true));
        t.record_quality(QualityMetric {
            report_id: Uuid::new_v4(),
            quality_score: 3.0,
            criteria: CriteriaScores {
                completeness: 3.0,
                accuracy: 3.0,
                relevance: 3.0,
                clarity: 3.0,
                actionability: 3.0,
            },
            reviewer_feedback: Some("thin analysis".to_string()),
            recorded_at: Utc::now() - Duration::minutes(5),
        });
        assert_eq!(t.system_health(Utc::now()).status, HealthStatus::Degraded);
    }

    #[test]
    fn test_simultaneous_conditions_take_the_worst() {
        let t = tracker();
        // 70% success (unhealthy) and slow latency (degraded).
        for _ in 0..7 {
            t.record_span(span(45_000, true));
        }
        for _ in 0..3 {
            t.record_span(span(45_000, false));
        }
        let health = t.system_health(Utc::now());
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.alerts.len() >= 2);
    }

    #[test]
    fn test_high_concurrency_is_advisory_only() {
        let t = tracker();
        t.record_span(span(100, true));
        for _ in 0..11 {
            t.start_operation("generate_report", OperationMetadata::default());
        }
        let health = t.system_health(Utc::now());
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.alerts.iter().any(|a| a.contains("in flight")));
    }
}
