//! Operation span tracking.
//!
//! The tracker is the process-local observability core: pipeline operations
//! open a span on start and close it on end; reviewers feed quality scores
//! in independently. History is append-ordered by time, which the retention
//! sweep and the trailing-window queries rely on.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::report::QualityMetric;

/// Optional context attached to a span. `merge` fills gaps from a second
/// metadata value without overwriting what the span already knows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationMetadata {
    pub report_type: Option<String>,
    pub job_id: Option<String>,
    pub resume_id: Option<String>,
    pub output_format: Option<String>,
    pub model_id: Option<String>,
    pub confidence: Option<f64>,
    pub file_size: Option<u64>,
}

impl OperationMetadata {
    pub fn merge(&mut self, other: OperationMetadata) {
        self.report_type = self.report_type.take().or(other.report_type);
        self.job_id = self.job_id.take().or(other.job_id);
        self.resume_id = self.resume_id.take().or(other.resume_id);
        self.output_format = self.output_format.take().or(other.output_format);
        self.model_id = self.model_id.take().or(other.model_id);
        self.confidence = self.confidence.or(other.confidence);
        self.file_size = self.file_size.or(other.file_size);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSpan {
    pub operation_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: OperationMetadata,
}

#[derive(Default)]
struct TrackerInner {
    active: HashMap<Uuid, PerformanceSpan>,
    history: Vec<PerformanceSpan>,
    quality: Vec<QualityMetric>,
}

pub struct PerformanceTracker {
    inner: Mutex<TrackerInner>,
    retention: Duration,
    generation_budget_ms: i64,
}

impl PerformanceTracker {
    pub fn new(retention_days: i64, generation_budget_ms: i64) -> Self {
        Self {
            inner: Mutex::new(TrackerInner::default()),
            retention: Duration::days(retention_days),
            generation_budget_ms,
        }
    }

    pub fn generation_budget_ms(&self) -> i64 {
        self.generation_budget_ms
    }

    /// Opens a span and returns its operation id.
    pub fn start_operation(&self, name: &str, metadata: OperationMetadata) -> Uuid {
        let id = Uuid::new_v4();
        let span = PerformanceSpan {
            operation_name: name.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            success: false,
            error_message: None,
            metadata,
        };
        let mut inner = self.inner.lock().expect("tracker lock poisoned");
        inner.active.insert(id, span);
        id
    }

    /// Closes a span and appends it to history. An unknown id (never started,
    /// or already ended) is a no-op returning `None` — completing an
    /// operation twice must not crash the caller.
    pub fn end_operation(
        &self,
        id: Uuid,
        success: bool,
        error_message: Option<String>,
        extra_metadata: Option<OperationMetadata>,
    ) -> Option<PerformanceSpan> {
        let mut inner = self.inner.lock().expect("tracker lock poisoned");
        let mut span = inner.active.remove(&id)?;
        let ended = Utc::now();
        span.duration_ms = Some((ended - span.started_at).num_milliseconds());
        span.ended_at = Some(ended);
        span.success = success;
        span.error_message = error_message;
        if let Some(extra) = extra_metadata {
            span.metadata.merge(extra);
        }
        inner.history.push(span.clone());
        Some(span)
    }

    /// Appends a pre-built span directly. Used by replay/backfill and tests.
    pub fn record_span(&self, span: PerformanceSpan) {
        let mut inner = self.inner.lock().expect("tracker lock poisoned");
        inner.history.push(span);
    }

    pub fn record_quality(&self, metric: QualityMetric) {
        let mut inner = self.inner.lock().expect("tracker lock poisoned");
        inner.quality.push(metric);
    }

    pub fn active_operations(&self) -> usize {
        self.inner.lock().expect("tracker lock poisoned").active.len()
    }

    /// Completed spans whose start falls in `[from, to)`.
    pub fn spans_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PerformanceSpan> {
        let inner = self.inner.lock().expect("tracker lock poisoned");
        inner
            .history
            .iter()
            .filter(|s| s.started_at >= from && s.started_at < to)
            .cloned()
            .collect()
    }

    /// Quality samples recorded in `[from, to)`.
    pub fn quality_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<QualityMetric> {
        let inner = self.inner.lock().expect("tracker lock poisoned");
        inner
            .quality
            .iter()
            .filter(|q| q.recorded_at >= from && q.recorded_at < to)
            .cloned()
            .collect()
    }

    /// Evicts spans and quality samples older than the retention window.
    /// Both lists are append-ordered by time, so eviction is a prefix drain.
    /// Returns the number of evicted entries.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let mut inner = self.inner.lock().expect("tracker lock poisoned");

        let span_keep = inner
            .history
            .iter()
            .position(|s| s.started_at >= cutoff)
            .unwrap_or(inner.history.len());
        inner.history.drain(..span_keep);

        let quality_keep = inner
            .quality
            .iter()
            .position(|q| q.recorded_at >= cutoff)
            .unwrap_or(inner.quality.len());
        inner.quality.drain(..quality_keep);

        span_keep + quality_keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::CriteriaScores;

    fn span_at(
        minutes_ago: i64,
        duration_ms: i64,
        success: bool,
        error: Option<&str>,
    ) -> PerformanceSpan {
        let started = Utc::now() - Duration::minutes(minutes_ago);
        PerformanceSpan {
            operation_name: "generate_report".to_string(),
            started_at: started,
            ended_at: Some(started + Duration::milliseconds(duration_ms)),
            duration_ms: Some(duration_ms),
            success,
            error_message: error.map(|e| e.to_string()),
            metadata: OperationMetadata::default(),
        }
    }

    #[test]
    fn test_start_end_produces_closed_span() {
        let tracker = PerformanceTracker::new(30, 30_000);
        let id = tracker.start_operation("generate_report", OperationMetadata::default());
        assert_eq!(tracker.active_operations(), 1);

        let span = tracker.end_operation(id, true, None, None).unwrap();
        assert!(span.success);
        assert!(span.duration_ms.unwrap() >= 0);
        assert_eq!(tracker.active_operations(), 0);
    }

    #[test]
    fn test_end_unknown_operation_is_noop() {
        let tracker = PerformanceTracker::new(30, 30_000);
        assert!(tracker
            .end_operation(Uuid::new_v4(), true, None, None)
            .is_none());
    }

    #[test]
    fn test_end_twice_returns_none_second_time() {
        let tracker = PerformanceTracker::new(30, 30_000);
        let id = tracker.start_operation("generate_report", OperationMetadata::default());
        assert!(tracker.end_operation(id, true, None, None).is_some());
        assert!(tracker.end_operation(id, true, None, None).is_none());
    }

    #[test]
    fn test_extra_metadata_fills_gaps_only() {
        let tracker = PerformanceTracker::new(30, 30_000);
        let id = tracker.start_operation(
            "generate_report",
            OperationMetadata {
                job_id: Some("job-1".to_string()),
                ..Default::default()
            },
        );
        let span = tracker
            .end_operation(
                id,
                true,
                None,
                Some(OperationMetadata {
                    job_id: Some("job-2".to_string()),
                    file_size: Some(500_000),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_eq!(span.metadata.job_id.as_deref(), Some("job-1"));
        assert_eq!(span.metadata.file_size, Some(500_000));
    }

    #[test]
    fn test_sweep_evicts_only_expired() {
        let tracker = PerformanceTracker::new(30, 30_000);
        tracker.record_span(span_at(60 * 24 * 40, 100, true, None)); // 40 days old
        tracker.record_span(span_at(10, 100, true, None));
        tracker.record_quality(QualityMetric {
            report_id: Uuid::new_v4(),
            quality_score: 4.5,
            criteria: CriteriaScores {
                completeness: 4.0,
                accuracy: 5.0,
                relevance: 4.5,
                clarity: 4.5,
                actionability: 4.0,
            },
            reviewer_feedback: None,
            recorded_at: Utc::now() - Duration::days(40),
        });

        let evicted = tracker.sweep_expired(Utc::now());
        assert_eq!(evicted, 2);

        let recent = tracker.spans_between(Utc::now() - Duration::hours(1), Utc::now());
        assert_eq!(recent.len(), 1);
    }
}
