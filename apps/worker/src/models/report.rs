use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a report record. Transitions only move forward:
/// pending → processing → {completed, failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (ReportStatus::Pending, ReportStatus::Processing)
                | (ReportStatus::Processing, ReportStatus::Completed)
                | (ReportStatus::Processing, ReportStatus::Failed)
        )
    }
}

/// One analysis report per `(job_id, resume_id)` pair.
///
/// `score_breakdown` and `skills_analysis` are stored as JSONB snapshots of
/// the scoring payload; `detailed_report_location` points at the narrative
/// blob once the pipeline completes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReportRecord {
    pub id: Uuid,
    pub job_id: String,
    pub resume_id: String,
    pub score_breakdown: Value,
    pub skills_analysis: Value,
    pub recommendation: String,
    pub summary: String,
    pub confidence: f64,
    pub processing_time_ms: i64,
    pub status: ReportStatus,
    pub error_message: Option<String>,
    pub generated_by: String,
    pub model_id: String,
    pub detailed_report_location: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Reviewer-assigned quality rating for a generated report, 0–5 overall with
/// per-criterion sub-scores. Correlated to spans by `report_id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetric {
    pub report_id: Uuid,
    pub quality_score: f64,
    pub criteria: CriteriaScores,
    pub reviewer_feedback: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub completeness: f64,
    pub accuracy: f64,
    pub relevance: f64,
    pub clarity: f64,
    pub actionability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(ReportStatus::Pending.can_transition_to(ReportStatus::Processing));
        assert!(ReportStatus::Processing.can_transition_to(ReportStatus::Completed));
        assert!(ReportStatus::Processing.can_transition_to(ReportStatus::Failed));
    }

    #[test]
    fn test_no_skipped_or_reversed_transitions() {
        assert!(!ReportStatus::Pending.can_transition_to(ReportStatus::Completed));
        assert!(!ReportStatus::Completed.can_transition_to(ReportStatus::Processing));
        assert!(!ReportStatus::Failed.can_transition_to(ReportStatus::Completed));
        assert!(!ReportStatus::Processing.can_transition_to(ReportStatus::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ReportStatus::Completed.is_terminal());
        assert!(ReportStatus::Failed.is_terminal());
        assert!(!ReportStatus::Processing.is_terminal());
        assert!(!ReportStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::Processing).unwrap(),
            "\"processing\""
        );
    }
}
