use thiserror::Error;
use uuid::Uuid;

/// Application-level error type for the report worker.
///
/// Every pipeline stage returns `Result<T, ReportError>` so the orchestrator
/// can distinguish retryable from terminal failures without matching on
/// message strings.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An inbound event is missing mandatory fields. Logged and dropped,
    /// never redelivered.
    #[error("invalid event data [{correlation_id}]: missing {}", missing.join(", "))]
    InvalidEvent {
        missing: Vec<String>,
        correlation_id: Uuid,
    },

    /// The content generator failed or timed out.
    #[error("content generation failed: {0}")]
    Generation(String),

    /// A blob or metadata write failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A produced artifact violated its declared size/page constraints, or a
    /// run crossed the generation budget. Distinct from ordinary generation
    /// failure.
    #[error("contract violation: {0}")]
    Contract(String),

    /// A comparison report was requested with fewer completed candidate
    /// records than it needs. Surfaced directly, record status untouched.
    #[error("insufficient candidates: need {needed}, found {found}")]
    InsufficientCandidates { needed: usize, found: usize },

    /// A derived report referenced a record that does not exist.
    #[error("report record not found: {0}")]
    RecordNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReportError {
    /// Whether the event consumer should leave the event unacked so the bus
    /// redelivers it. Invalid events and contract/precondition failures are
    /// deterministic and would fail again; upstream and storage failures may
    /// succeed on a later delivery.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReportError::Generation(_)
                | ReportError::Storage(_)
                | ReportError::Database(_)
                | ReportError::Internal(_)
        )
    }

    /// Constructor for the advisory generation-budget check.
    pub fn budget_exceeded(elapsed_ms: i64, budget_ms: i64) -> Self {
        ReportError::Contract(format!(
            "generation budget exceeded: {elapsed_ms}ms elapsed, budget {budget_ms}ms"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_event_lists_missing_fields() {
        let err = ReportError::InvalidEvent {
            missing: vec!["job_id".to_string(), "score".to_string()],
            correlation_id: Uuid::new_v4(),
        };
        let msg = err.to_string();
        assert!(msg.contains("job_id"));
        assert!(msg.contains("score"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ReportError::Generation("model timed out".into()).is_retryable());
        assert!(ReportError::Storage("s3 write failed".into()).is_retryable());
        assert!(!ReportError::Contract("artifact too small".into()).is_retryable());
        assert!(!ReportError::RecordNotFound("job-1/resume-1".into()).is_retryable());
        assert!(!ReportError::InvalidEvent {
            missing: vec!["job_id".into()],
            correlation_id: Uuid::new_v4(),
        }
        .is_retryable());
    }

    #[test]
    fn test_budget_exceeded_is_contract_violation() {
        let err = ReportError::budget_exceeded(31_000, 30_000);
        assert!(matches!(err, ReportError::Contract(_)));
        assert!(err.to_string().contains("31000ms"));
    }
}
