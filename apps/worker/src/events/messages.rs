//! Inbound and outbound event payloads.
//!
//! Inbound events arrive from the scoring service over the bus; outbound
//! events announce report completion or failure downstream. Optional
//! payloads (`job`, `resume`) may be absent — the pipeline degrades
//! gracefully rather than rejecting the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::score::ScorePayload;

/// The kind of report a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    MatchAnalysis,
    CandidateSummary,
    FullReport,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::MatchAnalysis => "match-analysis",
            ReportType::CandidateSummary => "candidate-summary",
            ReportType::FullReport => "full-report",
        }
    }
}

impl Default for ReportType {
    fn default() -> Self {
        ReportType::MatchAnalysis
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inbound
// ────────────────────────────────────────────────────────────────────────────

/// A candidate was scored against a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScored {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub resume_id: String,
    /// The scoring result. Mandatory; validated at intake rather than by
    /// deserialization so the failure carries a correlation id.
    pub score: Option<ScorePayload>,
    #[serde(default)]
    pub job: Option<Value>,
    #[serde(default)]
    pub resume: Option<Value>,
    #[serde(default)]
    pub metadata: Option<EventMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    pub requested_by: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub report_type: Option<ReportType>,
}

/// An explicit request to (re)generate a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerationRequested {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub resume_id: String,
    pub report_type: ReportType,
    #[serde(default)]
    pub requested_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Outbound
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerated {
    pub job_id: String,
    pub resume_id: String,
    pub report_id: Uuid,
    pub report_type: ReportType,
    pub blob_location: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerationFailed {
    pub job_id: String,
    pub resume_id: String,
    pub report_type: ReportType,
    pub error: String,
    /// Always 0: redelivery attempts are not tracked across deliveries.
    pub retry_count: u32,
    pub timestamp: DateTime<Utc>,
}
