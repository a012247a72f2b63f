//! Generation context assembly.
//!
//! The context is the pipeline's working set: ids, report type, output
//! format, and whatever scoring/job/resume data the event carried. Missing
//! payloads degrade gracefully — the pipeline still runs with the data that
//! is present.

use serde_json::{json, Value};

use crate::events::messages::{MatchScored, ReportGenerationRequested, ReportType};
use crate::models::report::ReportRecord;
use crate::models::score::ScorePayload;
use crate::render::OutputFormat;

#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub job_id: String,
    pub resume_id: String,
    pub report_type: ReportType,
    pub output_format: OutputFormat,
    pub requested_by: String,
    pub score: Option<ScorePayload>,
    pub job: Option<Value>,
    pub resume: Option<Value>,
    /// Snapshot of a previously stored record, present on explicit
    /// regeneration requests.
    pub prior: Option<Value>,
}

impl GenerationContext {
    pub fn from_match_scored(event: &MatchScored) -> Self {
        let metadata = event.metadata.clone().unwrap_or_default();
        Self {
            job_id: event.job_id.clone(),
            resume_id: event.resume_id.clone(),
            report_type: metadata.report_type.unwrap_or_default(),
            output_format: OutputFormat::Markdown,
            requested_by: metadata
                .requested_by
                .unwrap_or_else(|| "system".to_string()),
            score: event.score.clone(),
            job: event.job.clone(),
            resume: event.resume.clone(),
            prior: None,
        }
    }

    pub fn from_request(
        event: &ReportGenerationRequested,
        existing: Option<&ReportRecord>,
    ) -> Self {
        Self {
            job_id: event.job_id.clone(),
            resume_id: event.resume_id.clone(),
            report_type: event.report_type,
            output_format: OutputFormat::Markdown,
            requested_by: event
                .requested_by
                .clone()
                .unwrap_or_else(|| "system".to_string()),
            score: None,
            job: None,
            resume: None,
            prior: existing.map(|record| {
                json!({
                    "summary": record.summary,
                    "recommendation": record.recommendation,
                    "score_breakdown": record.score_breakdown,
                    "skills_analysis": record.skills_analysis,
                })
            }),
        }
    }

    /// The flat/nested variable bag fed to templates and the narrative
    /// prompt. Every key is present even when the source data is not, so
    /// templates degrade to empty substitutions instead of failing.
    pub fn variables(&self) -> Value {
        let mut vars = json!({
            "job_id": self.job_id,
            "resume_id": self.resume_id,
            "report_type": self.report_type.as_str(),
            "requested_by": self.requested_by,
        });

        if let Some(score) = &self.score {
            let decision = score.recommendations.decision;
            vars["overall_score"] = json!(score.overall_score);
            vars["confidence"] = json!(score.analysis_confidence);
            vars["decision"] = json!(decision.label());
            vars["decision_headline"] = json!(decision.headline());
            vars["reasoning"] = json!(score.recommendations.reasoning);
            vars["strengths"] = json!(score.recommendations.strengths);
            vars["concerns"] = json!(score.recommendations.concerns);
            vars["suggestions"] = json!(score.recommendations.suggestions);
            vars["breakdown"] = json!(score.breakdown);
            vars["skills"] = Value::Array(
                score
                    .matching_skills
                    .iter()
                    .map(|s| {
                        json!({
                            "skill": s.skill,
                            "match_score": s.match_score,
                            "match_type": s.match_type,
                            "explanation": s.explanation,
                        })
                    })
                    .collect(),
            );
        }

        if let Some(job) = &self.job {
            vars["job"] = job.clone();
        }
        if let Some(resume) = &self.resume {
            vars["resume"] = resume.clone();
        }
        if let Some(prior) = &self.prior {
            vars["prior"] = prior.clone();
        }
        vars
    }
}
