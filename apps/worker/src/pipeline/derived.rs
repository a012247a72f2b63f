//! Derived reports built from already-stored records.
#![allow(dead_code)]
//!
//! Comparison and interview-guide output reads completed report records and
//! renders through the template engine. Precondition failures
//! (`InsufficientCandidates`, `RecordNotFound`) surface directly to the
//! caller and never touch record status.

use serde_json::{json, Value};

use crate::errors::ReportError;
use crate::models::report::{ReportRecord, ReportStatus};
use crate::render::templates::{template_source, TemplateKind};
use crate::render::{render_str, Escape};
use crate::storage::ReportStore;

/// Minimum completed candidate records a comparison needs.
const MIN_COMPARISON_CANDIDATES: usize = 2;

/// Renders a ranked comparison of all completed reports for a job.
pub async fn comparison_report(
    store: &dyn ReportStore,
    job_id: &str,
) -> Result<String, ReportError> {
    let records = store.list_for_job(job_id).await?;
    let mut completed: Vec<ReportRecord> = records
        .into_iter()
        .filter(|r| r.status == ReportStatus::Completed)
        .collect();

    if completed.len() < MIN_COMPARISON_CANDIDATES {
        return Err(ReportError::InsufficientCandidates {
            needed: MIN_COMPARISON_CANDIDATES,
            found: completed.len(),
        });
    }

    completed.sort_by(|a, b| {
        overall_score(b)
            .partial_cmp(&overall_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let candidates: Vec<Value> = completed
        .iter()
        .map(|r| {
            json!({
                "resume_id": r.resume_id,
                "overall_score": overall_score(r),
                "recommendation": r.recommendation,
                "summary": r.summary,
            })
        })
        .collect();

    let vars = json!({
        "job_id": job_id,
        "candidate_count": completed.len(),
        "candidates": candidates,
        "leader": candidates[0],
    });

    render_str(
        template_source(TemplateKind::Comparison),
        &vars,
        Escape::None,
    )
    .map_err(|e| ReportError::Internal(anyhow::anyhow!("comparison template: {e}")))
}

/// Renders an interview guide for one candidate from the stored skill
/// analysis: missing skills become focus areas, exact matches confirmed
/// strengths, partial/related matches suggested questions.
pub async fn interview_guide(
    store: &dyn ReportStore,
    job_id: &str,
    resume_id: &str,
) -> Result<String, ReportError> {
    let record = store
        .find(job_id, resume_id)
        .await?
        .ok_or_else(|| ReportError::RecordNotFound(format!("{job_id}/{resume_id}")))?;

    let mut strengths = Vec::new();
    let mut concerns = Vec::new();
    let mut suggestions = Vec::new();
    if let Some(skills) = record.skills_analysis.as_array() {
        for skill in skills {
            let name = skill.get("skill").and_then(|v| v.as_str()).unwrap_or("");
            let explanation = skill
                .get("explanation")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            match skill.get("match_type").and_then(|v| v.as_str()) {
                Some("exact") => strengths.push(name.to_string()),
                Some("missing") => concerns.push(name.to_string()),
                Some("partial") | Some("related") => {
                    suggestions.push(format!("Ask about {name}: {explanation}"))
                }
                _ => {}
            }
        }
    }

    let vars = json!({
        "job_id": job_id,
        "resume_id": resume_id,
        "overall_score": overall_score(&record),
        "strengths": strengths,
        "concerns": concerns,
        "suggestions": suggestions,
    });

    render_str(
        template_source(TemplateKind::InterviewGuide),
        &vars,
        Escape::None,
    )
    .map_err(|e| ReportError::Internal(anyhow::anyhow!("interview guide template: {e}")))
}

fn overall_score(record: &ReportRecord) -> f64 {
    record
        .score_breakdown
        .get("overall_score")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pipeline::assembler::test_support::{context, harness, StubGenerator};

    async fn seeded_store() -> Arc<crate::storage::MemoryReportStore> {
        let h = harness(Arc::new(StubGenerator::ok("narrative")));
        h.pipeline.run(context("job-1", "resume-1")).await.unwrap();
        h.pipeline.run(context("job-1", "resume-2")).await.unwrap();
        h.store
    }

    #[tokio::test]
    async fn test_comparison_ranks_and_names_leader() {
        let store = seeded_store().await;
        let report = comparison_report(store.as_ref(), "job-1").await.unwrap();
        assert!(report.contains("# Candidate Comparison"));
        assert!(report.contains("resume-1"));
        assert!(report.contains("resume-2"));
        assert!(report.contains("## Leading Candidate"));
    }

    #[tokio::test]
    async fn test_comparison_needs_two_candidates() {
        let h = harness(Arc::new(StubGenerator::ok("narrative")));
        h.pipeline.run(context("job-1", "resume-1")).await.unwrap();

        let err = comparison_report(h.store.as_ref(), "job-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::InsufficientCandidates {
                needed: 2,
                found: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_comparison_ignores_failed_records() {
        let h = harness(Arc::new(StubGenerator::ok("narrative")));
        h.pipeline.run(context("job-1", "resume-1")).await.unwrap();

        // A failed record for the same job must not count as a candidate.
        let failed = ReportRecord {
            id: uuid::Uuid::new_v4(),
            job_id: "job-1".to_string(),
            resume_id: "resume-2".to_string(),
            score_breakdown: json!({"overall_score": 50.0}),
            skills_analysis: json!([]),
            recommendation: "consider".to_string(),
            summary: String::new(),
            confidence: 0.5,
            processing_time_ms: 0,
            status: ReportStatus::Pending,
            error_message: None,
            generated_by: "system".to_string(),
            model_id: "stub-model".to_string(),
            detailed_report_location: None,
            generated_at: chrono::Utc::now(),
        };
        h.store.create(&failed).await.unwrap();
        h.store.mark_processing(failed.id).await.unwrap();
        h.store.fail(failed.id, "model refused", 10).await.unwrap();

        let err = comparison_report(h.store.as_ref(), "job-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::InsufficientCandidates { .. }));
    }

    #[tokio::test]
    async fn test_interview_guide_uses_skill_analysis() {
        let store = seeded_store().await;
        let guide = interview_guide(store.as_ref(), "job-1", "resume-1")
            .await
            .unwrap();
        assert!(guide.contains("# Interview Guide"));
        // The seeded score has one exact Rust match.
        assert!(guide.contains("Rust"));
    }

    #[tokio::test]
    async fn test_interview_guide_unknown_record() {
        let store = seeded_store().await;
        let err = interview_guide(store.as_ref(), "job-1", "resume-404")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::RecordNotFound(_)));
    }
}
