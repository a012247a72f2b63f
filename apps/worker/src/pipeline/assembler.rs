//! Report assembly orchestration.
//!
//! Flow per request: create record (pending) → mark processing → generate
//! narrative → produce artifact (gated for paginated output) → save blob →
//! persist summary and mark completed. Any stage error marks the record
//! failed with the error message and elapsed time, then propagates to the
//! caller — redelivery is the bus's decision, not the pipeline's.
//!
//! The generation budget is advisory: it is checked between stages, after
//! each stage completes, so a single slow external call can still overrun
//! it before being detected. No cancellation propagates into in-flight
//! collaborator calls.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::ReportError;
use crate::models::report::{ReportRecord, ReportStatus};
use crate::models::score::Decision;
use crate::monitoring::{OperationMetadata, PerformanceTracker};
use crate::pipeline::context::GenerationContext;
use crate::pipeline::generator::ContentGenerator;
use crate::pipeline::quality_gate::enforce_contract;
use crate::pipeline::summary::executive_summary;
use crate::render::html::{markdown_to_html, wrap_report_html};
use crate::render::{OutputFormat, PageRenderer};
use crate::storage::{BlobMetadata, BlobStore, CompletionPatch, ReportStore};

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub record_id: Uuid,
    pub blob_location: String,
    pub processing_time_ms: i64,
    pub artifact_size: usize,
}

struct Artifact {
    bytes: Vec<u8>,
    filename: &'static str,
    mime_type: &'static str,
    encoding: &'static str,
}

pub struct ReportPipeline {
    store: Arc<dyn ReportStore>,
    blobs: Arc<dyn BlobStore>,
    generator: Arc<dyn ContentGenerator>,
    renderer: Arc<dyn PageRenderer>,
    tracker: Arc<PerformanceTracker>,
    budget_ms: i64,
}

impl ReportPipeline {
    pub fn new(
        store: Arc<dyn ReportStore>,
        blobs: Arc<dyn BlobStore>,
        generator: Arc<dyn ContentGenerator>,
        renderer: Arc<dyn PageRenderer>,
        tracker: Arc<PerformanceTracker>,
        budget_ms: i64,
    ) -> Self {
        Self {
            store,
            blobs,
            generator,
            renderer,
            tracker,
            budget_ms,
        }
    }

    /// Runs the full assembly pipeline for one request.
    pub async fn run(&self, ctx: GenerationContext) -> Result<PipelineOutcome, ReportError> {
        let started = Instant::now();
        let op = self.tracker.start_operation(
            "generate_report",
            OperationMetadata {
                report_type: Some(ctx.report_type.as_str().to_string()),
                job_id: Some(ctx.job_id.clone()),
                resume_id: Some(ctx.resume_id.clone()),
                output_format: Some(ctx.output_format.as_str().to_string()),
                model_id: Some(self.generator.model_id().to_string()),
                confidence: ctx.score.as_ref().map(|s| s.analysis_confidence),
                file_size: None,
            },
        );

        let result = self.execute(&ctx, &started).await;
        match &result {
            Ok(outcome) => {
                info!(
                    "report {} for {}/{} completed in {}ms",
                    outcome.record_id, ctx.job_id, ctx.resume_id, outcome.processing_time_ms
                );
                self.tracker.end_operation(
                    op,
                    true,
                    None,
                    Some(OperationMetadata {
                        file_size: Some(outcome.artifact_size as u64),
                        ..Default::default()
                    }),
                );
            }
            Err(err) => {
                self.tracker
                    .end_operation(op, false, Some(err.to_string()), None);
            }
        }
        result
    }

    async fn execute(
        &self,
        ctx: &GenerationContext,
        started: &Instant,
    ) -> Result<PipelineOutcome, ReportError> {
        let record_id = Uuid::new_v4();
        let record = self.initial_record(ctx, record_id);
        self.store.create(&record).await?;
        // The record is activated and moved to processing in one breath; no
        // transition is skipped on any path below.
        self.store.mark_processing(record_id).await?;

        match self.run_stages(ctx, record_id, started).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let elapsed = elapsed_ms(started);
                if let Err(update_err) =
                    self.store.fail(record_id, &err.to_string(), elapsed).await
                {
                    error!("could not mark report {record_id} failed: {update_err}");
                }
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &GenerationContext,
        record_id: Uuid,
        started: &Instant,
    ) -> Result<PipelineOutcome, ReportError> {
        self.check_budget(started)?;
        let narrative = self.generator.generate(ctx).await?;

        self.check_budget(started)?;
        let artifact = self.produce_artifact(ctx, &narrative).await?;
        let metadata = BlobMetadata {
            report_type: ctx.report_type.as_str().to_string(),
            job_id: ctx.job_id.clone(),
            resume_id: ctx.resume_id.clone(),
            generated_by: ctx.requested_by.clone(),
            mime_type: artifact.mime_type.to_string(),
            encoding: artifact.encoding.to_string(),
        };
        let location = self
            .blobs
            .save(&artifact.bytes, artifact.filename, &metadata)
            .await?;

        self.check_budget(started)?;
        let summary = executive_summary(&narrative, ctx.score.as_ref());
        let processing_time_ms = elapsed_ms(started);
        self.store
            .complete(
                record_id,
                &CompletionPatch {
                    summary,
                    detailed_report_location: location.clone(),
                    processing_time_ms,
                },
            )
            .await?;

        Ok(PipelineOutcome {
            record_id,
            blob_location: location,
            processing_time_ms,
            artifact_size: artifact.bytes.len(),
        })
    }

    async fn produce_artifact(
        &self,
        ctx: &GenerationContext,
        narrative: &str,
    ) -> Result<Artifact, ReportError> {
        match ctx.output_format {
            OutputFormat::Markdown => Ok(Artifact {
                bytes: narrative.as_bytes().to_vec(),
                filename: "report.md",
                mime_type: "text/markdown",
                encoding: "utf-8",
            }),
            OutputFormat::Html => Ok(Artifact {
                bytes: self.render_html(ctx, narrative).into_bytes(),
                filename: "report.html",
                mime_type: "text/html",
                encoding: "utf-8",
            }),
            OutputFormat::Pdf => {
                let html = self.render_html(ctx, narrative);
                let rendered = self.renderer.render(&html).await?;
                enforce_contract(rendered.bytes.len(), rendered.page_count)?;
                Ok(Artifact {
                    bytes: rendered.bytes,
                    filename: "report.pdf",
                    mime_type: "application/pdf",
                    encoding: "base64",
                })
            }
            // Structured output bypasses the template path entirely.
            OutputFormat::Json => {
                let body = json!({
                    "variables": ctx.variables(),
                    "narrative": narrative,
                });
                let bytes = serde_json::to_vec_pretty(&body).map_err(|e| {
                    ReportError::Internal(anyhow::anyhow!("json artifact serialization: {e}"))
                })?;
                Ok(Artifact {
                    bytes,
                    filename: "report.json",
                    mime_type: "application/json",
                    encoding: "utf-8",
                })
            }
        }
    }

    fn render_html(&self, ctx: &GenerationContext, narrative: &str) -> String {
        let body = markdown_to_html(narrative);
        wrap_report_html(
            &format!("Candidate Match Report — {}", ctx.resume_id),
            &[
                ("Job", ctx.job_id.as_str()),
                ("Candidate", ctx.resume_id.as_str()),
                ("Report type", ctx.report_type.as_str()),
                ("Generated by", ctx.requested_by.as_str()),
            ],
            &body,
        )
    }

    fn initial_record(&self, ctx: &GenerationContext, record_id: Uuid) -> ReportRecord {
        let (score_breakdown, skills_analysis, recommendation, confidence) = match &ctx.score {
            Some(score) => (
                json!({
                    "overall_score": score.overall_score,
                    "skills_score": score.skills_score,
                    "experience_score": score.experience_score,
                    "education_score": score.education_score,
                    "skills_match": score.breakdown.skills_match,
                    "experience_match": score.breakdown.experience_match,
                    "education_match": score.breakdown.education_match,
                    "overall_fit": score.breakdown.overall_fit,
                }),
                json!(score.matching_skills),
                score.recommendations.decision,
                score.analysis_confidence,
            ),
            None => (json!({}), json!([]), Decision::Consider, 0.0),
        };

        ReportRecord {
            id: record_id,
            job_id: ctx.job_id.clone(),
            resume_id: ctx.resume_id.clone(),
            score_breakdown,
            skills_analysis,
            recommendation: recommendation.label().to_string(),
            summary: String::new(),
            confidence,
            processing_time_ms: 0,
            status: ReportStatus::Pending,
            error_message: None,
            generated_by: ctx.requested_by.clone(),
            model_id: self.generator.model_id().to_string(),
            detailed_report_location: None,
            generated_at: Utc::now(),
        }
    }

    fn check_budget(&self, started: &Instant) -> Result<(), ReportError> {
        let elapsed = elapsed_ms(started);
        if elapsed > self.budget_ms {
            return Err(ReportError::budget_exceeded(elapsed, self.budget_ms));
        }
        Ok(())
    }
}

fn elapsed_ms(started: &Instant) -> i64 {
    started.elapsed().as_millis() as i64
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
