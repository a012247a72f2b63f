//! Event intake: validation, duplicate suppression, dispatch, publication.
//!
//! Flow per event: validate mandatory fields → acquire the dedup key (drop
//! the event with a warning if it is already active) → run the pipeline →
//! publish `ReportGenerated` on success or `ReportGenerationFailed` on
//! failure, re-raising the error so the bus's redelivery semantics apply.
//! The dedup key is released when the acquired handle drops, on every path.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::errors::ReportError;
use crate::events::bus::{EventPublisher, OutboundEvent};
use crate::events::dedup::{dedup_key, DedupGuard};
use crate::events::messages::{
    MatchScored, ReportGenerated, ReportGenerationFailed, ReportGenerationRequested,
};
use crate::pipeline::{GenerationContext, ReportPipeline};
use crate::storage::ReportStore;

pub struct EventIntake {
    guard: DedupGuard,
    pipeline: Arc<ReportPipeline>,
    store: Arc<dyn ReportStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl EventIntake {
    pub fn new(
        pipeline: Arc<ReportPipeline>,
        store: Arc<dyn ReportStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            guard: DedupGuard::new(),
            pipeline,
            store,
            publisher,
        }
    }

    /// Handles a `MatchScored` event.
    pub async fn on_match_scored(&self, event: MatchScored) -> Result<(), ReportError> {
        validate_match_scored(&event)?;

        let report_type = event.metadata.as_ref().and_then(|m| m.report_type);
        let key = dedup_key(&event.job_id, &event.resume_id, report_type);
        let Some(_active) = self.guard.try_acquire(&key) else {
            warn!("report for {key} already in flight; dropping duplicate event");
            return Ok(());
        };

        let ctx = GenerationContext::from_match_scored(&event);
        self.dispatch(ctx).await
    }

    /// Handles an explicit `ReportGenerationRequested` event. When a record
    /// already exists for the pair, its snapshot seeds the new run.
    pub async fn on_generation_requested(
        &self,
        event: ReportGenerationRequested,
    ) -> Result<(), ReportError> {
        validate_request(&event)?;

        let key = dedup_key(&event.job_id, &event.resume_id, Some(event.report_type));
        let Some(_active) = self.guard.try_acquire(&key) else {
            warn!("report for {key} already in flight; dropping duplicate request");
            return Ok(());
        };

        let existing = self.store.find(&event.job_id, &event.resume_id).await?;
        let ctx = GenerationContext::from_request(&event, existing.as_ref());
        self.dispatch(ctx).await
    }

    async fn dispatch(&self, ctx: GenerationContext) -> Result<(), ReportError> {
        let job_id = ctx.job_id.clone();
        let resume_id = ctx.resume_id.clone();
        let report_type = ctx.report_type;

        match self.pipeline.run(ctx).await {
            Ok(outcome) => {
                let generated = ReportGenerated {
                    job_id,
                    resume_id,
                    report_id: outcome.record_id,
                    report_type,
                    blob_location: outcome.blob_location,
                    timestamp: Utc::now(),
                    processing_time_ms: outcome.processing_time_ms,
                };
                // The report is durable at this point; a publication failure
                // must not trigger a duplicate run.
                if let Err(publish_err) = self
                    .publisher
                    .publish(OutboundEvent::Generated(generated))
                    .await
                {
                    error!("could not publish completion event: {publish_err}");
                }
                Ok(())
            }
            Err(err) => {
                let failed = ReportGenerationFailed {
                    job_id,
                    resume_id,
                    report_type,
                    error: err.to_string(),
                    retry_count: 0,
                    timestamp: Utc::now(),
                };
                if let Err(publish_err) =
                    self.publisher.publish(OutboundEvent::Failed(failed)).await
                {
                    error!("could not publish failure event: {publish_err}");
                }
                Err(err)
            }
        }
    }

    pub fn active_keys(&self) -> usize {
        self.guard.active_count()
    }
}

fn validate_match_scored(event: &MatchScored) -> Result<(), ReportError> {
    let mut missing = Vec::new();
    if event.job_id.trim().is_empty() {
        missing.push("job_id".to_string());
    }
    if event.resume_id.trim().is_empty() {
        missing.push("resume_id".to_string());
    }
    if event.score.is_none() {
        missing.push("score".to_string());
    }
    reject_if_missing(missing)
}

fn validate_request(event: &ReportGenerationRequested) -> Result<(), ReportError> {
    let mut missing = Vec::new();
    if event.job_id.trim().is_empty() {
        missing.push("job_id".to_string());
    }
    if event.resume_id.trim().is_empty() {
        missing.push("resume_id".to_string());
    }
    reject_if_missing(missing)
}

fn reject_if_missing(missing: Vec<String>) -> Result<(), ReportError> {
    if missing.is_empty() {
        return Ok(());
    }
    let correlation_id = Uuid::new_v4();
    warn!(
        "rejecting event [{correlation_id}]: missing {}",
        missing.join(", ")
    );
    Err(ReportError::InvalidEvent {
        missing,
        correlation_id,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
