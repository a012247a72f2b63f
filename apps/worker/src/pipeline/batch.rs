//! Batch report generation with a bounded-concurrency ceiling.
#![allow(dead_code)]
//!
//! A batch dispatches every request, but at most `max_in_flight` pipeline
//! runs execute at once so the content generator is not flooded. A failing
//! item never aborts its siblings; every outcome is collected.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::errors::ReportError;
use crate::pipeline::assembler::{PipelineOutcome, ReportPipeline};
use crate::pipeline::context::GenerationContext;

/// Default number of in-flight generations per batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

#[derive(Debug)]
pub struct BatchOutcome {
    pub job_id: String,
    pub resume_id: String,
    pub result: Result<PipelineOutcome, ReportError>,
}

/// Runs every context through the pipeline with bounded concurrency and
/// returns all outcomes, successes and failures alike.
pub async fn run_batch(
    pipeline: Arc<ReportPipeline>,
    contexts: Vec<GenerationContext>,
    max_in_flight: usize,
) -> Vec<BatchOutcome> {
    let total = contexts.len();
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));

    let handles: Vec<_> = contexts
        .into_iter()
        .map(|ctx| {
            let pipeline = Arc::clone(&pipeline);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore closed");
                let job_id = ctx.job_id.clone();
                let resume_id = ctx.resume_id.clone();
                let result = pipeline.run(ctx).await;
                BatchOutcome {
                    job_id,
                    resume_id,
                    result,
                }
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(total);
    for joined in join_all(handles).await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!("batch task panicked: {e}"),
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "batch finished: {} requested, {} completed, {failed} failed",
        total,
        outcomes.len() - failed
    );
    outcomes
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::pipeline::assembler::test_support::{context, harness, StubGenerator};

    #[tokio::test]
    async fn test_batch_collects_every_outcome() {
        let generator = Arc::new(StubGenerator::ok("body"));
        let h = harness(generator.clone());
        let contexts = (0..5)
            .map(|i| context("job-1", &format!("resume-{i}")))
            .collect();

        let outcomes = run_batch(h.pipeline, contexts, DEFAULT_BATCH_CONCURRENCY).await;
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_concurrency_ceiling_respected() {
        let generator = Arc::new(StubGenerator::slow("body", 20));
        let h = harness(generator.clone());
        let contexts = (0..9)
            .map(|i| context("job-1", &format!("resume-{i}")))
            .collect();

        run_batch(h.pipeline, contexts, 3).await;
        assert!(
            generator.max_in_flight.load(Ordering::SeqCst) <= 3,
            "no more than 3 generations may be in flight"
        );
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_siblings() {
        // The generator fails every run; siblings still each get their own
        // completed dispatch and their own recorded failure.
        let generator = Arc::new(StubGenerator::failing("model refused"));
        let h = harness(generator.clone());
        let contexts = (0..4)
            .map(|i| context("job-1", &format!("resume-{i}")))
            .collect();

        let outcomes = run_batch(h.pipeline, contexts, 2).await;
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.result.is_err()));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_zero_ceiling_still_makes_progress() {
        let generator = Arc::new(StubGenerator::ok("body"));
        let h = harness(generator);
        let outcomes = run_batch(h.pipeline, vec![context("job-1", "resume-1")], 0).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());
    }
}
