#![allow(dead_code)]

//! Report record store.
//!
//! One row per `(job_id, resume_id)`; a new run for the same pair resets the
//! row rather than inserting a duplicate. Completion and failure updates are
//! guarded on `status = 'processing'` so terminal states are never re-entered
//! by the same run.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ReportError;
use crate::models::report::{ReportRecord, ReportStatus};

/// Fields written when a pipeline run completes.
#[derive(Debug, Clone)]
pub struct CompletionPatch {
    pub summary: String,
    pub detailed_report_location: String,
    pub processing_time_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsFilter {
    pub job_id: Option<String>,
    pub status: Option<ReportStatus>,
}

/// Aggregates over stored report records.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportAnalytics {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub average_confidence: Option<f64>,
    pub average_processing_time_ms: Option<f64>,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Inserts a fresh record, or resets the existing `(job_id, resume_id)`
    /// row for a new run.
    async fn create(&self, record: &ReportRecord) -> Result<(), ReportError>;

    /// pending → processing.
    async fn mark_processing(&self, id: Uuid) -> Result<(), ReportError>;

    /// processing → completed, with summary, blob location and elapsed time.
    async fn complete(&self, id: Uuid, patch: &CompletionPatch) -> Result<(), ReportError>;

    /// processing → failed, with the error message and elapsed time.
    async fn fail(
        &self,
        id: Uuid,
        error_message: &str,
        processing_time_ms: i64,
    ) -> Result<(), ReportError>;

    async fn find(&self, job_id: &str, resume_id: &str)
        -> Result<Option<ReportRecord>, ReportError>;

    async fn list_for_job(&self, job_id: &str) -> Result<Vec<ReportRecord>, ReportError>;

    async fn analytics(&self, filter: &AnalyticsFilter) -> Result<ReportAnalytics, ReportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn create(&self, record: &ReportRecord) -> Result<(), ReportError> {
        sqlx::query(
            r#"
            INSERT INTO reports
                (id, job_id, resume_id, score_breakdown, skills_analysis,
                 recommendation, summary, confidence, processing_time_ms,
                 status, error_message, generated_by, model_id,
                 detailed_report_location, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (job_id, resume_id) DO UPDATE SET
                id = EXCLUDED.id,
                score_breakdown = EXCLUDED.score_breakdown,
                skills_analysis = EXCLUDED.skills_analysis,
                recommendation = EXCLUDED.recommendation,
                summary = EXCLUDED.summary,
                confidence = EXCLUDED.confidence,
                processing_time_ms = EXCLUDED.processing_time_ms,
                status = EXCLUDED.status,
                error_message = NULL,
                generated_by = EXCLUDED.generated_by,
                model_id = EXCLUDED.model_id,
                detailed_report_location = NULL,
                generated_at = EXCLUDED.generated_at
            "#,
        )
        .bind(record.id)
        .bind(&record.job_id)
        .bind(&record.resume_id)
        .bind(&record.score_breakdown)
        .bind(&record.skills_analysis)
        .bind(&record.recommendation)
        .bind(&record.summary)
        .bind(record.confidence)
        .bind(record.processing_time_ms)
        .bind(record.status)
        .bind(&record.error_message)
        .bind(&record.generated_by)
        .bind(&record.model_id)
        .bind(&record.detailed_report_location)
        .bind(record.generated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_processing(&self, id: Uuid) -> Result<(), ReportError> {
        let result = sqlx::query(
            "UPDATE reports SET status = 'processing' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ReportError::Storage(format!(
                "report {id} is not pending; refusing transition to processing"
            )));
        }
        Ok(())
    }

    async fn complete(&self, id: Uuid, patch: &CompletionPatch) -> Result<(), ReportError> {
        let result = sqlx::query(
            r#"
            UPDATE reports
            SET status = 'completed',
                summary = $2,
                detailed_report_location = $3,
                processing_time_ms = $4
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(&patch.summary)
        .bind(&patch.detailed_report_location)
        .bind(patch.processing_time_ms)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ReportError::Storage(format!(
                "report {id} is not processing; refusing transition to completed"
            )));
        }
        Ok(())
    }

    async fn fail(
        &self,
        id: Uuid,
        error_message: &str,
        processing_time_ms: i64,
    ) -> Result<(), ReportError> {
        let result = sqlx::query(
            r#"
            UPDATE reports
            SET status = 'failed', error_message = $2, processing_time_ms = $3
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(error_message)
        .bind(processing_time_ms)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ReportError::Storage(format!(
                "report {id} is not processing; refusing transition to failed"
            )));
        }
        Ok(())
    }

    async fn find(
        &self,
        job_id: &str,
        resume_id: &str,
    ) -> Result<Option<ReportRecord>, ReportError> {
        Ok(sqlx::query_as::<_, ReportRecord>(
            "SELECT * FROM reports WHERE job_id = $1 AND resume_id = $2",
        )
        .bind(job_id)
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_for_job(&self, job_id: &str) -> Result<Vec<ReportRecord>, ReportError> {
        Ok(sqlx::query_as::<_, ReportRecord>(
            "SELECT * FROM reports WHERE job_id = $1 ORDER BY generated_at ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn analytics(&self, filter: &AnalyticsFilter) -> Result<ReportAnalytics, ReportError> {
        let row: (i64, i64, i64, Option<f64>, Option<f64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'completed'),
                   COUNT(*) FILTER (WHERE status = 'failed'),
                   (AVG(confidence) FILTER (WHERE status = 'completed'))::float8,
                   (AVG(processing_time_ms) FILTER (WHERE status = 'completed'))::float8
            FROM reports
            WHERE ($1::text IS NULL OR job_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(&filter.job_id)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(ReportAnalytics {
            total: row.0,
            completed: row.1,
            failed: row.2,
            average_confidence: row.3,
            average_processing_time_ms: row.4,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory implementation (tests)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryReportStore {
    records: Mutex<HashMap<Uuid, ReportRecord>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_with(
        &self,
        id: Uuid,
        next: ReportStatus,
        apply: impl FnOnce(&mut ReportRecord),
    ) -> Result<(), ReportError> {
        let mut records = self.records.lock().expect("report lock poisoned");
        let record = records
            .get_mut(&id)
            .ok_or_else(|| ReportError::Storage(format!("report not found: {id}")))?;
        if !record.status.can_transition_to(next) {
            return Err(ReportError::Storage(format!(
                "report {id} cannot move {:?} → {next:?}",
                record.status
            )));
        }
        record.status = next;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn create(&self, record: &ReportRecord) -> Result<(), ReportError> {
        let mut records = self.records.lock().expect("report lock poisoned");
        // One row per (job_id, resume_id): a new run replaces the old record.
        records.retain(|_, r| !(r.job_id == record.job_id && r.resume_id == record.resume_id));
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn mark_processing(&self, id: Uuid) -> Result<(), ReportError> {
        self.update_with(id, ReportStatus::Processing, |_| {})
    }

    async fn complete(&self, id: Uuid, patch: &CompletionPatch) -> Result<(), ReportError> {
        self.update_with(id, ReportStatus::Completed, |record| {
            record.summary = patch.summary.clone();
            record.detailed_report_location = Some(patch.detailed_report_location.clone());
            record.processing_time_ms = patch.processing_time_ms;
        })
    }

    async fn fail(
        &self,
        id: Uuid,
        error_message: &str,
        processing_time_ms: i64,
    ) -> Result<(), ReportError> {
        self.update_with(id, ReportStatus::Failed, |record| {
            record.error_message = Some(error_message.to_string());
            record.processing_time_ms = processing_time_ms;
        })
    }

    async fn find(
        &self,
        job_id: &str,
        resume_id: &str,
    ) -> Result<Option<ReportRecord>, ReportError> {
        let records = self.records.lock().expect("report lock poisoned");
        Ok(records
            .values()
            .find(|r| r.job_id == job_id && r.resume_id == resume_id)
            .cloned())
    }

    async fn list_for_job(&self, job_id: &str) -> Result<Vec<ReportRecord>, ReportError> {
        let records = self.records.lock().expect("report lock poisoned");
        let mut rows: Vec<ReportRecord> = records
            .values()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.generated_at);
        Ok(rows)
    }

    async fn analytics(&self, filter: &AnalyticsFilter) -> Result<ReportAnalytics, ReportError> {
        let records = self.records.lock().expect("report lock poisoned");
        let rows: Vec<&ReportRecord> = records
            .values()
            .filter(|r| filter.job_id.as_deref().is_none_or(|j| r.job_id == j))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .collect();
        let completed: Vec<&&ReportRecord> = rows
            .iter()
            .filter(|r| r.status == ReportStatus::Completed)
            .collect();
        let average = |f: fn(&ReportRecord) -> f64| -> Option<f64> {
            if completed.is_empty() {
                None
            } else {
                Some(completed.iter().map(|r| f(r)).sum::<f64>() / completed.len() as f64)
            }
        };
        Ok(ReportAnalytics {
            total: rows.len() as i64,
            completed: completed.len() as i64,
            failed: rows
                .iter()
                .filter(|r| r.status == ReportStatus::Failed)
                .count() as i64,
            average_confidence: average(|r| r.confidence),
            average_processing_time_ms: average(|r| r.processing_time_ms as f64),
        })
    }
}
