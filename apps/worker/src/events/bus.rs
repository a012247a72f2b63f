#![allow(dead_code)]

//! Event bus adapter.
//!
//! Transport is Redis streams with consumer groups: at-least-once delivery,
//! entries acked only after the handler returns. The adapter stays thin —
//! payloads are JSON under a single `payload` field, one stream per event
//! kind.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::ReportError;
use crate::events::intake::EventIntake;
use crate::events::messages::{
    MatchScored, ReportGenerated, ReportGenerationFailed, ReportGenerationRequested,
};

/// Stream carrying `MatchScored` events.
pub const MATCH_SCORED_STREAM: &str = "events:match-scored";
/// Stream carrying `ReportGenerationRequested` events.
pub const GENERATION_REQUESTED_STREAM: &str = "events:report-generation-requested";
/// Stream for `ReportGenerated` publications.
pub const REPORT_GENERATED_STREAM: &str = "events:report-generated";
/// Stream for `ReportGenerationFailed` publications.
pub const REPORT_FAILED_STREAM: &str = "events:report-generation-failed";

/// An event the worker publishes downstream.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    Generated(ReportGenerated),
    Failed(ReportGenerationFailed),
}

impl OutboundEvent {
    pub fn stream(&self) -> &'static str {
        match self {
            OutboundEvent::Generated(_) => REPORT_GENERATED_STREAM,
            OutboundEvent::Failed(_) => REPORT_FAILED_STREAM,
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: OutboundEvent) -> Result<(), ReportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisEventBus {
    client: redis::Client,
}

impl RedisEventBus {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventPublisher for RedisEventBus {
    async fn publish(&self, event: OutboundEvent) -> Result<(), ReportError> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| ReportError::Internal(anyhow::anyhow!("event serialization: {e}")))?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ReportError::Internal(anyhow::anyhow!("redis connection: {e}")))?;
        let _id: String = redis::cmd("XADD")
            .arg(event.stream())
            .arg("*")
            .arg("payload")
            .arg(&payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| ReportError::Internal(anyhow::anyhow!("event publish: {e}")))?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Consumer loop
// ────────────────────────────────────────────────────────────────────────────

/// Runs the consumer loop: reads both inbound streams through a consumer
/// group and feeds entries to intake. Entries are acked only when the
/// handler returns success or a non-retryable error; retryable failures stay
/// pending for redelivery.
pub async fn run_consumer(
    client: redis::Client,
    group: String,
    consumer: String,
    intake: std::sync::Arc<EventIntake>,
) {
    let mut conn = loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => break conn,
            Err(e) => {
                error!("redis connection for consumer failed: {e}; retrying in 5s");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    };

    for stream in [MATCH_SCORED_STREAM, GENERATION_REQUESTED_STREAM] {
        // BUSYGROUP means the group already exists; anything else is fatal
        // enough to log and carry on (reads will fail loudly below).
        let created: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream)
            .arg(&group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        if let Err(e) = created {
            if !e.to_string().contains("BUSYGROUP") {
                warn!("creating consumer group on {stream}: {e}");
            }
        }
    }

    info!("event consumer {consumer} joined group {group}");

    loop {
        let reply: Result<redis::streams::StreamReadReply, _> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&group)
            .arg(&consumer)
            .arg("COUNT")
            .arg(10)
            .arg("BLOCK")
            .arg(5000)
            .arg("STREAMS")
            .arg(MATCH_SCORED_STREAM)
            .arg(GENERATION_REQUESTED_STREAM)
            .arg(">")
            .arg(">")
            .query_async(&mut conn)
            .await;

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                error!("stream read failed: {e}; retrying in 5s");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                continue;
            }
        };

        // Each entry runs in its own task: events are handled concurrently,
        // one pipeline instance per event, while the dedup guard suppresses
        // same-key overlap.
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                let intake = std::sync::Arc::clone(&intake);
                let mut conn = conn.clone();
                let stream = stream_key.key.clone();
                let group = group.clone();
                tokio::spawn(async move {
                    let Some(redis::Value::Data(raw)) = entry.map.get("payload") else {
                        warn!("entry {} on {stream} has no payload; acking", entry.id);
                        ack(&mut conn, &stream, &group, &entry.id).await;
                        return;
                    };

                    match dispatch(&stream, raw, &intake).await {
                        Ok(()) => ack(&mut conn, &stream, &group, &entry.id).await,
                        Err(err) if !err.is_retryable() => {
                            warn!("dropping entry {}: {err}", entry.id);
                            ack(&mut conn, &stream, &group, &entry.id).await;
                        }
                        Err(err) => {
                            // Leave unacked: the group redelivers it later.
                            error!("entry {} failed, leaving for redelivery: {err}", entry.id);
                        }
                    }
                });
            }
        }
    }
}

async fn dispatch(
    stream: &str,
    raw: &[u8],
    intake: &EventIntake,
) -> Result<(), ReportError> {
    match stream {
        MATCH_SCORED_STREAM => {
            let event: MatchScored = serde_json::from_slice(raw).map_err(|e| {
                ReportError::InvalidEvent {
                    missing: vec![format!("unparseable payload: {e}")],
                    correlation_id: uuid::Uuid::new_v4(),
                }
            })?;
            intake.on_match_scored(event).await
        }
        GENERATION_REQUESTED_STREAM => {
            let event: ReportGenerationRequested =
                serde_json::from_slice(raw).map_err(|e| ReportError::InvalidEvent {
                    missing: vec![format!("unparseable payload: {e}")],
                    correlation_id: uuid::Uuid::new_v4(),
                })?;
            intake.on_generation_requested(event).await
        }
        other => {
            warn!("entry from unexpected stream {other}");
            Ok(())
        }
    }
}

async fn ack(
    conn: &mut redis::aio::MultiplexedConnection,
    stream: &str,
    group: &str,
    id: &str,
) {
    let result: Result<i64, _> = redis::cmd("XACK")
        .arg(stream)
        .arg(group)
        .arg(id)
        .query_async(conn)
        .await;
    if let Err(e) = result {
        error!("failed to ack {id} on {stream}: {e}");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory implementation (tests)
// ────────────────────────────────────────────────────────────────────────────

/// Captures published events for assertions.
#[derive(Default)]
pub struct MemoryEventBus {
    published: Mutex<Vec<OutboundEvent>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generated(&self) -> Vec<ReportGenerated> {
        self.published
            .lock()
            .expect("bus lock poisoned")
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::Generated(g) => Some(g.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<ReportGenerationFailed> {
        self.published
            .lock()
            .expect("bus lock poisoned")
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::Failed(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventBus {
    async fn publish(&self, event: OutboundEvent) -> Result<(), ReportError> {
        self.published
            .lock()
            .expect("bus lock poisoned")
            .push(event);
        Ok(())
    }
}
