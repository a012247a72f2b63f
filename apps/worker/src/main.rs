mod config;
mod db;
mod errors;
mod events;
mod llm_client;
mod models;
mod monitoring;
mod pipeline;
mod render;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use chrono::Utc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::events::bus::run_consumer;
use crate::events::{EventIntake, EventPublisher, RedisEventBus};
use crate::llm_client::LlmClient;
use crate::monitoring::PerformanceTracker;
use crate::pipeline::{ContentGenerator, LlmContentGenerator, ReportPipeline};
use crate::render::pdf::EncodedHtmlRenderer;
use crate::render::PageRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{BlobStore, PgReportStore, ReportStore, S3BlobStore};

/// Interval between monitoring retention sweeps.
const RETENTION_SWEEP_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dossier report worker v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;

    // Initialize Redis (event bus transport)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Collaborators behind their trait seams
    let store: Arc<dyn ReportStore> = Arc::new(PgReportStore::new(pool.clone()));
    let blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    let generator: Arc<dyn ContentGenerator> = Arc::new(LlmContentGenerator::new(llm));
    let renderer: Arc<dyn PageRenderer> = Arc::new(EncodedHtmlRenderer);
    let publisher: Arc<dyn EventPublisher> = Arc::new(RedisEventBus::new(redis.clone()));

    let tracker = Arc::new(PerformanceTracker::new(
        config.retention_days,
        config.generation_budget_ms(),
    ));

    let pipeline = Arc::new(ReportPipeline::new(
        store.clone(),
        blobs.clone(),
        generator,
        renderer,
        tracker.clone(),
        config.generation_budget_ms(),
    ));
    let intake = Arc::new(EventIntake::new(pipeline, store, publisher));

    // Event consumer loop
    tokio::spawn(run_consumer(
        redis,
        config.consumer_group.clone(),
        config.consumer_name.clone(),
        intake,
    ));

    // Hourly retention sweep over the monitoring history
    {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(RETENTION_SWEEP_SECS));
            loop {
                interval.tick().await;
                let evicted = tracker.sweep_expired(Utc::now());
                if evicted > 0 {
                    info!("retention sweep evicted {evicted} samples");
                }
            }
        });
    }

    // Health surface
    let state = AppState {
        tracker,
        config: config.clone(),
    };
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "dossier-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
