use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Advisory per-report generation budget, checked between pipeline stages.
    pub generation_budget_secs: u64,
    /// In-flight ceiling for batch generation.
    pub batch_concurrency: usize,
    /// Days of span/quality history kept by the monitoring engine.
    pub retention_days: i64,
    pub consumer_group: String,
    pub consumer_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            generation_budget_secs: parse_env("GENERATION_BUDGET_SECS", 30)?,
            batch_concurrency: parse_env("BATCH_CONCURRENCY", 3)?,
            retention_days: parse_env("METRICS_RETENTION_DAYS", 30)?,
            consumer_group: std::env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| "report-workers".to_string()),
            consumer_name: std::env::var("CONSUMER_NAME")
                .unwrap_or_else(|_| format!("worker-{}", std::process::id())),
        })
    }

    pub fn generation_budget_ms(&self) -> i64 {
        (self.generation_budget_secs * 1000) as i64
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}
