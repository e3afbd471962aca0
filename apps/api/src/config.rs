use std::time::Duration;

use anyhow::{Context, Result};

use crate::screening::orchestrator::DEFAULT_BATCH_SIZE;

/// Service configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub extraction_primary_url: String,
    /// Unset means the in-process document reader is the secondary extractor.
    pub extraction_secondary_url: Option<String>,
    /// Directory the in-process reader resolves file references against.
    pub resume_root: String,
    pub scoring_fallback_url: Option<String>,
    /// Unset means batches are classified by the LLM client.
    pub classifier_url: Option<String>,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub provider_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let batch_size = parse_env("SCREENING_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            anyhow::bail!("SCREENING_BATCH_SIZE must be at least 1");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            extraction_primary_url: require_env("EXTRACTION_PRIMARY_URL")?,
            extraction_secondary_url: optional_env("EXTRACTION_SECONDARY_URL"),
            resume_root: optional_env("RESUME_ROOT").unwrap_or_else(|| "./uploads".to_string()),
            scoring_fallback_url: optional_env("SCORING_FALLBACK_URL"),
            classifier_url: optional_env("CLASSIFIER_URL"),
            batch_size,
            batch_delay: Duration::from_millis(parse_env("SCREENING_BATCH_DELAY_MS", 1000)?),
            provider_timeout: Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", 60)?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
