//! External provider seams for extraction, fit scoring and batch classification.
//!
//! The screening core only ever talks to these traits. Concrete backends live in
//! `http` (remote JSON endpoints), `local` (in-process document reader) and
//! `crate::llm_client` (Anthropic).

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::LlmError;

pub mod http;
pub mod local;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed provider response: {0}")]
    Decode(String),

    #[error("document read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Runs a provider call under a deadline. An elapsed deadline is reported as
/// `ProviderError::Timeout` and handled exactly like a transport failure.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub file_reference: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Raw extraction provider reply. `success: false` is an explicit failure flag,
/// distinct from a transport error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionResponse {
    pub success: bool,
    pub parsed_file_path: Option<String>,
    pub text: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoringRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResponse {
    pub raw_text: String,
}

/// The narrow view of a candidate sent to the classification provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateProjection {
    pub id: String,
    pub name: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
    pub position: String,
    pub resume: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassificationRequest<'a> {
    pub candidates: &'a [CandidateProjection],
}

#[derive(Debug, Deserialize)]
pub struct ClassificationResponse {
    #[serde(default)]
    pub results: Vec<ClassificationJudgment>,
}

/// One provider judgment. Only these four fields are ever merged back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationJudgment {
    pub id: String,
    #[serde(default)]
    pub ai_summary: String,
    pub screening_score: f64,
    #[serde(default)]
    pub screening_notes: String,
    #[serde(default)]
    pub match_category: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Traits
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, request: &ExtractionRequest)
        -> Result<ExtractionResponse, ProviderError>;
}

/// Free-text completion. The caller does its own integer extraction.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(
        &self,
        candidates: &[CandidateProjection],
    ) -> Result<Vec<ClassificationJudgment>, ProviderError>;
}
