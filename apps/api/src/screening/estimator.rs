//! Fit-score estimation: one structured prompt, one bare-integer reply, 0–100.
//!
//! Parsing never fails the pipeline: the first run of ASCII digits in the reply
//! is the score, clamped to [0, 100]; a reply without digits becomes
//! `ScoreOutcome::RecoveredWithDefault` with score 50. Only transport failures
//! (after the fallback provider) surface as errors.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::providers::{with_timeout, ProviderError, ScoringProvider};
use crate::screening::error::ScreeningError;
use crate::screening::models::{CandidateRecord, JobSpec};
use crate::screening::prompts::build_fit_prompt;

pub const DEFAULT_SCORE: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// The provider's reply contained a number (possibly clamped).
    Parsed { score: u8 },
    /// The reply had no digits; the default score was substituted.
    RecoveredWithDefault { score: u8 },
}

impl ScoreOutcome {
    pub fn score(&self) -> u8 {
        match *self {
            Self::Parsed { score } | Self::RecoveredWithDefault { score } => score,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::RecoveredWithDefault { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FitEstimate {
    pub provider: String,
    pub outcome: ScoreOutcome,
}

/// Per-candidate result of a bulk scoring pass; one failure never aborts the rest.
#[derive(Debug)]
pub struct CandidateEstimate {
    pub candidate_id: Uuid,
    pub result: Result<FitEstimate, ScreeningError>,
}

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"))
}

/// Extracts the first digit run and clamps it. Oversized runs saturate to 100.
pub fn parse_score(raw: &str) -> ScoreOutcome {
    match digits_pattern().find(raw) {
        Some(m) => {
            let value = m.as_str().parse::<u64>().unwrap_or(u64::MAX);
            ScoreOutcome::Parsed {
                score: value.min(100) as u8,
            }
        }
        None => ScoreOutcome::RecoveredWithDefault {
            score: DEFAULT_SCORE,
        },
    }
}

pub struct FitScoreEstimator {
    providers: Vec<Arc<dyn ScoringProvider>>,
    timeout: Duration,
}

impl FitScoreEstimator {
    pub fn new(
        primary: Arc<dyn ScoringProvider>,
        fallback: Option<Arc<dyn ScoringProvider>>,
        timeout: Duration,
    ) -> Self {
        let mut providers = vec![primary];
        providers.extend(fallback);
        Self { providers, timeout }
    }

    pub async fn estimate(
        &self,
        job: &JobSpec,
        resume_text: Option<&str>,
    ) -> Result<FitEstimate, ScreeningError> {
        let prompt = build_fit_prompt(job, resume_text);
        let mut last_error: Option<ProviderError> = None;

        for provider in &self.providers {
            match with_timeout(self.timeout, provider.complete(&prompt)).await {
                Ok(raw) => {
                    let outcome = parse_score(&raw);
                    if outcome.is_recovered() {
                        warn!(
                            provider = provider.name(),
                            job = %job.id,
                            "no score in provider reply {raw:?}; using default {DEFAULT_SCORE}"
                        );
                    }
                    return Ok(FitEstimate {
                        provider: provider.name().to_string(),
                        outcome,
                    });
                }
                Err(e) => {
                    warn!(provider = provider.name(), job = %job.id, "fit-score call failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(ScreeningError::ProviderTransport)
            .unwrap_or_else(|| {
                ScreeningError::ProviderTransport(ProviderError::Decode(
                    "no scoring provider configured".to_string(),
                ))
            }))
    }

    /// Scores every candidate against the same job, isolating failures per candidate.
    pub async fn estimate_all(
        &self,
        job: &JobSpec,
        candidates: &[CandidateRecord],
    ) -> Vec<CandidateEstimate> {
        let mut estimates = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let result = self.estimate(job, candidate.resume_text.as_deref()).await;
            estimates.push(CandidateEstimate {
                candidate_id: candidate.id,
                result,
            });
        }

        let failed = estimates.iter().filter(|e| e.result.is_err()).count();
        info!(
            job = %job.id,
            scored = estimates.len() - failed,
            failed,
            "bulk fit scoring finished"
        );
        estimates
    }
}
