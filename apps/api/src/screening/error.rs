use thiserror::Error;

use crate::providers::ProviderError;
use crate::screening::models::ScreeningStatus;

/// One failed provider attempt inside a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ScreeningError {
    /// Every extraction provider failed. Non-fatal to the surrounding workflow:
    /// the resume simply stays textless.
    #[error("resume extraction failed: {}", describe_attempts(.attempts))]
    ExtractionFailed { attempts: Vec<ProviderAttempt> },

    #[error("provider transport error: {0}")]
    ProviderTransport(#[from] ProviderError),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ScreeningStatus,
        to: ScreeningStatus,
    },
}

fn describe_attempts(attempts: &[ProviderAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.message))
        .collect::<Vec<_>>()
        .join("; ")
}
