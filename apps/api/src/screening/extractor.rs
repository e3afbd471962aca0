//! Document text extraction over an ordered chain of capability-equivalent
//! providers. The first provider that succeeds wins; transport errors,
//! timeouts and explicit `success: false` replies all move on to the next one.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::providers::{with_timeout, ExtractionProvider, ExtractionRequest, ExtractionResponse};
use crate::screening::error::{ProviderAttempt, ScreeningError};

/// Result of a successful extraction. Persisting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedDocument {
    pub provider: String,
    pub text: Option<String>,
    pub parsed_file_path: Option<String>,
}

pub struct DocumentExtractor {
    providers: Vec<Arc<dyn ExtractionProvider>>,
    timeout: Duration,
}

impl DocumentExtractor {
    /// The chain is tried in the given order: primary first, then secondary.
    pub fn new(providers: Vec<Arc<dyn ExtractionProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractedDocument, ScreeningError> {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let outcome = with_timeout(self.timeout, provider.extract(request)).await;
            let message = match outcome {
                Ok(ExtractionResponse {
                    success: true,
                    text,
                    parsed_file_path,
                    ..
                }) => {
                    info!(
                        provider = provider.name(),
                        file = %request.file_reference,
                        "resume text extracted"
                    );
                    return Ok(ExtractedDocument {
                        provider: provider.name().to_string(),
                        text,
                        parsed_file_path,
                    });
                }
                Ok(response) => response
                    .error
                    .unwrap_or_else(|| "provider reported failure".to_string()),
                Err(e) => e.to_string(),
            };

            warn!(
                provider = provider.name(),
                file = %request.file_reference,
                "extraction attempt failed: {message}"
            );
            attempts.push(ProviderAttempt {
                provider: provider.name().to_string(),
                message,
            });
        }

        Err(ScreeningError::ExtractionFailed { attempts })
    }
}
