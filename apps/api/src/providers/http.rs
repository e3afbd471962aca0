//! Remote JSON providers. Each endpoint speaks the request/response shapes in
//! `crate::providers`; non-2xx replies become `ProviderError::Status`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::providers::{
    CandidateProjection, ClassificationJudgment, ClassificationProvider, ClassificationRequest,
    ClassificationResponse, ExtractionProvider, ExtractionRequest, ExtractionResponse,
    ProviderError, ScoringProvider, ScoringRequest, ScoringResponse,
};

/// A single named HTTP endpoint. The same type backs every provider role;
/// which trait it is used through decides the payload shape.
#[derive(Clone)]
pub struct HttpProvider {
    name: String,
    url: String,
    client: Client,
}

impl HttpProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }

    async fn post_json<B, T>(&self, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(&self.url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        debug!(provider = %self.name, bytes = text.len(), "provider replied");
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ExtractionProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ProviderError> {
        self.post_json(request).await
    }
}

#[async_trait]
impl ScoringProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let response: ScoringResponse = self.post_json(&ScoringRequest { prompt }).await?;
        Ok(response.raw_text)
    }
}

#[async_trait]
impl ClassificationProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        candidates: &[CandidateProjection],
    ) -> Result<Vec<ClassificationJudgment>, ProviderError> {
        let response: ClassificationResponse =
            self.post_json(&ClassificationRequest { candidates }).await?;
        Ok(response.results)
    }
}
