//! In-process document reader. Resolves the file reference against a local
//! root directory and returns the text inline, so it never needs a parsed-file
//! path.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::providers::{ExtractionProvider, ExtractionRequest, ExtractionResponse, ProviderError};

pub struct LocalDocumentReader {
    root: PathBuf,
}

impl LocalDocumentReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins a relative reference onto the root. Absolute paths, drive
    /// prefixes and `..` segments are refused so reads stay under the root.
    fn resolve(&self, file_reference: &str) -> Option<PathBuf> {
        let reference = Path::new(file_reference);
        let confined = reference
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (confined && reference.components().next().is_some()).then(|| self.root.join(reference))
    }
}

#[async_trait]
impl ExtractionProvider for LocalDocumentReader {
    fn name(&self) -> &str {
        "local"
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ProviderError> {
        let Some(path) = self.resolve(&request.file_reference) else {
            warn!(file = %request.file_reference, "file reference outside resume root refused");
            return Ok(failure(format!(
                "file reference '{}' is outside the resume root",
                request.file_reference
            )));
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let text = match extension.as_str() {
            "pdf" => {
                let bytes = tokio::fs::read(&path).await?;
                let parsed = tokio::task::spawn_blocking(move || {
                    pdf_extract::extract_text_from_mem(&bytes)
                })
                .await
                .map_err(|e| ProviderError::Decode(format!("PDF worker failed: {e}")))?;
                match parsed {
                    Ok(text) => text,
                    Err(e) => return Ok(failure(format!("unreadable PDF: {e}"))),
                }
            }
            "txt" | "md" | "markdown" | "text" => tokio::fs::read_to_string(&path).await?,
            other => return Ok(failure(format!("unsupported document type '{other}'"))),
        };

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Ok(failure("document contains no extractable text".to_string()));
        }

        debug!(path = %path.display(), chars = text.len(), "local extraction succeeded");
        Ok(ExtractionResponse {
            success: true,
            parsed_file_path: None,
            text: Some(text),
            error: None,
        })
    }
}

fn failure(message: String) -> ExtractionResponse {
    ExtractionResponse {
        success: false,
        error: Some(message),
        ..Default::default()
    }
}

/// Trims every line and drops blank runs left behind by PDF layout.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
