use std::future::Future;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ImportItem;
use crate::core::task::SourceType;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("API key is missing, set one in the config first")]
    MissingApiKey,

    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse analysis: {0}")]
    Parse(String),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedTask {
    pub text: String,
    #[serde(default)]
    pub description: String,
}

/// What an analyzer extracted from an image or document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub tasks: Vec<AnalyzedTask>,
}

impl AnalysisResult {
    /// Import items that all carry the same preview payload.
    pub fn into_items(self, source_data: Option<String>) -> Vec<ImportItem> {
        self.tasks
            .into_iter()
            .map(|task| ImportItem {
                text: task.text,
                description: Some(task.description),
                source_data: source_data.clone(),
            })
            .collect()
    }
}

/// Turns images and documents into task suggestions.
pub trait TaskAnalyzer {
    /// `base64_image` is the raw base64 payload without a data URL prefix.
    fn analyze_image(
        &self,
        base64_image: &str,
    ) -> impl Future<Output = Result<AnalysisResult, AnalyzerError>> + Send;

    fn analyze_document(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<AnalysisResult, AnalyzerError>> + Send;
}

/// Offline analyzer returning canned suggestions, for demos and tests.
#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    api_key: Option<String>,
    delay: Duration,
}

impl MockAnalyzer {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            delay: Duration::from_secs(2),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn respond(&self, kind: &str, len: usize, tasks: [(&str, &str); 2]) -> Result<AnalysisResult, AnalyzerError> {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(AnalyzerError::MissingApiKey);
        }
        log::debug!("Mock-analyzing {} ({} bytes)", kind, len);
        tokio::time::sleep(self.delay).await;
        Ok(AnalysisResult {
            tasks: tasks
                .iter()
                .map(|(text, description)| AnalyzedTask {
                    text: text.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        })
    }
}

impl TaskAnalyzer for MockAnalyzer {
    async fn analyze_image(&self, base64_image: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.respond(
            "image",
            base64_image.len(),
            [
                (
                    "Refactor Authentication Logic",
                    "The screenshot shows legacy auth handling. Move it to the provider pattern.",
                ),
                (
                    "Fix Type Error in UserProfile",
                    "Line 42 has a potential null reference. Add an explicit check.",
                ),
            ],
        )
        .await
    }

    async fn analyze_document(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.respond(
            "document",
            text.len(),
            [
                (
                    "Review System Architecture",
                    "The document asks for a scalability review of the architecture.",
                ),
                (
                    "Update API Documentation",
                    "New endpoints mentioned in the document are not documented yet.",
                ),
            ],
        )
        .await
    }
}

fn image_mime(extension: &str) -> Option<&'static str> {
    match extension {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Analyze a file picked by the user and shape the result for `TodoStore::add_todos`.
///
/// Images keep their full data URL as preview payload; documents keep their
/// file name.
pub async fn analyze_file<A: TaskAnalyzer>(
    analyzer: &A,
    path: &Path,
) -> Result<(Vec<ImportItem>, SourceType), AnalyzerError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let bytes = tokio::fs::read(path).await.map_err(|source| AnalyzerError::Read {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(mime) = image_mime(&extension) {
        let encoded = STANDARD.encode(&bytes);
        let data_url = format!("data:{};base64,{}", mime, encoded);
        let result = analyzer.analyze_image(&encoded).await?;
        return Ok((result.into_items(Some(data_url)), SourceType::Image));
    }

    if extension == "pdf" {
        // No PDF text extraction here; the analyzer gets whatever text is readable.
        let text = String::from_utf8_lossy(&bytes);
        let result = analyzer.analyze_document(&text).await?;
        return Ok((result.into_items(Some(file_name)), SourceType::Pdf));
    }

    Err(AnalyzerError::Unsupported(file_name))
}
