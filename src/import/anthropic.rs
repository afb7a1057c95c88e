use super::analyzer::{AnalysisResult, AnalyzerError, TaskAnalyzer};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 1024;
/// Cap on document text sent per request.
const MAX_DOCUMENT_CHARS: usize = 8000;

const SYSTEM_PROMPT: &str = "You extract actionable tasks from screenshots and documents. \
Return ONLY a JSON object, no explanation, shaped as \
{\"tasks\": [{\"text\": \"...\", \"description\": \"...\"}]}.\n\n\
Rules:\n\
- \"text\": concise imperative action (e.g. \"Fix login redirect\", \"Update API docs\")\n\
- \"description\": one or two sentences of context taken from the source\n\
- Return {\"tasks\": []} when nothing actionable is present";

/// Analyzer backed by the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicAnalyzer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl AnthropicAnalyzer {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send(&self, content: serde_json::Value) -> Result<AnalysisResult, AnalyzerError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AnalyzerError::MissingApiKey)?;

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": content }
            ]
        });

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api { status, body });
        }

        let api_resp: serde_json::Value = resp.json().await?;
        let text = response_text(&api_resp)?;
        parse_analysis(text)
    }
}

impl TaskAnalyzer for AnthropicAnalyzer {
    async fn analyze_image(&self, base64_image: &str) -> Result<AnalysisResult, AnalyzerError> {
        let content = serde_json::json!([
            {
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": sniff_media_type(base64_image),
                    "data": base64_image,
                }
            },
            { "type": "text", "text": "List the tasks this image implies." }
        ]);
        self.send(content).await
    }

    async fn analyze_document(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        let capped: String = text.chars().take(MAX_DOCUMENT_CHARS).collect();
        let content = format!("List the tasks this document implies.\n\n{}", capped);
        self.send(serde_json::Value::String(content)).await
    }
}

/// Guess the image type from the first bytes of its base64 encoding.
fn sniff_media_type(base64_image: &str) -> &'static str {
    if base64_image.starts_with("/9j/") {
        "image/jpeg"
    } else if base64_image.starts_with("R0lGOD") {
        "image/gif"
    } else if base64_image.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/png"
    }
}

/// Text of the first content block.
fn response_text(api_resp: &serde_json::Value) -> Result<&str, AnalyzerError> {
    api_resp["content"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|block| block["text"].as_str())
        .ok_or_else(|| AnalyzerError::Parse("No text in API response".to_string()))
}

/// Parse the model's answer, tolerating markdown code fences around the JSON.
fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalyzerError> {
    let trimmed = text.trim();
    let json_str = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let json_str = json_str.strip_suffix("```").unwrap_or(json_str).trim();

    serde_json::from_str::<AnalysisResult>(json_str)
        .map_err(|e| AnalyzerError::Parse(format!("{}, raw: {}", e, text)))
}
