use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::InformeError;

/// Something that turns a prompt into report text.
pub trait ReportGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, InformeError>;

    /// Name of the backend, for logs.
    fn backend_name(&self) -> &str;
}

/// Blocking client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, InformeError> {
        if config.api_key.trim().is_empty() {
            return Err(InformeError::UpstreamFailure(format!(
                "missing API key; set {}",
                crate::config::API_KEY_ENV
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InformeError::UpstreamFailure(format!("HTTP client setup: {e}")))?;
        Ok(Self {
            client,
            url: config.generate_url(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl ReportGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, InformeError> {
        info!(model = %self.model, prompt_chars = prompt.len(), "requesting report");

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest::new(prompt))
            .send()
            .map_err(|e| InformeError::UpstreamFailure(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| InformeError::UpstreamFailure(format!("reading response: {}", e.without_url())))?;
        if !status.is_success() {
            return Err(InformeError::UpstreamFailure(format!(
                "HTTP {status}: {}",
                error_message(&body)
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| InformeError::UpstreamFailure(format!("unexpected response: {e}")))?;
        let text = parsed.text()?;
        debug!(response_chars = text.len(), "received report");
        Ok(text)
    }

    fn backend_name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Result<String, InformeError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(InformeError::UpstreamFailure(format!("prompt blocked: {reason}")));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| InformeError::UpstreamFailure("response has no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(InformeError::UpstreamFailure(format!(
                "response has no text (finish reason: {reason})"
            )));
        }
        Ok(text)
    }
}

/// Pull `error.message` out of an error body, or fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
