use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lawlens_core::llm::{LlmBackend, LlmReply, LlmRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http;

/// Calls Google's Gemini `generateContent` REST endpoint.
///
/// The prompt is sent as a single user turn with JSON output requested;
/// attached media (PDF scans, images) travel as `inlineData` parts.
pub struct GeminiBackend {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl GeminiBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: 300,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmReply> {
        let mut parts = vec![Part::Text(request.prompt.clone())];
        parts.extend(request.media.iter().map(|m| {
            Part::InlineData(InlineData {
                mime_type: m.mime_type.clone(),
                data: m.data.clone(),
            })
        }));

        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        info!(
            flow = %request.flow,
            model = %self.model,
            media = request.media.len(),
            "calling gemini generateContent"
        );

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let client = http::client(self.timeout_secs)?;
        let call = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let raw = http::send("gemini", call, self.timeout_secs).await?;

        let parsed: GenerateResponse =
            serde_json::from_str(&raw).context("failed to parse gemini response")?;
        let Some(candidate) = parsed.candidates.into_iter().next() else {
            bail!("gemini returned no candidates");
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            bail!(
                "gemini returned an empty reply (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
        }

        info!(flow = %request.flow, output_len = text.len(), "gemini response received");

        Ok(LlmReply {
            text,
            model: self.model.clone(),
        })
    }
}
