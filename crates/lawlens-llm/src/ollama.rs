use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lawlens_core::llm::{LlmBackend, LlmReply, LlmRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http;

/// Calls a locally-hosted Ollama model via its native chat API.
///
/// Keeps document text on the local machine. Only image media can be
/// attached, so scanned PDFs need one of the hosted backends.
pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
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
struct OllamaMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    model: Option<String>,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmReply> {
        if let Some(m) = request.media.iter().find(|m| !m.is_image()) {
            bail!("ollama backend cannot attach {} media", m.mime_type);
        }

        let request_body = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage {
                role: "user",
                content: request.prompt.clone(),
                images: request.media.iter().map(|m| m.data.clone()).collect(),
            }],
            stream: false,
            // `format: "json"` constrains the reply to an object.
            format: (!request.wants_array()).then_some("json"),
        };

        info!(
            flow = %request.flow,
            model = %self.model,
            base_url = %self.base_url,
            "calling ollama chat API"
        );

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let client = http::client(self.timeout_secs)?;
        let raw = http::send("ollama", client.post(&url).json(&request_body), self.timeout_secs).await?;

        let parsed: OllamaChatResponse = serde_json::from_str(&raw).context("failed to parse ollama response")?;
        let output = parsed.message.content;
        if output.trim().is_empty() {
            bail!("ollama returned an empty reply");
        }

        info!(flow = %request.flow, output_len = output.len(), "ollama response received");

        Ok(LlmReply {
            text: output,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}
