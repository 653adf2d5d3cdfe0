use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lawlens_core::llm::{LlmBackend, LlmReply, LlmRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http;

/// Calls an OpenAI-compatible `chat/completions` endpoint. JSON mode is on
/// unless the flow expects an array, since `json_object` only yields objects.
/// Only image media can be attached; PDFs must be sent as text.
pub struct OpenAiBackend {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OpenAiBackend {
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
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmReply> {
        if let Some(m) = request.media.iter().find(|m| !m.is_image()) {
            bail!("openai backend cannot attach {} media", m.mime_type);
        }

        let mut content = vec![ContentPart::Text {
            text: request.prompt.clone(),
        }];
        content.extend(request.media.iter().map(|m| ContentPart::ImageUrl {
            image_url: ImageUrl { url: m.to_data_uri() },
        }));

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage { role: "user", content }],
            response_format: (!request.wants_array()).then_some(ResponseFormat { kind: "json_object" }),
        };

        info!(
            flow = %request.flow,
            model = %self.model,
            base_url = %self.base_url,
            "calling openai chat completions"
        );

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let client = http::client(self.timeout_secs)?;
        let call = client.post(&url).bearer_auth(&self.api_key).json(&body);
        let raw = http::send("openai", call, self.timeout_secs).await?;

        let parsed: ChatResponse = serde_json::from_str(&raw).context("failed to parse openai response")?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            bail!("openai returned an empty reply");
        }

        info!(flow = %request.flow, output_len = text.len(), "openai response received");

        Ok(LlmReply {
            text,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}
