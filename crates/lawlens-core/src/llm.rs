use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

/// Inline media attached to a prompt, decoded from a base64 data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub mime_type: String,
    /// Base64 payload, kept encoded since every provider wants it that way.
    pub data: String,
}

impl Media {
    /// Parse `data:<mimetype>;base64,<encoded_data>`.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.trim().strip_prefix("data:")?;
        let (mime_type, data) = rest.split_once(";base64,")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .ok()?;
        Some(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// One prompt sent to a provider on behalf of a flow.
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    /// Registry name of the flow issuing the call.
    pub flow: String,
    pub prompt: String,
    pub media: Vec<Media>,
    /// JSON Schema the reply is expected to satisfy.
    pub output_schema: Option<serde_json::Value>,
}

impl LlmRequest {
    /// True when the expected reply is a top-level JSON array. Provider JSON
    /// modes that only emit objects must stay off for these.
    pub fn wants_array(&self) -> bool {
        self.output_schema
            .as_ref()
            .and_then(|s| s.get("type"))
            .and_then(serde_json::Value::as_str)
            == Some("array")
    }
}

#[derive(Debug, Clone)]
pub struct LlmReply {
    pub text: String,
    pub model: String,
}

/// Returned (wrapped in `anyhow::Error`) by backends whose HTTP client gave up.
#[derive(Debug, Error)]
#[error("provider request timed out after {after_secs}s")]
pub struct ProviderTimeout {
    pub after_secs: u64,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short provider name used in logs, e.g. "gemini".
    fn name(&self) -> &str;

    async fn generate(&self, request: &LlmRequest) -> Result<LlmReply>;
}
