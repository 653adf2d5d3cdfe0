pub mod gemini;
mod http;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::{bail, Result};
use lawlens_core::{config::Config, llm::LlmBackend};
use tracing::{info, warn};

pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// Build the backend named by `LLM_BACKEND`.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn LlmBackend>> {
    let timeout = config.flow_timeout_s;
    let backend: Arc<dyn LlmBackend> = match config.llm_backend.as_str() {
        "gemini" => {
            if config.gemini_api_key.is_empty() {
                warn!("GEMINI_API_KEY is not set; gemini calls will be rejected");
            }
            Arc::new(
                GeminiBackend::new(&config.gemini_base_url, &config.gemini_api_key, &config.model)
                    .with_timeout(timeout),
            )
        },
        "openai" => {
            if config.openai_api_key.is_empty() {
                warn!("OPENAI_API_KEY is not set; openai calls will be rejected");
            }
            Arc::new(
                OpenAiBackend::new(&config.openai_base_url, &config.openai_api_key, &config.model)
                    .with_timeout(timeout),
            )
        },
        "ollama" => Arc::new(OllamaBackend::new(&config.ollama_base_url, &config.model).with_timeout(timeout)),
        other => bail!("unknown LLM backend {other:?}"),
    };
    info!(backend = backend.name(), model = %config.model, "LLM backend ready");
    Ok(backend)
}
