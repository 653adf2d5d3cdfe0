//! Flow definitions and the invoker that runs them against an LLM backend.

use std::{sync::Arc, time::Duration};

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    llm::{LlmBackend, LlmRequest, ProviderTimeout},
    reply::decode_reply,
    template::{self, TemplateError},
};

pub const DEFAULT_FLOW_TIMEOUT: Duration = Duration::from_secs(120);

/// One named prompt: typed input in, schema-checked JSON out.
pub trait Flow: Send + Sync + 'static {
    type Input: Serialize + DeserializeOwned + JsonSchema + Send + Sync;
    type Output: Serialize + DeserializeOwned + JsonSchema + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const PROMPT: &'static str;

    /// Constraints the input type cannot express by itself.
    fn check_input(_input: &Self::Input) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{flow}: invalid input: {message}")]
    InvalidInput { flow: &'static str, message: String },
    #[error("{flow}: {source}")]
    Template {
        flow: &'static str,
        #[source]
        source: TemplateError,
    },
    #[error("{flow}: provider call failed: {message}")]
    Provider { flow: &'static str, message: String },
    #[error("{flow}: no reply within {}s", .after.as_secs())]
    Timeout { flow: &'static str, after: Duration },
    #[error("{flow}: invalid output: {message}")]
    InvalidOutput { flow: &'static str, message: String },
}

impl FlowError {
    pub fn flow(&self) -> &'static str {
        match self {
            Self::InvalidInput { flow, .. }
            | Self::Template { flow, .. }
            | Self::Provider { flow, .. }
            | Self::Timeout { flow, .. }
            | Self::InvalidOutput { flow, .. } => *flow,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// JSON Schema of a flow's output, as sent to the provider.
pub fn output_schema<F: Flow>() -> Value {
    serde_json::to_value(schemars::schema_for!(F::Output)).unwrap_or_default()
}

pub fn input_schema<F: Flow>() -> Value {
    serde_json::to_value(schemars::schema_for!(F::Input)).unwrap_or_default()
}

fn schema_instructions(schema: &Value) -> String {
    let pretty = serde_json::to_string_pretty(schema).unwrap_or_default();
    format!(
        "\n\n[OUTPUT SCHEMA]\n\
         Respond with a single JSON document that validates against this JSON Schema. \
         Do not add commentary outside the JSON.\n{pretty}\n"
    )
}

/// Runs flows against one backend. Cheap to clone.
#[derive(Clone)]
pub struct FlowInvoker {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
}

impl FlowInvoker {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_FLOW_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Validate the input and render the full provider request without sending it.
    pub fn prepare<F: Flow>(&self, input: &F::Input) -> Result<LlmRequest, FlowError> {
        F::check_input(input).map_err(|message| FlowError::InvalidInput {
            flow: F::NAME,
            message,
        })?;

        let fields = match serde_json::to_value(input) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(FlowError::InvalidInput {
                    flow: F::NAME,
                    message: e.to_string(),
                })
            },
        };

        let rendered = template::render(F::PROMPT, &fields).map_err(|source| match source {
            TemplateError::InvalidMedia(_) => FlowError::InvalidInput {
                flow: F::NAME,
                message: source.to_string(),
            },
            source => FlowError::Template {
                flow: F::NAME,
                source,
            },
        })?;

        let schema = output_schema::<F>();
        let mut prompt = rendered.text;
        prompt.push_str(&schema_instructions(&schema));

        Ok(LlmRequest {
            flow: F::NAME.to_string(),
            prompt,
            media: rendered.media,
            output_schema: Some(schema),
        })
    }

    pub async fn invoke<F: Flow>(&self, input: &F::Input) -> Result<F::Output, FlowError> {
        let request = self.prepare::<F>(input)?;

        info!(
            flow = F::NAME,
            backend = self.backend.name(),
            prompt_len = request.prompt.len(),
            media = request.media.len(),
            "invoking flow"
        );

        let reply = match tokio::time::timeout(self.timeout, self.backend.generate(&request)).await {
            Err(_) => {
                warn!(flow = F::NAME, timeout_secs = self.timeout.as_secs(), "flow timed out");
                return Err(FlowError::Timeout {
                    flow: F::NAME,
                    after: self.timeout,
                });
            },
            Ok(Err(e)) => {
                if let Some(t) = e.downcast_ref::<ProviderTimeout>() {
                    warn!(flow = F::NAME, timeout_secs = t.after_secs, "provider timed out");
                    return Err(FlowError::Timeout {
                        flow: F::NAME,
                        after: Duration::from_secs(t.after_secs),
                    });
                }
                warn!(flow = F::NAME, "provider call failed: {e:#}");
                return Err(FlowError::Provider {
                    flow: F::NAME,
                    message: format!("{e:#}"),
                });
            },
            Ok(Ok(reply)) => reply,
        };

        match decode_reply::<F::Output>(&reply.text) {
            Ok(output) => {
                info!(
                    flow = F::NAME,
                    model = %reply.model,
                    output_len = reply.text.len(),
                    "flow completed"
                );
                Ok(output)
            },
            Err(message) => {
                warn!(flow = F::NAME, model = %reply.model, "{message}");
                Err(FlowError::InvalidOutput {
                    flow: F::NAME,
                    message,
                })
            },
        }
    }

    /// Run a flow with untyped JSON on both sides.
    pub async fn invoke_json<F: Flow>(&self, input: Value) -> Result<Value, FlowError> {
        let input: F::Input = serde_json::from_value(input).map_err(|e| FlowError::InvalidInput {
            flow: F::NAME,
            message: e.to_string(),
        })?;
        let output = self.invoke::<F>(&input).await?;
        serde_json::to_value(output).map_err(|e| FlowError::InvalidOutput {
            flow: F::NAME,
            message: e.to_string(),
        })
    }
}
