use anyhow::{bail, Context, Result};
use lawlens_core::llm::ProviderTimeout;
use tracing::warn;

/// Longest slice of an error body carried into the error message.
const MAX_ERROR_BODY: usize = 500;

pub(crate) fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .context("building HTTP client")
}

/// Send a provider request and return the body of a 2xx response.
pub(crate) async fn send(provider: &str, request: reqwest::RequestBuilder, timeout_secs: u64) -> Result<String> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e, timeout_secs))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e, timeout_secs))?;

    if !status.is_success() {
        warn!(provider, status = %status, "provider returned non-2xx: {}", truncate(&body));
        bail!("{provider} error {status}: {}", truncate(&body));
    }
    Ok(body)
}

fn transport_error(provider: &str, e: reqwest::Error, timeout_secs: u64) -> anyhow::Error {
    if e.is_timeout() {
        warn!(provider, timeout_secs, "provider request timed out");
        return ProviderTimeout { after_secs: timeout_secs }.into();
    }
    warn!(provider, "provider request failed: {e}");
    anyhow::Error::new(e).context(format!("{provider} request failed"))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((at, _)) => &body[..at],
        None => body,
    }
}
