use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};
use lawlens_core::{
    config::Config,
    flow::FlowInvoker,
    llm::{LlmBackend, LlmRequest, Media, ProviderTimeout},
    Clause, RiskFlag, RiskLevel,
};
use lawlens_flows::parse::{IdentifyRisks, IdentifyRisksInput};
use lawlens_llm::{backend_from_config, GeminiBackend, OllamaBackend, OpenAiBackend};
use serde_json::{json, Value};
use tracing_test::traced_test;

// =============================================================================
// Fake provider: records each request and answers with a canned response
// =============================================================================

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone)]
struct Fake {
    status: StatusCode,
    body: String,
    delay: Duration,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn record(State(fake): State<Fake>, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    fake.seen.lock().unwrap().push(Seen {
        path: uri.path().to_string(),
        headers,
        body,
    });
    tokio::time::sleep(fake.delay).await;
    (fake.status, fake.body.clone())
}

async fn serve(status: StatusCode, body: Value, delay: Duration) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = Fake {
        status,
        body: body.to_string(),
        delay,
        seen: seen.clone(),
    };
    let app = Router::new().fallback(record).with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn request(media: Vec<Media>) -> LlmRequest {
    LlmRequest {
        flow: "parse-document".into(),
        prompt: "Extract the clauses.".into(),
        media,
        output_schema: None,
    }
}

fn risks_input() -> IdentifyRisksInput {
    IdentifyRisksInput {
        clauses: vec![Clause {
            clause_id: "C2".into(),
            clause_type: "Termination".into(),
            text: "Landlord may terminate at any time.".into(),
            risk_flag: RiskFlag::Unusual,
            explanation: "One-sided.".into(),
        }],
    }
}

/// A risk list the way JSON-object mode tends to return it.
fn wrapped_risks() -> String {
    json!({
        "risks": [{
            "clauseId": "C2", "riskLevel": "HIGH", "issue": "Termination without cause.",
            "suggestedChange": "Require 60 days' notice.", "isRisky": true
        }]
    })
    .to_string()
}

fn pdf() -> Media {
    Media::from_data_uri("data:application/pdf;base64,JVBERi0xLjQ=").unwrap()
}

fn png() -> Media {
    Media::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap()
}

// =============================================================================
// Gemini
// =============================================================================

#[tokio::test]
async fn test_gemini_request_shape_and_reply() {
    let reply = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "{\"title\":" }, { "text": "\"Lease\"}" }] },
            "finishReason": "STOP"
        }]
    });
    let (url, seen) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let backend = GeminiBackend::new(url, "secret-key", "gemini-2.5-flash");

    let out = backend.generate(&request(vec![pdf()])).await.unwrap();
    assert_eq!(out.text, "{\"title\":\"Lease\"}");
    assert_eq!(out.model, "gemini-2.5-flash");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].path, "/models/gemini-2.5-flash:generateContent");
    assert_eq!(seen[0].headers["x-goog-api-key"], "secret-key");
    let body = &seen[0].body;
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Extract the clauses.");
    assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "application/pdf");
    assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "JVBERi0xLjQ=");
}

#[tokio::test]
async fn test_gemini_error_status_carries_body() {
    let (url, _) = serve(
        StatusCode::FORBIDDEN,
        json!({ "error": { "message": "API key not valid" } }),
        Duration::ZERO,
    )
    .await;
    let err = GeminiBackend::new(url, "bad", "gemini-2.5-flash")
        .generate(&request(vec![]))
        .await
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("403"));
    assert!(msg.contains("API key not valid"));
}

#[tokio::test]
async fn test_gemini_empty_candidate_is_an_error() {
    let reply = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
    let (url, _) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let err = GeminiBackend::new(url, "k", "m").generate(&request(vec![])).await.unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn test_gemini_slow_server_is_a_provider_timeout() {
    let (url, _) = serve(StatusCode::OK, json!({}), Duration::from_secs(5)).await;
    let err = GeminiBackend::new(url, "k", "m")
        .with_timeout(1)
        .generate(&request(vec![]))
        .await
        .unwrap_err();
    let timeout = err.downcast_ref::<ProviderTimeout>().unwrap();
    assert_eq!(timeout.after_secs, 1);
}

// =============================================================================
// OpenAI-compatible
// =============================================================================

#[tokio::test]
async fn test_openai_request_shape_and_reply() {
    let reply = json!({
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{ "message": { "role": "assistant", "content": "{\"ok\":true}" } }]
    });
    let (url, seen) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let backend = OpenAiBackend::new(url, "sk-test", "gpt-4o-mini");

    let out = backend.generate(&request(vec![png()])).await.unwrap();
    assert_eq!(out.text, "{\"ok\":true}");
    assert_eq!(out.model, "gpt-4o-mini-2024-07-18");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].path, "/chat/completions");
    assert_eq!(seen[0].headers["authorization"], "Bearer sk-test");
    let body = &seen[0].body;
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["response_format"]["type"], "json_object");
    let content = &body["messages"][0]["content"];
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[1]["type"], "image_url");
    assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn test_openai_array_flow_runs_without_json_mode() {
    let reply = json!({ "choices": [{ "message": { "content": wrapped_risks() } }] });
    let (url, seen) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let invoker = FlowInvoker::new(Arc::new(OpenAiBackend::new(url, "k", "gpt-4o-mini")));

    let risks = invoker.invoke::<IdentifyRisks>(&risks_input()).await.unwrap();
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].clause_id, "C2");
    assert_eq!(risks[0].risk_level, RiskLevel::High);

    let seen = seen.lock().unwrap();
    assert!(seen[0].body.get("response_format").is_none());
}

#[tokio::test]
async fn test_openai_rejects_pdf_media_without_calling() {
    let (url, seen) = serve(StatusCode::OK, json!({}), Duration::ZERO).await;
    let err = OpenAiBackend::new(url, "k", "m")
        .generate(&request(vec![pdf()]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("application/pdf"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_openai_null_content_is_an_error() {
    let reply = json!({ "choices": [{ "message": { "content": null } }] });
    let (url, _) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let err = OpenAiBackend::new(url, "k", "m").generate(&request(vec![])).await.unwrap_err();
    assert!(err.to_string().contains("empty reply"));
}

// =============================================================================
// Ollama
// =============================================================================

#[tokio::test]
async fn test_ollama_request_shape_and_reply() {
    let reply = json!({ "model": "llama3.1", "message": { "role": "assistant", "content": "[]" }, "done": true });
    let (url, seen) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let out = OllamaBackend::new(url, "llama3.1").generate(&request(vec![])).await.unwrap();
    assert_eq!(out.text, "[]");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].path, "/api/chat");
    let body = &seen[0].body;
    assert_eq!(body["stream"], false);
    assert_eq!(body["format"], "json");
    assert_eq!(body["messages"][0]["content"], "Extract the clauses.");
    assert!(body["messages"][0].get("images").is_none());
}

#[tokio::test]
async fn test_ollama_array_flow_runs_without_json_format() {
    let reply = json!({ "message": { "content": wrapped_risks() } });
    let (url, seen) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    let invoker = FlowInvoker::new(Arc::new(OllamaBackend::new(url, "llama3.1")));

    let risks = invoker.invoke::<IdentifyRisks>(&risks_input()).await.unwrap();
    assert_eq!(risks[0].suggested_change, "Require 60 days' notice.");
    assert!(seen.lock().unwrap()[0].body.get("format").is_none());
}

#[tokio::test]
async fn test_ollama_images_are_sent_as_base64() {
    let reply = json!({ "message": { "content": "{}" } });
    let (url, seen) = serve(StatusCode::OK, reply, Duration::ZERO).await;
    OllamaBackend::new(url, "llava").generate(&request(vec![png()])).await.unwrap();
    assert_eq!(seen.lock().unwrap()[0].body["messages"][0]["images"][0], "iVBORw0KGgo=");
}

#[tokio::test]
#[traced_test]
async fn test_ollama_unreachable_is_logged() {
    // Nothing listens on port 9 locally.
    let err = OllamaBackend::new("http://127.0.0.1:9", "llama3.1")
        .generate(&request(vec![]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ollama request failed"));
    assert!(logs_contain("provider request failed"));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_backend_from_config_follows_llm_backend() {
    for (name, expected) in [("gemini", "gemini"), ("openai", "openai"), ("ollama", "ollama")] {
        let vars: HashMap<String, String> = [("LLM_BACKEND".to_string(), name.to_string())].into();
        let config = Config::from_vars(&vars).unwrap();
        let backend = backend_from_config(&config).unwrap();
        assert_eq!(backend.name(), expected);
    }
}
