use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use lawlens_core::DocumentView;
use lawlens_flows::{
    all_flows,
    analyze::{analyze_text, analyze_upload, Upload, PASTED_DOCUMENT_TITLE},
    run_flow, FlowInfo,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::info;

use crate::{error::ApiError, logging, AppState};

// ── Request body types ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct AnalyzeBody {
    pub text: String,
    pub title: Option<String>,
}

/// One file read from a multipart `file` field.
pub(crate) struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn as_upload(&self) -> Upload<'_> {
        Upload {
            file_name: self.file_name.as_deref(),
            content_type: self.content_type.as_deref(),
            bytes: &self.bytes,
        }
    }
}

/// Read the `file` field of a multipart body. Returns `None` when no file was
/// chosen: browsers still send an empty, unnamed part in that case.
pub(crate) async fn read_file_field(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().filter(|n| !n.is_empty()).map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ApiError::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        if file_name.is_none() && bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "backend": state.invoker.backend_name(),
        "uptime_s": state.start_time.elapsed().as_secs(),
    }))
}

pub(crate) async fn list_flows() -> Json<Vec<FlowInfo>> {
    Json(all_flows())
}

pub(crate) async fn run_named_flow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let result = run_flow(&state.invoker, &name, input).await?;
    Ok(Json(json!({
        "success": true,
        "flow": name,
        "result": result,
    })))
}

pub(crate) async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<DocumentView>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let title = body
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(PASTED_DOCUMENT_TITLE);
    let view = analyze_text(&state.invoker, &body.text, title).await?;
    state.store.save(&view)?;
    Ok(Json(view))
}

pub(crate) async fn analyze_uploaded(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DocumentView>, ApiError> {
    let file = read_file_field(multipart, state.max_upload_bytes)
        .await?
        .ok_or_else(|| ApiError::InvalidInput("multipart field `file` is required".into()))?;
    let view = analyze_upload(&state.invoker, file.as_upload(), state.ocr_min_text_chars).await?;
    state.store.save(&view)?;
    Ok(Json(view))
}

pub(crate) async fn get_document(State(state): State<Arc<AppState>>) -> Json<DocumentView> {
    Json(state.store.load_or_sample())
}

pub(crate) async fn delete_document(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let cleared = state.store.clear()?;
    info!(cleared, "document reset");
    Ok(Json(json!({ "success": true, "cleared": cleared })))
}

/// Recent log lines first, then the live feed.
pub(crate) async fn sse_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.log_tx.subscribe();
    let backlog = logging::snapshot(&state.log_ring);
    let live = BroadcastStream::new(rx).filter_map(|msg| msg.ok());
    let stream = tokio_stream::iter(backlog)
        .chain(live)
        .map(|data| Ok(Event::default().data(data)));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
