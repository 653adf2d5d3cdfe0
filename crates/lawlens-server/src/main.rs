use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use lawlens_core::{config::Config, flow::FlowInvoker, store::DocumentStore};
use lawlens_llm::backend_from_config;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod logging;
mod routes;
mod ui;


use logging::{BroadcastLayer, LogRing};

const DEFAULT_LOG_FILTER: &str = "lawlens_server=info,lawlens_core=info,lawlens_flows=info,lawlens_llm=info,tower_http=info";

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub invoker: FlowInvoker,
    pub store: DocumentStore,
    pub max_upload_bytes: usize,
    pub ocr_min_text_chars: usize,
    pub start_time: Instant,
    pub log_tx: broadcast::Sender<String>,
    pub log_ring: LogRing,
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // Health
        .route("/api/health", get(routes::health))
        // Flows
        .route("/api/flows", get(routes::list_flows))
        .route("/api/flows/:name", post(routes::run_named_flow))
        // Document analysis
        .route("/api/analyze", post(routes::analyze))
        .route("/api/analyze/upload", post(routes::analyze_uploaded))
        .route(
            "/api/document",
            get(routes::get_document).delete(routes::delete_document),
        )
        // SSE logs
        .route("/api/logs", get(routes::sse_logs))
        // Pages
        .route("/", get(ui::index))
        .route("/analyze/text", post(ui::analyze_pasted))
        .route("/analyze/upload", post(ui::analyze_file))
        .route("/analysis", get(ui::analysis))
        .route("/analysis/reset", post(ui::reset))
        .route("/analysis/ask", post(ui::ask))
        .route("/analysis/role", post(ui::role_lens))
        .route("/analysis/tools/:name", post(ui::document_tool))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (log_tx, _log_rx) = broadcast::channel::<String>(256);
    let log_ring = LogRing::default();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .with(BroadcastLayer {
            tx: log_tx.clone(),
            ring: Arc::clone(&log_ring),
        })
        .init();

    let config = Config::from_env()?;

    let backend = backend_from_config(&config)?;
    let invoker = FlowInvoker::new(backend).with_timeout(config.flow_timeout());
    let store = DocumentStore::open(&config.data_dir)?;

    info!(
        backend = invoker.backend_name(),
        model = %config.model,
        store = %store.path().display(),
        "lawlens starting"
    );

    let state = Arc::new(AppState {
        invoker,
        store,
        max_upload_bytes: config.max_upload_bytes,
        ocr_min_text_chars: config.ocr_min_text_chars,
        start_time: Instant::now(),
        log_tx,
        log_ring,
    });

    let addr = config.addr();
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
