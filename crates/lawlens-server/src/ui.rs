//! Server-rendered pages: the uploader and the document viewer.

use std::{fmt::Write, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use lawlens_core::{flow::Flow, DocumentView, RiskLabel, ViewClause};
use lawlens_flows::{
    analyze::{analyze_text, analyze_upload, PASTED_DOCUMENT_TITLE},
    clause::AnswerQuestion,
    insight::{
        CheckMissingContracts, CompareToMarket, FlagUncertainClauses, GenerateSuggestedQuestions,
        LegalLensSummaryFlow, PredictRisk, RoleLens, SummarizeDocument, TrackCompliance,
    },
    run_flow,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    error::{ApiError, FLOW_FAILED_MESSAGE},
    routes::read_file_field,
    AppState,
};

/// Flows the viewer can run on the whole stored document with one click.
pub(crate) const DOCUMENT_TOOLS: &[(&str, &str)] = &[
    (SummarizeDocument::NAME, "Summarize"),
    (LegalLensSummaryFlow::NAME, "Professional and plain-language summary"),
    (PredictRisk::NAME, "Risk radar"),
    (FlagUncertainClauses::NAME, "Uncertain clauses"),
    (CompareToMarket::NAME, "Compare to market standards"),
    (TrackCompliance::NAME, "Obligations and deadlines"),
    (CheckMissingContracts::NAME, "Missing related contracts"),
    (GenerateSuggestedQuestions::NAME, "Suggested questions"),
];

// ── Notices ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    fn new(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
        }
    }

    fn no_text() -> Self {
        Self::new("No text to analyze", "Please paste some text.")
    }

    fn no_file() -> Self {
        Self::new("No file selected", "Please drop or select a file to analyze.")
    }

    /// What the uploader tells the user about a failed analysis.
    fn for_analysis(err: &ApiError, from_file: bool) -> Self {
        match err {
            ApiError::EmptyDocument => Self::new("Document is empty", "The provided document has no text content."),
            ApiError::UnsupportedFileType(_) => {
                Self::new("Unsupported File Type", "Please upload a .txt, .pdf, or .docx file.")
            },
            ApiError::PayloadTooLarge => Self::new("File too large", "Please upload a smaller file."),
            ApiError::InvalidInput(_) if from_file => Self::new(
                "Failed to process file",
                "There was an error reading or analyzing the file content.",
            ),
            _ => Self::new("Analysis Failed", FLOW_FAILED_MESSAGE),
        }
    }
}

// ── Forms ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct PasteForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub(crate) struct AskForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Deserialize)]
pub(crate) struct RoleForm {
    #[serde(default)]
    pub role: String,
}

#[derive(Deserialize)]
pub(crate) struct ViewQuery {
    pub eli: Option<u8>,
}

/// Explanation depth picked in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eli {
    Five,
    Fifteen,
}

impl Eli {
    fn from_query(q: Option<u8>) -> Self {
        match q {
            Some(15) => Self::Fifteen,
            _ => Self::Five,
        }
    }

    fn summary(self, clause: &ViewClause) -> &str {
        match self {
            Self::Five => &clause.summary_eli5,
            Self::Fifteen => &clause.summary_eli15,
        }
    }
}

/// Output of an Ask AI action shown under the document.
struct AiResult {
    heading: String,
    outcome: Result<Value, Notice>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub(crate) async fn index() -> Html<String> {
    Html(uploader_page(None))
}

pub(crate) async fn analyze_pasted(State(state): State<Arc<AppState>>, Form(form): Form<PasteForm>) -> Response {
    if form.text.trim().is_empty() {
        return notice_response(StatusCode::BAD_REQUEST, Notice::no_text());
    }
    let result = match analyze_text(&state.invoker, &form.text, PASTED_DOCUMENT_TITLE).await {
        Ok(view) => state.store.save(&view).map_err(ApiError::from),
        Err(e) => Err(e.into()),
    };
    finish_analysis(result, false)
}

pub(crate) async fn analyze_file(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let file = match read_file_field(multipart, state.max_upload_bytes).await {
        Ok(Some(file)) => file,
        Ok(None) => return notice_response(StatusCode::BAD_REQUEST, Notice::no_file()),
        Err(e) => return failure_response(&e, true),
    };
    let result = match analyze_upload(&state.invoker, file.as_upload(), state.ocr_min_text_chars).await {
        Ok(view) => state.store.save(&view).map_err(ApiError::from),
        Err(e) => Err(e.into()),
    };
    finish_analysis(result, true)
}

pub(crate) async fn analysis(State(state): State<Arc<AppState>>, Query(q): Query<ViewQuery>) -> Html<String> {
    let doc = state.store.load_or_sample();
    Html(analysis_page(&doc, Eli::from_query(q.eli), None))
}

pub(crate) async fn reset(State(state): State<Arc<AppState>>) -> Response {
    match state.store.clear() {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub(crate) async fn ask(State(state): State<Arc<AppState>>, Form(form): Form<AskForm>) -> Html<String> {
    let doc = state.store.load_or_sample();
    let question = form.question.trim();
    let outcome = if question.is_empty() {
        Err(Notice::new("No question", "Please type a question about the document."))
    } else {
        let input = json!({ "user_question": question, "contract_text": doc.full_text() });
        run_tool(&state, AnswerQuestion::NAME, input).await
    };
    let result = AiResult {
        heading: format!("Q: {question}"),
        outcome,
    };
    Html(analysis_page(&doc, Eli::Five, Some(&result)))
}

pub(crate) async fn role_lens(State(state): State<Arc<AppState>>, Form(form): Form<RoleForm>) -> Html<String> {
    let doc = state.store.load_or_sample();
    let role = form.role.trim();
    let outcome = if role.is_empty() {
        Err(Notice::new("No role", "Please say whose point of view to take."))
    } else {
        let input = json!({ "documentText": doc.full_text(), "role": role });
        run_tool(&state, RoleLens::NAME, input).await
    };
    let result = AiResult {
        heading: format!("As the {role}"),
        outcome,
    };
    Html(analysis_page(&doc, Eli::Five, Some(&result)))
}

pub(crate) async fn document_tool(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let Some((flow, label)) = DOCUMENT_TOOLS.iter().copied().find(|(flow, _)| *flow == name) else {
        return (StatusCode::NOT_FOUND, Html(uploader_page(None))).into_response();
    };
    let doc = state.store.load_or_sample();
    let text = doc.full_text();
    let input = if flow == CheckMissingContracts::NAME {
        json!({ "mainContractContent": text })
    } else {
        json!({ "documentText": text })
    };
    let result = AiResult {
        heading: label.to_string(),
        outcome: run_tool(&state, flow, input).await,
    };
    Html(analysis_page(&doc, Eli::Five, Some(&result))).into_response()
}

async fn run_tool(state: &AppState, flow: &str, input: Value) -> Result<Value, Notice> {
    run_flow(&state.invoker, flow, input).await.map_err(|e| {
        warn!(flow, "ask ai failed: {e}");
        Notice::new("An error occurred", format!("Failed to run {flow}."))
    })
}

fn finish_analysis(result: Result<(), ApiError>, from_file: bool) -> Response {
    match result {
        Ok(()) => Redirect::to("/analysis").into_response(),
        Err(e) => failure_response(&e, from_file),
    }
}

fn failure_response(err: &ApiError, from_file: bool) -> Response {
    match err {
        ApiError::Flow(e) => warn!(flow = e.flow(), "analysis failed: {e}"),
        other => warn!("analysis failed: {other:#}"),
    }
    notice_response(err.status(), Notice::for_analysis(err, from_file))
}

fn notice_response(status: StatusCode, notice: Notice) -> Response {
    (status, Html(uploader_page(Some(&notice)))).into_response()
}

// ── Rendering ─────────────────────────────────────────────────────────────

pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;color:#1f2933;background:#f7f7f8}\
header{display:flex;justify-content:space-between;align-items:center;padding:12px 24px;background:#fff;border-bottom:1px solid #ddd}\
main{display:flex;gap:24px;padding:24px}\
aside{width:280px;flex-shrink:0}\
article{flex:1;background:#fff;padding:24px;border-radius:8px;line-height:1.7}\
.notice{border:1px solid #d33;background:#fdecec;padding:12px;border-radius:6px;margin-bottom:16px}\
.clause{display:inline}\
details.clause summary{display:inline;cursor:pointer;border-radius:4px;padding:1px 2px}\
details.risky summary{background:#fbe0e0}\
details.negotiable summary{background:#fdf3c7}\
.popover{border:1px solid #ccc;background:#fff;padding:12px;margin:8px 0;border-radius:6px}\
.counter{background:#eef3ff;border:1px solid #c9d7ff;padding:8px;border-radius:6px}\
pre{background:#f2f2f2;padding:12px;border-radius:6px;white-space:pre-wrap;word-break:break-word}\
textarea{width:100%;min-height:200px}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{} · LawLens</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

fn render_notice(out: &mut String, notice: &Notice) {
    let _ = write!(
        out,
        "<div class=\"notice\" role=\"alert\"><strong>{}</strong><p>{}</p></div>",
        escape(notice.title),
        escape(&notice.message)
    );
}

pub(crate) fn uploader_page(notice: Option<&Notice>) -> String {
    let mut body = String::from("<header><h1>LawLens</h1><a href=\"/analysis\">Open last analysis</a></header><main><article>");
    if let Some(notice) = notice {
        render_notice(&mut body, notice);
    }
    body.push_str(
        "<h2>Upload a document</h2>\
         <form method=\"post\" action=\"/analyze/upload\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\".txt,.pdf,.docx\"> \
         <button type=\"submit\">Analyze file</button></form>\
         <h2>Or paste text</h2>\
         <form method=\"post\" action=\"/analyze/text\">\
         <textarea name=\"text\" placeholder=\"Paste the contract text here\"></textarea>\
         <p><button type=\"submit\">Analyze text</button></p></form>\
         </article></main>",
    );
    layout("Analyze a document", &body)
}

fn render_clause(out: &mut String, clause: &ViewClause, eli: Eli) {
    let id = escape(&clause.id);
    let text = escape(&clause.text);
    if clause.risk == RiskLabel::Standard {
        let _ = write!(out, "<span class=\"clause\" id=\"clause-{id}\">{text} </span>");
        return;
    }

    let label = match clause.risk {
        RiskLabel::Risky => "Risky",
        _ => "Negotiable",
    };
    let _ = write!(
        out,
        "<details class=\"clause {}\" id=\"clause-{id}\"><summary>{text}</summary>\
         <div class=\"popover\"><h4>{label} Clause</h4><p>{}</p>",
        clause.risk.as_str(),
        escape(eli.summary(clause)),
    );
    if let Some(counter) = &clause.counter_proposal {
        let _ = write!(
            out,
            "<h5>Suggested Counter-Proposal</h5><p class=\"counter\">{}</p>",
            escape(counter)
        );
    }
    out.push_str("</div></details> ");
}

fn render_sidebar(out: &mut String, doc: &DocumentView) {
    let counts = doc.risk_counts();
    let _ = write!(
        out,
        "<aside><h3>Summary</h3><p>{}</p>\
         <ul><li>{} risky</li><li>{} negotiable</li><li>{} standard</li></ul>\
         <h3>Flagged clauses</h3><ol>",
        escape(&doc.summary),
        counts.risky,
        counts.negotiable,
        counts.standard
    );
    for clause in doc.clauses.iter().filter(|c| c.risk != RiskLabel::Standard) {
        let name = clause.clause_title.as_deref().unwrap_or(&clause.id);
        let _ = write!(
            out,
            "<li><a href=\"#clause-{}\">{}</a> ({})</li>",
            escape(&clause.id),
            escape(name),
            clause.risk.as_str()
        );
    }
    out.push_str("</ol></aside>");
}

fn render_ask_ai(out: &mut String, result: Option<&AiResult>) {
    out.push_str(
        "<section id=\"ask-ai\"><h2>Ask AI</h2>\
         <form method=\"post\" action=\"/analysis/ask\">\
         <input name=\"question\" size=\"60\" placeholder=\"What is the late fee for rent?\"> \
         <button type=\"submit\">Ask</button></form>\
         <form method=\"post\" action=\"/analysis/role\">\
         <input name=\"role\" placeholder=\"Tenant\"> <button type=\"submit\">Read as this role</button></form><p>",
    );
    for (flow, label) in DOCUMENT_TOOLS {
        let _ = write!(
            out,
            "<form method=\"post\" action=\"/analysis/tools/{flow}\" style=\"display:inline\">\
             <button type=\"submit\">{}</button></form> ",
            escape(label)
        );
    }
    out.push_str("</p>");

    if let Some(result) = result {
        let _ = write!(out, "<h3>{}</h3>", escape(&result.heading));
        match &result.outcome {
            Ok(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
                let _ = write!(out, "<pre>{}</pre>", escape(&pretty));
            },
            Err(notice) => render_notice(out, notice),
        }
    }
    out.push_str("</section>");
}

fn analysis_page(doc: &DocumentView, eli: Eli, result: Option<&AiResult>) -> String {
    let analyzed = match doc.analyzed_at {
        Some(at) => format!("Analyzed {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => "Sample document".to_string(),
    };
    let (five, fifteen) = match eli {
        Eli::Five => ("<strong>5</strong>", "<a href=\"/analysis?eli=15\">15</a>"),
        Eli::Fifteen => ("<a href=\"/analysis?eli=5\">5</a>", "<strong>15</strong>"),
    };

    let mut body = String::new();
    let _ = write!(
        body,
        "<header><div><h1>{}</h1><small>{analyzed}</small></div>\
         <div>Explain like I'm: {five} | {fifteen}</div>\
         <form method=\"post\" action=\"/analysis/reset\"><button type=\"submit\">Analyze another document</button></form>\
         </header><main>",
        escape(&doc.title)
    );
    render_sidebar(&mut body, doc);
    body.push_str("<article><div class=\"document\">");
    for clause in &doc.clauses {
        render_clause(&mut body, clause, eli);
    }
    body.push_str("</div><hr>");
    render_ask_ai(&mut body, result);
    body.push_str("</article></main>");

    layout(&doc.title, &body)
}
