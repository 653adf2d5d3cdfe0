mod common;

use std::io::Write;

use common::{pdf_without_text_layer, ScriptedBackend};
use lawlens_core::{extract::data_uri, flow::FlowError, template::MEDIA_REFERENCE, RiskLabel};
use lawlens_flows::analyze::{analyze_text, analyze_upload, AnalyzeError, Upload, PASTED_DOCUMENT_TITLE};
use serde_json::json;
use tracing_test::traced_test;
use zip::write::SimpleFileOptions;

const LEASE: &str = "RESIDENTIAL LEASE\n1. Rent is $1,500 per month.\n2. Landlord may terminate at any time.";

fn parse_reply(title: &str) -> String {
    json!({
        "title": title,
        "docType": "Residential Lease",
        "parties": ["Landlord", "Tenant"],
        "dates": { "startDate": "2024-01-01", "endDate": "2024-12-31" },
        "financialTerms": ["$1,500 monthly rent"],
        "clauses": [
            { "clauseId": "C1", "type": "Payment", "text": "Rent is $1,500 per month.",
              "riskFlag": "standard", "explanation": "" },
            { "clauseId": "C2", "type": "Termination", "text": "Landlord may terminate at any time.",
              "riskFlag": "unusual", "explanation": "Termination is one-sided." }
        ],
        "summary": "A one-year residential lease.",
        "structuralIssues": []
    })
    .to_string()
}

fn risk_reply() -> String {
    json!([{
        "clauseId": "C2", "riskLevel": "HIGH", "issue": "Landlord can end the lease without cause.",
        "suggestedChange": "Require 60 days' written notice and a stated cause.", "isRisky": true
    }])
    .to_string()
}

#[tokio::test]
#[traced_test]
async fn test_text_is_parsed_then_reviewed() {
    let backend = ScriptedBackend::new().reply(parse_reply("Residential Lease")).reply(risk_reply());
    let view = analyze_text(&backend.invoker(), LEASE, PASTED_DOCUMENT_TITLE).await.unwrap();

    assert_eq!(view.title, "Residential Lease");
    assert_eq!(view.summary, "A one-year residential lease.");
    assert_eq!(view.clauses.len(), 2);
    assert_eq!(view.clauses[0].risk, RiskLabel::Standard);
    assert_eq!(view.clauses[1].risk, RiskLabel::Risky);
    assert_eq!(
        view.clauses[1].counter_proposal.as_deref(),
        Some("Require 60 days' written notice and a stated cause.")
    );

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].flow, "parse-document");
    assert!(requests[0].prompt.contains("Rent is $1,500 per month."));
    assert_eq!(requests[1].flow, "identify-risks");
    assert!(requests[1].prompt.contains(r#""clauseId":"C2""#));
    assert!(logs_contain("document analyzed"));
}

#[tokio::test]
async fn test_risk_list_wrapped_in_an_object_is_accepted() {
    let wrapped = json!({
        "risks": [{
            "clauseId": "C2", "riskLevel": "MEDIUM", "issue": "Termination needs no notice.",
            "suggestedChange": "Add a notice period.", "isRisky": true
        }]
    });
    let backend = ScriptedBackend::new()
        .reply(parse_reply("Lease"))
        .reply(wrapped.to_string());
    let view = analyze_text(&backend.invoker(), LEASE, PASTED_DOCUMENT_TITLE).await.unwrap();
    assert_eq!(view.clauses[1].risk, RiskLabel::Negotiable);
    assert_eq!(view.clauses[1].counter_proposal.as_deref(), Some("Add a notice period."));
}

#[tokio::test]
async fn test_blank_text_makes_no_call() {
    let backend = ScriptedBackend::new();
    let err = analyze_text(&backend.invoker(), " \n\t ", PASTED_DOCUMENT_TITLE).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::EmptyDocument));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_parse_failure_aborts_before_review() {
    let backend = ScriptedBackend::new().fail("gemini error 500");
    let err = analyze_text(&backend.invoker(), LEASE, PASTED_DOCUMENT_TITLE).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Flow(FlowError::Provider { flow: "parse-document", .. })));
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_review_failure_aborts_the_whole_analysis() {
    let backend = ScriptedBackend::new().reply(parse_reply("Lease")).reply("not json at all");
    let err = analyze_text(&backend.invoker(), LEASE, PASTED_DOCUMENT_TITLE).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Flow(FlowError::InvalidOutput { flow: "identify-risks", .. })));
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_text_upload_uses_file_name_as_fallback_title() {
    let backend = ScriptedBackend::new().reply(parse_reply("")).reply("[]");
    let upload = Upload {
        file_name: Some("lease.txt"),
        content_type: Some("text/plain"),
        bytes: LEASE.as_bytes(),
    };
    let view = analyze_upload(&backend.invoker(), upload, 100).await.unwrap();
    assert_eq!(view.title, "lease.txt");
    assert!(view.clauses.iter().all(|c| c.risk == RiskLabel::Standard));
    assert_eq!(view.clauses[1].summary_eli5, "Termination is one-sided.");
}

#[tokio::test]
async fn test_scanned_pdf_is_sent_to_the_model_as_a_file() {
    let pdf = pdf_without_text_layer();
    let backend = ScriptedBackend::new().reply(parse_reply("Scanned Lease")).reply(risk_reply());
    let upload = Upload {
        file_name: Some("scan.pdf"),
        content_type: Some("application/pdf"),
        bytes: &pdf,
    };
    let view = analyze_upload(&backend.invoker(), upload, 100).await.unwrap();
    assert_eq!(view.title, "Scanned Lease");
    assert_eq!(view.clauses[1].risk, RiskLabel::Risky);

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);

    let parse = &requests[0];
    assert_eq!(parse.flow, "parse-document");
    assert_eq!(parse.media.len(), 1);
    assert_eq!(parse.media[0].mime_type, "application/pdf");
    assert_eq!(parse.media[0].to_data_uri(), data_uri("application/pdf", &pdf));
    assert!(parse.prompt.contains(MEDIA_REFERENCE));
    assert!(!parse.prompt.contains("Document Text:"));

    // The risk step reviews the clauses read from the file.
    assert_eq!(requests[1].flow, "identify-risks");
    assert!(requests[1].media.is_empty());
    assert!(requests[1].prompt.contains("Landlord may terminate at any time."));
}

#[tokio::test]
async fn test_unsupported_upload_makes_no_call() {
    let backend = ScriptedBackend::new();
    let upload = Upload {
        file_name: Some("scan.png"),
        content_type: Some("image/png"),
        bytes: b"\x89PNG",
    };
    let err = analyze_upload(&backend.invoker(), upload, 100).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::UnsupportedFileType(ref t) if t == "image/png"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_docx_upload_is_extracted_before_parsing() {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(
            br#"<w:document><w:body><w:p><w:r><w:t>Rent is $1,500 per month.</w:t></w:r></w:p></w:body></w:document>"#,
        )
        .unwrap();
        zip.finish().unwrap();
    }
    let bytes = buf.into_inner();
    let backend = ScriptedBackend::new().reply(parse_reply("Lease")).reply("[]");
    let upload = Upload {
        file_name: Some("lease.docx"),
        content_type: Some("application/octet-stream"),
        bytes: &bytes,
    };
    analyze_upload(&backend.invoker(), upload, 100).await.unwrap();
    let prompt = &backend.requests()[0].prompt;
    assert!(prompt.contains("Document Text: \"Rent is $1,500 per month.\""));
    assert!(backend.requests()[0].media.is_empty());
}

#[tokio::test]
async fn test_empty_docx_is_an_empty_document() {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<w:document><w:body><w:p/></w:body></w:document>").unwrap();
        zip.finish().unwrap();
    }
    let bytes = buf.into_inner();
    let backend = ScriptedBackend::new();
    let upload = Upload {
        file_name: Some("blank.docx"),
        content_type: None,
        bytes: &bytes,
    };
    let err = analyze_upload(&backend.invoker(), upload, 100).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::EmptyDocument));
    assert!(backend.requests().is_empty());
}
