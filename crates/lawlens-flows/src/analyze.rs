//! Document analysis: parse the document into clauses, review the clauses for
//! risk, and merge both results into the view-model the viewer renders.

use std::collections::HashMap;

use chrono::Utc;
use lawlens_core::{
    extract::{extract_text_blocking, DocumentKind, ExtractError, Extracted},
    flow::{FlowError, FlowInvoker},
    ClauseRisk, DocumentView, RiskLabel, ViewClause,
};
use thiserror::Error;
use tracing::info;

use crate::parse::{IdentifyRisks, IdentifyRisksInput, ParseDocument, ParseDocumentInput, ParseDocumentOutput};

pub const PASTED_DOCUMENT_TITLE: &str = "Pasted Document";
pub const UPLOADED_DOCUMENT_TITLE: &str = "Uploaded Document";
pub const DEFAULT_ELI5: &str = "This is a standard clause.";
pub const DEFAULT_ELI15: &str = "This clause follows typical patterns and does not contain unusual language.";

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("document is empty")]
    EmptyDocument,
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// An uploaded file as received from the browser.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Analyze pasted or extracted text. Empty text makes no provider call.
pub async fn analyze_text(invoker: &FlowInvoker, text: &str, fallback_title: &str) -> Result<DocumentView, AnalyzeError> {
    if text.trim().is_empty() {
        return Err(AnalyzeError::EmptyDocument);
    }
    info!(chars = text.len(), "analyzing document text");
    let parsed = invoker.invoke::<ParseDocument>(&ParseDocumentInput::text(text)).await?;
    review_and_build(invoker, parsed, fallback_title).await
}

/// Extract an uploaded file and analyze it. A PDF without a usable text layer
/// is handed to the parse flow as a file instead.
pub async fn analyze_upload(
    invoker: &FlowInvoker,
    upload: Upload<'_>,
    ocr_min_chars: usize,
) -> Result<DocumentView, AnalyzeError> {
    let kind = DocumentKind::detect(upload.content_type, upload.file_name).ok_or_else(|| {
        AnalyzeError::UnsupportedFileType(
            upload
                .content_type
                .or(upload.file_name)
                .unwrap_or("unknown")
                .to_string(),
        )
    })?;
    let title = upload
        .file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(UPLOADED_DOCUMENT_TITLE);

    info!(file = title, kind = ?kind, bytes = upload.bytes.len(), "analyzing upload");

    match extract_text_blocking(kind, upload.bytes.to_vec(), ocr_min_chars).await? {
        Extracted::Text(text) => analyze_text(invoker, &text, title).await,
        Extracted::Scanned { data_uri } => {
            let parsed = invoker.invoke::<ParseDocument>(&ParseDocumentInput::file(data_uri)).await?;
            review_and_build(invoker, parsed, title).await
        },
    }
}

async fn review_and_build(
    invoker: &FlowInvoker,
    parsed: ParseDocumentOutput,
    fallback_title: &str,
) -> Result<DocumentView, AnalyzeError> {
    let risks = invoker
        .invoke::<IdentifyRisks>(&IdentifyRisksInput {
            clauses: parsed.clauses.clone(),
        })
        .await?;
    let view = build_view(parsed, &risks, fallback_title);
    let counts = view.risk_counts();
    info!(
        title = %view.title,
        clauses = view.clauses.len(),
        risky = counts.risky,
        negotiable = counts.negotiable,
        "document analyzed"
    );
    Ok(view)
}

/// Merge parse and risk output by clause id. A later risk entry for the same
/// clause replaces an earlier one.
pub fn build_view(parsed: ParseDocumentOutput, risks: &[ClauseRisk], fallback_title: &str) -> DocumentView {
    let by_clause: HashMap<&str, &ClauseRisk> = risks.iter().map(|r| (r.clause_id.as_str(), r)).collect();

    let clauses = parsed
        .clauses
        .into_iter()
        .map(|clause| {
            let risk = by_clause.get(clause.clause_id.as_str()).copied();
            let explanation = Some(clause.explanation.as_str()).filter(|e| !e.trim().is_empty());
            let issue = risk.map(|r| r.issue.as_str());
            ViewClause {
                risk: RiskLabel::from_assessment(risk),
                summary_eli5: issue.or(explanation).unwrap_or(DEFAULT_ELI5).to_string(),
                summary_eli15: issue.or(explanation).unwrap_or(DEFAULT_ELI15).to_string(),
                counter_proposal: risk.map(|r| r.suggested_change.clone()),
                clause_title: Some(clause.clause_type).filter(|t| !t.trim().is_empty()),
                id: clause.clause_id,
                text: clause.text,
            }
        })
        .collect();

    let title = if parsed.title.trim().is_empty() {
        fallback_title.to_string()
    } else {
        parsed.title
    };

    DocumentView {
        title,
        summary: parsed.summary,
        clauses,
        analyzed_at: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use lawlens_core::{Clause, RiskFlag, RiskLevel};

    use super::*;
    use crate::parse::DocumentDates;

    fn clause(id: &str, kind: &str, explanation: &str) -> Clause {
        Clause {
            clause_id: id.into(),
            clause_type: kind.into(),
            text: format!("Text of {id}."),
            risk_flag: if explanation.is_empty() {
                RiskFlag::Standard
            } else {
                RiskFlag::Unusual
            },
            explanation: explanation.into(),
        }
    }

    fn risk(id: &str, level: RiskLevel, is_risky: bool, issue: &str) -> ClauseRisk {
        ClauseRisk {
            clause_id: id.into(),
            risk_level: level,
            issue: issue.into(),
            suggested_change: format!("Reword {id}."),
            is_risky,
        }
    }

    fn parsed(title: &str, clauses: Vec<Clause>) -> ParseDocumentOutput {
        ParseDocumentOutput {
            title: title.into(),
            doc_type: "Lease".into(),
            parties: vec!["Landlord".into(), "Tenant".into()],
            dates: DocumentDates {
                start_date: "2024-01-01".into(),
                end_date: "2024-12-31".into(),
            },
            financial_terms: vec![],
            clauses,
            summary: "A lease.".into(),
            structural_issues: vec![],
        }
    }

    #[test]
    fn label_mapping_and_defaults() {
        let doc = parsed(
            "Lease",
            vec![
                clause("C1", "Rent", ""),
                clause("C2", "Termination", "Landlord may end at will."),
                clause("C3", "Deposit", ""),
                clause("C4", "Repairs", ""),
            ],
        );
        let risks = vec![
            risk("C2", RiskLevel::High, true, "One-sided termination."),
            risk("C3", RiskLevel::Medium, true, "Deposit is high."),
            risk("C4", RiskLevel::High, false, "Vague repair duty."),
        ];
        let view = build_view(doc, &risks, PASTED_DOCUMENT_TITLE);

        assert_eq!(view.title, "Lease");
        assert_eq!(view.summary, "A lease.");
        let c1 = &view.clauses[0];
        assert_eq!(c1.risk, RiskLabel::Standard);
        assert_eq!(c1.summary_eli5, DEFAULT_ELI5);
        assert_eq!(c1.summary_eli15, DEFAULT_ELI15);
        assert_eq!(c1.counter_proposal, None);
        assert_eq!(c1.clause_title.as_deref(), Some("Rent"));

        let c2 = &view.clauses[1];
        assert_eq!(c2.risk, RiskLabel::Risky);
        assert_eq!(c2.summary_eli5, "One-sided termination.");
        assert_eq!(c2.counter_proposal.as_deref(), Some("Reword C2."));

        assert_eq!(view.clauses[2].risk, RiskLabel::Negotiable);
        // Not flagged risky, but the issue and suggestion still show.
        assert_eq!(view.clauses[3].risk, RiskLabel::Standard);
        assert_eq!(view.clauses[3].summary_eli15, "Vague repair duty.");
        assert_eq!(view.clauses[3].counter_proposal.as_deref(), Some("Reword C4."));
        assert!(view.analyzed_at.is_some());
    }

    #[test]
    fn explanation_is_used_without_a_risk_entry() {
        let doc = parsed("Lease", vec![clause("C1", "Pets", "No pets at all.")]);
        let view = build_view(doc, &[], PASTED_DOCUMENT_TITLE);
        assert_eq!(view.clauses[0].risk, RiskLabel::Standard);
        assert_eq!(view.clauses[0].summary_eli5, "No pets at all.");
        assert_eq!(view.clauses[0].summary_eli15, "No pets at all.");
    }

    #[test]
    fn last_duplicate_risk_wins() {
        let doc = parsed("Lease", vec![clause("C1", "Rent", "")]);
        let risks = vec![
            risk("C1", RiskLevel::High, true, "first"),
            risk("C1", RiskLevel::Low, true, "second"),
        ];
        let view = build_view(doc, &risks, PASTED_DOCUMENT_TITLE);
        assert_eq!(view.clauses[0].risk, RiskLabel::Negotiable);
        assert_eq!(view.clauses[0].summary_eli5, "second");
    }

    #[test]
    fn risks_for_unknown_clauses_are_ignored() {
        let doc = parsed("Lease", vec![clause("C1", "Rent", "")]);
        let view = build_view(doc, &[risk("C9", RiskLevel::High, true, "ghost")], PASTED_DOCUMENT_TITLE);
        assert_eq!(view.clauses.len(), 1);
        assert_eq!(view.clauses[0].risk, RiskLabel::Standard);
    }

    #[test]
    fn blank_title_falls_back() {
        let view = build_view(parsed("  ", vec![]), &[], "lease.pdf");
        assert_eq!(view.title, "lease.pdf");
        assert!(view.clauses.is_empty());
    }
}
