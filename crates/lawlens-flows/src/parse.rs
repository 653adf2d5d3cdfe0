//! Clause extraction and clause-level risk review: the two flows behind every
//! document analysis.

use lawlens_core::{flow::Flow, Clause, ClauseRisk};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Either the document text or a data URI of the file (scanned PDFs).
/// Both keys are always present when serialized so the prompt can test them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseDocumentInput {
    /// The full text content of the legal document to be parsed.
    #[serde(default)]
    pub document_text: Option<String>,
    /// The document file as a base64 data URI: `data:<mimetype>;base64,<encoded_data>`.
    #[serde(default)]
    pub document_data_uri: Option<String>,
}

impl ParseDocumentInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            document_text: Some(text.into()),
            document_data_uri: None,
        }
    }

    pub fn file(data_uri: impl Into<String>) -> Self {
        Self {
            document_text: None,
            document_data_uri: Some(data_uri.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDates {
    /// The effective or start date of the document.
    pub start_date: String,
    /// The expiry or end date of the document, if specified.
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseDocumentOutput {
    /// The main title of the legal document.
    pub title: String,
    /// The kind of document, e.g. "Rental Agreement" or "Employment Contract".
    pub doc_type: String,
    /// The parties involved, such as "Landlord" and "Tenant".
    pub parties: Vec<String>,
    pub dates: DocumentDates,
    /// Key financial obligations: rent, salary, deposits, penalties.
    pub financial_terms: Vec<String>,
    pub clauses: Vec<Clause>,
    /// One paragraph on the document's purpose, key points and risks.
    pub summary: String,
    /// Structural problems such as missing signatures or undefined terms.
    pub structural_issues: Vec<String>,
}

pub struct ParseDocument;

impl Flow for ParseDocument {
    type Input = ParseDocumentInput;
    type Output = ParseDocumentOutput;

    const NAME: &'static str = "parse-document";
    const DESCRIPTION: &'static str =
        "Split a legal document (text or scanned file) into typed clauses with metadata and a summary.";
    const PROMPT: &'static str = PARSE_PROMPT;

    fn check_input(input: &ParseDocumentInput) -> Result<(), String> {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if has(&input.document_text) || has(&input.document_data_uri) {
            Ok(())
        } else {
            Err("either documentText or documentDataUri is required".into())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdentifyRisksInput {
    /// Clauses already extracted from the document.
    pub clauses: Vec<Clause>,
}

pub struct IdentifyRisks;

impl Flow for IdentifyRisks {
    type Input = IdentifyRisksInput;
    type Output = Vec<ClauseRisk>;

    const NAME: &'static str = "identify-risks";
    const DESCRIPTION: &'static str = "Flag risky clauses and suggest counter-proposal wording for each.";
    const PROMPT: &'static str = IDENTIFY_RISKS_PROMPT;
}

const PARSE_PROMPT: &str = "\
[ROLE]\n\
You are a legal document assistant for LawLens with OCR capabilities. The user has supplied a legal document.\n\
\n\
[INSTRUCTIONS]\n\
1. Work out where the document comes from. When a document file is attached it is a scanned document \
(for example an image-only PDF): read it with OCR and prefer it over any text. Otherwise use the document text.\n\
2. Clean up the text after extraction: rejoin words split across lines, drop OCR noise and page numbers, \
and rebuild whole paragraphs and clauses.\n\
3. From the clean text, extract the document metadata:\n\
- title\n\
- parties (e.g. Employer, Employee, Landlord, Tenant)\n\
- dates (effective, expiry, renewal)\n\
- financial obligations (rent, salary, deposit, penalties and so on)\n\
- jurisdiction or governing law\n\
4. Split the document into individual clauses. For every clause:\n\
- give it a unique clauseId such as \"C1\", \"C2\";\n\
- set its type from the usual legal categories (\"Termination\", \"Payment\", \"Confidentiality\", \"Governing Law\", ...);\n\
- copy the full clause text;\n\
- set riskFlag to \"unusual\" when the language is non-standard, one-sided or potentially risky, otherwise \"standard\";\n\
- write a short explanation only when riskFlag is \"unusual\", otherwise leave it empty.\n\
5. Write a one-paragraph summary of the document's purpose, obligations and overall risk level.\n\
6. List structural issues such as missing signatures or undefined terms.\n\
\n\
[INPUT]\n\
{{#if documentDataUri}}Document File: {{media url=documentDataUri}}\
{{else}}Document Text: \"{{documentText}}\"{{/if}}";

const IDENTIFY_RISKS_PROMPT: &str = "\
You are a legal assistant specialising in clause-level risk review. Review the array of legal clauses \
below and find potential risks.\n\
\n\
[INSTRUCTIONS]\n\
1. For every clause object, check its text for:\n\
- ambiguous language (e.g. \"reasonable efforts\");\n\
- unfair obligations (e.g. steep penalty fees);\n\
- missing safeguards (termination rights, dispute resolution);\n\
- jurisdictional risk (governing law that unfairly favours one party).\n\
2. For each risk found, produce an object with:\n\
- the clauseId of the input clause;\n\
- riskLevel \"LOW\", \"MEDIUM\" or \"HIGH\";\n\
- issue: a clear description of the problem;\n\
- suggestedChange: improved wording or a change that mitigates the risk;\n\
- isRisky set to true.\n\
3. Leave clauses without risk out of the output.\n\
4. Return an array of these objects, or an empty array when nothing is risky.\n\
\n\
[INPUT]\n\
Clauses: {{{clauses}}}";
