//! Whole-document insight flows. Each takes the document text and returns one
//! structured view of it.

use lawlens_core::flow::Flow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTextInput {
    /// The full text content of the legal document.
    pub document_text: String,
}

impl DocumentTextInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            document_text: text.into(),
        }
    }
}

fn require_text(input: &DocumentTextInput) -> Result<(), String> {
    if input.document_text.trim().is_empty() {
        return Err("documentText must not be empty".into());
    }
    Ok(())
}

// ── summarize-document ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeyRisk {
    /// A key risk identified in the document.
    pub risk: String,
    /// What the risk could lead to.
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Obligations, payments, rights and risks at a Grade 10 reading level.
    pub overview: String,
    /// Three to five key risks with plain explanations.
    pub key_risks: Vec<KeyRisk>,
    /// Next steps such as points to negotiate or clauses to add.
    pub recommended_actions: Vec<String>,
}

pub struct SummarizeDocument;

impl Flow for SummarizeDocument {
    type Input = DocumentTextInput;
    type Output = DocumentSummary;

    const NAME: &'static str = "summarize-document";
    const DESCRIPTION: &'static str = "One-page plain-language TL;DR with key risks and recommended actions.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You simplify legal documents. Produce a one-page TL;DR of the contract.\n\
\n\
[INPUT]\n\
Contract text: \"{documentText}\"\n\
\n\
[INSTRUCTIONS]\n\
1. overview: a short account of the main obligations, payments, rights and overall purpose, \
written at a Grade 10 reading level.\n\
2. keyRisks: the 3-5 most significant risks for the user, each with the risk and its likely impact \
in plain words.\n\
3. recommendedActions: concrete next steps that follow from the risks and the content, such as points \
to negotiate, clauses to clarify or related documents to ask for (an NDA, say).";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── legal-lens-summary ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegalLensSummary {
    /// For a lawyer: precise terminology, enforceability and compliance.
    pub professional: String,
    /// For a non-lawyer: obligations in plain English.
    pub layman: String,
    /// Risks and their financial or operational consequences.
    pub risk_summary: String,
}

pub struct LegalLensSummaryFlow;

impl Flow for LegalLensSummaryFlow {
    type Input = DocumentTextInput;
    type Output = LegalLensSummary;

    const NAME: &'static str = "legal-lens-summary";
    const DESCRIPTION: &'static str = "Three summaries of one document: professional, layman and risk-focused.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You are an expert at summarising legal documents. Write three separate summaries of the document \
below, each for a different reader.\n\
\n\
[INPUT]\n\
Document Text: \"{{documentText}}\"\n\
\n\
[INSTRUCTIONS]\n\
1. professional: for a practising lawyer. Use exact legal terminology and cover enforceability, \
compliance, potential liabilities and relevant precedent.\n\
2. layman: for someone without legal training. Use plain English to walk through the key obligations, \
rights and responsibilities.\n\
3. riskSummary: only the clauses that carry financial, operational or legal risk, stating each risk \
and what it could lead to.";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── predict-risk ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictedRisk {
    /// Identifier of the clause, e.g. "C5".
    pub clause_id: String,
    /// Full text of the risky clause.
    pub clause_text: String,
    /// Category such as "Financial", "Liability" or "Compliance".
    pub risk_category: String,
    /// Plain-language explanation of the risk.
    pub risk_description: String,
    /// How the clause could cause problems later on.
    pub predicted_impact: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskRadar {
    pub risks: Vec<PredictedRisk>,
}

pub struct PredictRisk;

impl Flow for PredictRisk {
    type Input = DocumentTextInput;
    type Output = RiskRadar;

    const NAME: &'static str = "predict-risk";
    const DESCRIPTION: &'static str = "Risk radar: categorised risky clauses with predicted future impact.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You are a risk prediction engine for legal documents. Act as a risk radar: read through the legal \
language and point out where the user could run into trouble later.\n\
\n\
[TASK]\n\
Find potential risks, liabilities and unfavourable clauses. For each one, explain it and predict its \
future impact against industry practice, legal benchmarks and common pitfalls.\n\
\n\
[INSTRUCTIONS]\n\
1. Read the whole document for context, then go through it clause by clause.\n\
2. For each clause carrying a potential risk, produce an object with:\n\
- clauseId: an identifier such as \"C1\";\n\
- clauseText: the full clause text;\n\
- riskCategory: e.g. \"Financial\", \"Liability\", \"Compliance\", \"Termination\";\n\
- riskDescription: a short, clear explanation of the risk;\n\
- predictedImpact: specifically how this clause could cause problems in future;\n\
- severity: \"Low\", \"Medium\" or \"High\".\n\
3. When nothing is risky, return an empty risks array.\n\
\n\
[INPUT]\n\
Document Text: \"{{documentText}}\"";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── flag-uncertain-clauses ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UncertainClause {
    /// Identifier of the clause, e.g. "C7".
    pub clause_id: String,
    /// Clarity score from 0 to 100; lower means more ambiguous.
    pub confidence: f64,
    /// Advice to seek legal help when the score is low.
    pub warning: String,
}

pub struct FlagUncertainClauses;

impl Flow for FlagUncertainClauses {
    type Input = DocumentTextInput;
    type Output = Vec<UncertainClause>;

    const NAME: &'static str = "flag-uncertain-clauses";
    const DESCRIPTION: &'static str = "Score ambiguous or vague clauses by clarity and warn where advice is needed.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You find ambiguity and uncertainty in legal text.\n\
\n\
[TASK]\n\
Read the document, find clauses that are ambiguous, vague or badly drafted, and score how clearly \
each of them can be interpreted.\n\
\n\
[INSTRUCTIONS]\n\
1. Split the document into clauses and give each a short ID (C1, C2, ...).\n\
2. Check each clause for undefined terms, subjective wording (\"reasonable\", \"best efforts\") \
and contradictions.\n\
3. For every ambiguous clause, produce an object with:\n\
- clauseId;\n\
- confidence: 0-100, your confidence that the clause is clear (lower means more ambiguous);\n\
- warning: when confidence is below 80, a line such as \"Ambiguous [clause type] clause. Seek legal advice.\"\n\
4. Include only clauses with some uncertainty (confidence below 100). Return an empty array when \
every clause is clear.\n\
\n\
[INPUT]\n\
Document Text: \"{{documentText}}\"";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── compare-to-market ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketComparison {
    /// Identifier of the clause, e.g. "C2".
    pub clause_id: String,
    /// Kind of clause, e.g. "Deposit" or "Notice Period".
    #[serde(rename = "type")]
    pub clause_type: String,
    /// The usual market standard for this kind of clause.
    pub standard: String,
    /// The value or term found in this contract.
    pub contract_value: String,
    /// How the clause deviates from the standard and what that means.
    pub comment: String,
}

pub struct CompareToMarket;

impl Flow for CompareToMarket {
    type Input = DocumentTextInput;
    type Output = Vec<MarketComparison>;

    const NAME: &'static str = "compare-to-market";
    const DESCRIPTION: &'static str = "Compare quantifiable clauses against market norms and flag deviations.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You know the market standards for common contract clauses across industries and jurisdictions.\n\
\n\
[TASK]\n\
Find the clauses in the contract with quantifiable or standard terms and compare them with industry norms.\n\
\n\
[INSTRUCTIONS]\n\
1. Read the whole document for context.\n\
2. Find clauses that have a market rate, term or customary wording (security deposit, notice period, \
liability cap, termination fee and so on).\n\
3. For each, produce an object with:\n\
- clauseId: a short identifier (C1, C2, ...);\n\
- type: the kind of clause, e.g. \"Security Deposit\";\n\
- standard: the market value or range, e.g. \"1-2 months' rent\";\n\
- contractValue: what this contract says, e.g. \"6 months' rent\";\n\
- comment: the deviation and its likely impact, e.g. \"Uncommon, heavily favours the landlord.\"\n\
4. Report material deviations only; standard clauses can be left out.\n\
5. Return an empty array when nothing deviates meaningfully.\n\
\n\
[INPUT]\n\
Document Text: \"{{documentText}}\"";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── track-compliance ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    OneTime,
    Monthly,
    Yearly,
    Recurring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Obligation {
    /// Unique identifier, e.g. "O1".
    pub obligation_id: String,
    pub description: String,
    /// Due date formatted as YYYY-MM-DD.
    pub due_date: String,
    pub frequency: Frequency,
}

pub struct TrackCompliance;

impl Flow for TrackCompliance {
    type Input = DocumentTextInput;
    type Output = Vec<Obligation>;

    const NAME: &'static str = "track-compliance";
    const DESCRIPTION: &'static str = "List obligations with due dates and how often they recur.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You are a compliance assistant. Find every obligation with a deadline in the contract.\n\
\n\
[INSTRUCTIONS]\n\
1. Find the key obligations: payment dates, renewal dates, reporting duties, notice periods and similar.\n\
2. Give each obligation a unique ID.\n\
3. Describe the obligation clearly.\n\
4. Give the due date as YYYY-MM-DD.\n\
5. Set the frequency: one-time, monthly, yearly or recurring.\n\
6. Return the obligations as a JSON array.\n\
\n\
[INPUT]\n\
Document Text: \"{{documentText}}\"";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── check-missing-contracts ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissingContractsInput {
    /// The full text content of the main contract.
    pub main_contract_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContractReason {
    /// Name of the recommended contract.
    pub contract: String,
    /// Why the contract is needed.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissingContracts {
    /// The kind of main contract analysed.
    pub main_contract: String,
    /// Agreements that usually accompany the main one and are missing here.
    pub recommended_additional_contracts: Vec<String>,
    pub reasoning: Vec<ContractReason>,
}

pub struct CheckMissingContracts;

impl Flow for CheckMissingContracts {
    type Input = MissingContractsInput;
    type Output = MissingContracts;

    const NAME: &'static str = "check-missing-contracts";
    const DESCRIPTION: &'static str = "Recommend supporting agreements the main contract usually needs.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You identify the supporting legal documents a primary contract needs.\n\
\n\
[INSTRUCTIONS]\n\
1. Decide what kind of contract this is (\"Employment Agreement\", \"Rental Agreement\", ...).\n\
2. List the agreements that usually go with that kind of contract. For example:\n\
- an Employment Agreement may need an NDA, a Non-compete Agreement or an ESOP Agreement;\n\
- a Rental Agreement may need a Security Deposit Agreement or a Maintenance Agreement;\n\
- a Partnership Agreement may come with a Profit-sharing Agreement or an IP Assignment Agreement.\n\
3. Check whether the main contract already covers what those agreements would.\n\
4. Recommend the additional contracts that are missing or not covered well enough.\n\
5. Give the reason each recommended contract is needed in the reasoning array.\n\
\n\
[INPUT]\n\
Contract Content: \"{{mainContractContent}}\"";

    fn check_input(input: &MissingContractsInput) -> Result<(), String> {
        if input.main_contract_content.trim().is_empty() {
            return Err("mainContractContent must not be empty".into());
        }
        Ok(())
    }
}

// ── suggested-questions ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuggestedQuestions {
    /// Three or four questions a reader might ask about the document.
    pub questions: Vec<String>,
}

pub struct GenerateSuggestedQuestions;

impl Flow for GenerateSuggestedQuestions {
    type Input = DocumentTextInput;
    type Output = SuggestedQuestions;

    const NAME: &'static str = "suggested-questions";
    const DESCRIPTION: &'static str = "Suggest 3-4 questions a reader is likely to ask about the document.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You are a helpful legal assistant. Read the legal document and suggest 3-4 useful questions a reader \
might have about it.\n\
\n\
[INSTRUCTIONS]\n\
1. Read the contract to understand its purpose and main terms.\n\
2. Concentrate on risk, obligations, deadlines and money.\n\
3. Write 3 to 4 different questions in plain language.\n\
4. Prefer questions the document itself can answer.\n\
\n\
[INPUT]\n\
Contract text: \"{documentText}\"";

    fn check_input(input: &DocumentTextInput) -> Result<(), String> {
        require_text(input)
    }
}

// ── role-lens ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleLensInput {
    /// The text content of the legal document.
    pub document_text: String,
    /// The reader's role, e.g. Tenant, Landlord or Employer.
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleLensAnalysis {
    /// Analysis of the document from the point of view of the given role.
    pub personalized_analysis: String,
}

pub struct RoleLens;

impl Flow for RoleLens {
    type Input = RoleLensInput;
    type Output = RoleLensAnalysis;

    const NAME: &'static str = "role-lens";
    const DESCRIPTION: &'static str = "Analyse the document from the perspective of one party's role.";
    const PROMPT: &'static str = "\
You are a legal expert who analyses legal documents for a specific reader.\n\
Analyse the document below from the point of view of the user's role.\n\
\n\
Legal Document: {{{documentText}}}\n\
User Role: {{{role}}}\n\
\n\
Give a detailed analysis that points out the risks, benefits and important clauses for this role. \
Concentrate on the sections that matter most to the role and summarise them for the user.\n\
Keep the analysis well structured and easy to follow, and be specific about the role's situation \
and concerns.";

    fn check_input(input: &RoleLensInput) -> Result<(), String> {
        if input.document_text.trim().is_empty() || input.role.trim().is_empty() {
            return Err("documentText and role must not be empty".into());
        }
        Ok(())
    }
}
