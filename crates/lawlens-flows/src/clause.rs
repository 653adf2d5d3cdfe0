//! Flows that work on a passage rather than a whole analysis: explaining a
//! clause, translating, answering a question and redlining two versions.

use lawlens_core::flow::Flow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn non_empty(fields: &[(&str, &str)]) -> Result<(), String> {
    match fields.iter().find(|(_, v)| v.trim().is_empty()) {
        Some((name, _)) => Err(format!("{name} must not be empty")),
        None => Ok(()),
    }
}

// ── explain-clause ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExplainClauseInput {
    /// The legal clause to explain.
    pub clause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClauseExplanation {
    pub original_clause: String,
    /// As if for a 10-year-old, with an analogy where it helps.
    pub simple_explanation: String,
    /// Longer but still jargon-free.
    pub detailed_explanation: String,
    /// Notice that this is not legal advice.
    pub disclaimer: String,
}

pub struct ExplainClause;

impl Flow for ExplainClause {
    type Input = ExplainClauseInput;
    type Output = ClauseExplanation;

    const NAME: &'static str = "explain-clause";
    const DESCRIPTION: &'static str = "Explain one clause at two reading levels, with a not-legal-advice disclaimer.";
    const PROMPT: &'static str = "\
You explain legal language and are good at making complex things simple. You DO NOT give legal advice.\n\
\n\
[INSTRUCTIONS]\n\
1. Explain the clause at two levels:\n\
- simple_explanation: as if talking to a 10-year-old, in 1-2 short sentences, with an everyday \
analogy or example if it helps;\n\
- detailed_explanation: fuller but entirely jargon-free, for a teenager or an adult who is not a lawyer.\n\
2. Keep the legal meaning of the clause intact while simplifying.\n\
3. Stay neutral, supportive and clear.\n\
4. Add a brief standard disclaimer that this is not legal advice.\n\
\n\
[INPUT]\n\
Clause: \"{{clause}}\"";

    fn check_input(input: &ExplainClauseInput) -> Result<(), String> {
        non_empty(&[("clause", input.clause.as_str())])
    }
}

// ── translate ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranslateInput {
    /// The legal text to translate.
    pub text_to_translate: String,
    /// Target language, e.g. "Hindi".
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Translation {
    pub original_text: String,
    /// The translation, in the target language's native script.
    pub translated_text: String,
    /// English back-translation used to check accuracy.
    pub back_translation: String,
    /// Notes on precision and any loss of legal meaning.
    pub accuracy_notes: String,
}

pub struct Translate;

impl Flow for Translate {
    type Input = TranslateInput;
    type Output = Translation;

    const NAME: &'static str = "translate";
    const DESCRIPTION: &'static str = "Translate legal text with a back-translation and accuracy notes.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You are a multilingual legal assistant. Translate legal advice or documents into the user's language \
without losing meaning, giving both the native script and an English back-translation.\n\
\n\
[INPUT]\n\
Text to translate: \"{text_to_translate}\"\n\
Target Language: \"{target_language}\"\n\
\n\
[INSTRUCTIONS]\n\
1. Translate the text into the target language, in that language's native script.\n\
2. Translate your translation back into English as the back_translation.\n\
3. Judge the accuracy of the translation and note any nuance or legal meaning that may have been lost.";

    fn check_input(input: &TranslateInput) -> Result<(), String> {
        non_empty(&[
            ("text_to_translate", input.text_to_translate.as_str()),
            ("target_language", input.target_language.as_str()),
        ])
    }
}

// ── answer-question ─────────────────────────────────────────────────────

/// Answer given when the contract does not settle the question.
pub const UNCLEAR_ANSWER: &str = "This clause is unclear. Please consult a lawyer.";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerQuestionInput {
    /// The user's question about the contract.
    pub user_question: String,
    /// The full text of the contract.
    pub contract_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContractAnswer {
    pub user_question: String,
    /// Answer based only on the contract text.
    pub answer: String,
    /// The clause supporting the answer; empty when none was found.
    #[serde(rename = "sourceClauseText")]
    pub source_clause_text: String,
}

pub struct AnswerQuestion;

impl Flow for AnswerQuestion {
    type Input = AnswerQuestionInput;
    type Output = ContractAnswer;

    const NAME: &'static str = "answer-question";
    const DESCRIPTION: &'static str = "Answer a question from the contract text alone, citing the source clause.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You answer questions about a contract using ONLY the contract text provided.\n\
\n\
[INPUT]\n\
User question: \"{user_question}\"\n\
Contract text: \"{contract_text}\"\n\
\n\
[INSTRUCTIONS]\n\
1. Look through every clause for the answer.\n\
2. Quote the clause the answer comes from in sourceClauseText.\n\
3. Answer in plain English a 15-year-old would follow.\n\
4. If the answer is unclear, ambiguous or absent from the contract, set answer to \
\"This clause is unclear. Please consult a lawyer.\" and leave sourceClauseText empty.\n\
5. Do not assume or invent anything.";

    fn check_input(input: &AnswerQuestionInput) -> Result<(), String> {
        non_empty(&[
            ("user_question", input.user_question.as_str()),
            ("contract_text", input.contract_text.as_str()),
        ])
    }
}

// ── compare-documents ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareDocumentsInput {
    /// Text of the old version of the contract.
    pub doc_text1: String,
    /// Text of the new version of the contract.
    pub doc_text2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClauseChange {
    /// The kind of clause that changed, e.g. "Termination".
    pub clause_type: String,
    pub old_text: String,
    pub new_text: String,
    /// What changed and what it means, in plain language.
    pub change_impact: String,
}

pub struct CompareDocuments;

impl Flow for CompareDocuments {
    type Input = CompareDocumentsInput;
    type Output = Vec<ClauseChange>;

    const NAME: &'static str = "compare-documents";
    const DESCRIPTION: &'static str = "Redline two versions of a contract and explain each material change.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You compare two versions of the same contract and produce a redline of what changed.\n\
\n\
[TASK]\n\
Find what changed between the two versions and explain the impact of each change.\n\
\n\
[INSTRUCTIONS]\n\
1. Read both versions (old and new) carefully.\n\
2. Work through them clause by clause and find the differences.\n\
3. For each material change, produce an object with:\n\
- clauseType: the kind of clause affected;\n\
- oldText: the relevant text of the old version;\n\
- newText: the corresponding text of the new version;\n\
- changeImpact: the impact in plain language, e.g. \"Gives the tenant less time to vacate, \
a higher risk for the tenant.\"\n\
4. Return an empty array when the versions do not differ.\n\
\n\
[INPUT]\n\
Old Version Text: \"{docText1}\"\n\
New Version Text: \"{docText2}\"";

    fn check_input(input: &CompareDocumentsInput) -> Result<(), String> {
        non_empty(&[("docText1", input.doc_text1.as_str()), ("docText2", input.doc_text2.as_str())])
    }
}
