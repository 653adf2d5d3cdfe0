//! Litigation planning flows: outcome prediction, timelines, cost forecasts
//! and profile-based advice. None of them read a document.

use std::collections::BTreeMap;

use lawlens_core::flow::Flow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── predict-outcome ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictOutcomeInput {
    /// Kind of case, e.g. "Employment Dispute".
    pub case_type: String,
    /// Where the case is filed, e.g. "Bangalore".
    pub jurisdiction: String,
    /// The parties, e.g. "Employee vs. Company".
    pub involved_parties: String,
    /// How strong the user's evidence is.
    pub evidence_strength: String,
    /// Relevant past judgments or precedents.
    pub past_judgments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomePrediction {
    /// Likely outcomes, e.g. "Win", "Lose", "Settlement".
    pub predicted_outcomes: Vec<String>,
    /// Probability percentage for each outcome.
    pub probabilities: BTreeMap<String, f64>,
    pub reasoning: Vec<String>,
    /// The suggested next step.
    pub recommended_action: String,
}

pub struct PredictOutcome;

impl Flow for PredictOutcome {
    type Input = PredictOutcomeInput;
    type Output = OutcomePrediction;

    const NAME: &'static str = "predict-outcome";
    const DESCRIPTION: &'static str = "Estimate case outcomes with probabilities, reasoning and a next step.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You predict legal outcomes from structured case histories, judgments and regional court trends.\n\
\n\
[INPUT DATA]\n\
Case Type: \"{caseType}\"\n\
Jurisdiction: \"{jurisdiction}\"\n\
Involved Parties: \"{involvedParties}\"\n\
Evidence Strength: \"{evidenceStrength}\"\n\
Past Judgments: \"{pastJudgments}\"\n\
\n\
[INSTRUCTIONS]\n\
1. Estimate the likely outcomes (win, lose, settlement, appeal, ...).\n\
2. Give each outcome a probability percentage.\n\
3. Explain each prediction, citing jurisdictional delays, typical rulings and the weight of the evidence.\n\
4. Suggest the best next step, e.g. mediation or litigation.";
}

// ── case-timeline ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseTimelineInput {
    pub case_id: String,
    /// Kind of case, e.g. "Employment Dispute".
    pub case_type: String,
    /// Court or region, e.g. "Bangalore District Court".
    pub jurisdiction: String,
    /// Latest known event, e.g. "Last hearing was July 2025".
    pub last_known_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Milestone {
    pub event: String,
    pub expected_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpectedTimeline {
    pub best_case: String,
    pub average_case: String,
    /// Allowing for likely delays.
    pub worst_case: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoricalPrecedent {
    /// Average duration of similar cases in the same jurisdiction.
    pub similar_cases_in_jurisdiction: String,
    pub fastest_case: String,
    pub longest_case: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseTimeline {
    pub current_stage: String,
    pub context_notes: String,
    pub next_milestones: Vec<Milestone>,
    pub expected_timeline: ExpectedTimeline,
    pub delay_risks: Vec<String>,
    /// What the user can do to speed things up.
    pub acceleration_tips: Vec<String>,
    /// Documents or actions to prepare for the next stage.
    pub required_documents: Vec<String>,
    pub historical_precedent: HistoricalPrecedent,
}

pub struct CaseTimelineFlow;

impl Flow for CaseTimelineFlow {
    type Input = CaseTimelineInput;
    type Output = CaseTimeline;

    const NAME: &'static str = "case-timeline";
    const DESCRIPTION: &'static str = "Project a case's stages, milestones, resolution range and delay risks.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You track the lifecycle of legal cases.\n\
\n\
[INPUT DATA]\n\
Case ID: \"{caseId}\"\n\
Case Type: \"{caseType}\"\n\
Jurisdiction: \"{jurisdiction}\"\n\
Last Known Status: \"{lastKnownStatus}\"\n\
\n\
[INSTRUCTIONS]\n\
From this case profile, build a full case timeline covering:\n\
1. the current stage, with context notes;\n\
2. the upcoming milestones with deadlines and dependencies;\n\
3. the expected resolution time with its uncertainty (best, average and worst case);\n\
4. what could cause delay, and what the user can do to move faster;\n\
5. the documents or actions the user should prepare;\n\
6. how fast similar cases have gone in the same jurisdiction (average, fastest, longest).";
}

// ── cost-forecast ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostForecastInput {
    /// Kind of case, e.g. "Divorce".
    pub case_type: String,
    pub jurisdiction: String,
    /// e.g. "Contested with child custody claim".
    pub complexity: String,
    /// Tier of lawyer, e.g. "mid-tier".
    pub lawyer_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostBreakdown {
    #[serde(rename = "Lawyer_fees")]
    pub lawyer_fees: String,
    #[serde(rename = "Court_fees")]
    pub court_fees: String,
    #[serde(rename = "Documentation")]
    pub documentation: String,
    #[serde(rename = "Travel")]
    pub travel: String,
    #[serde(rename = "Expert_witnesses")]
    pub expert_witnesses: String,
    #[serde(rename = "Miscellaneous")]
    pub miscellaneous: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BillingModel {
    /// e.g. "Mixed (retainer + hourly)".
    #[serde(rename = "type")]
    pub kind: String,
    pub retainer_amount: String,
    pub hourly_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostTip {
    pub tip: String,
    /// "High", "Medium" or "Low".
    pub practicality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostForecast {
    /// Total expected expense range.
    pub estimated_expenses: String,
    pub breakdown: CostBreakdown,
    pub billing_model: BillingModel,
    pub cost_escalators: Vec<String>,
    pub cost_reduction_tips: Vec<CostTip>,
    pub funding_options: Vec<String>,
    pub confidence_level: String,
    pub data_sources: Vec<String>,
}

pub struct CostForecastFlow;

impl Flow for CostForecastFlow {
    type Input = CostForecastInput;
    type Output = CostForecast;

    const NAME: &'static str = "cost-forecast";
    const DESCRIPTION: &'static str = "Forecast litigation cost by category, billing model and funding options.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You advise on the financial side of legal cases.\n\
\n\
[CASE PROFILE]\n\
Case Type: \"{caseType}\"\n\
Jurisdiction: \"{jurisdiction}\"\n\
Complexity: \"{complexity}\"\n\
Lawyer Type: \"{lawyerType}\"\n\
\n\
[INSTRUCTIONS]\n\
From this case profile, produce a detailed cost forecast with:\n\
1. the total expected expense range;\n\
2. a breakdown by category: lawyer fees, court fees, documentation, travel, expert witnesses, miscellaneous;\n\
3. the assumed billing model (hourly, flat fee, retainer);\n\
4. what could push the cost up (appeals, adjournments, delays);\n\
5. ways to reduce cost, each rated High, Medium or Low for practicality;\n\
6. funding or aid options (legal aid, insurance cover, ...);\n\
7. your confidence level and the data sources behind the estimate.";
}

// ── personalize-advice ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizeAdviceInput {
    /// Where the user is, e.g. "Pune".
    pub location: String,
    /// Profession or business type, e.g. "small business owner".
    pub profession: String,
    /// The user's activities and history.
    pub profile_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonalizedAdvice {
    pub personalized_insights: Vec<String>,
    pub region_updates: Vec<String>,
    /// Contract red flags for this profile.
    pub red_flags: Vec<String>,
    /// Insurance, contract changes, preventive filings and the like.
    pub proactive_strategies: Vec<String>,
}

pub struct PersonalizeAdvice;

impl Flow for PersonalizeAdvice {
    type Input = PersonalizeAdviceInput;
    type Output = PersonalizedAdvice;

    const NAME: &'static str = "personalize-advice";
    const DESCRIPTION: &'static str = "Tailored legal insights, regional updates and red flags for a user profile.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You are a personal legal advisor.\n\
\n\
[USER PROFILE]\n\
Location: \"{location}\"\n\
Profession: \"{profession}\"\n\
Profile Summary: \"{profileSummary}\"\n\
\n\
[INSTRUCTIONS]\n\
1. Give personalised legal insights, such as common risks in the user's field or upcoming compliance deadlines.\n\
2. Point out legal updates in the user's region that matter to them.\n\
3. List contract red flags to watch for, tailored to the profile.\n\
4. Suggest proactive legal strategies (insurance, contract changes, preventive filings).";
}
