use std::collections::BTreeMap;

use lawlens_core::flow::Flow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchContract {
    /// Unique identifier of the contract.
    pub doc_id: String,
    /// Full text of the contract.
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchContractsInput {
    pub contracts: Vec<BatchContract>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommonRisk {
    pub risk: String,
    /// Number of contracts containing this risk.
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateTrends {
    /// Number of contracts per jurisdiction.
    pub jurisdiction: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_contracts: f64,
    pub common_risks: Vec<CommonRisk>,
    pub aggregate_trends: AggregateTrends,
    /// docIds of the riskiest contracts.
    pub highest_risk_contracts: Vec<String>,
}

pub struct BatchContracts;

impl Flow for BatchContracts {
    type Input = BatchContractsInput;
    type Output = PortfolioSummary;

    const NAME: &'static str = "batch-contracts";
    const DESCRIPTION: &'static str = "Portfolio view over many contracts: common risks, jurisdictions, riskiest docs.";
    const PROMPT: &'static str = "\
[ROLE]\n\
You analyse a portfolio of contracts for a small business and report aggregated insights.\n\
\n\
[TASK]\n\
Process the batch of contracts below and produce a dashboard-ready summary of the whole portfolio.\n\
\n\
[INSTRUCTIONS]\n\
1. Analyse every contract in the input array.\n\
2. Count the contracts processed.\n\
3. Find the risks that recur across documents (e.g. \"High penalty late fees\") and count the contracts \
containing each.\n\
4. Count the contracts per jurisdiction mentioned.\n\
5. List the docIds of the contracts with the highest overall risk.\n\
\n\
[INPUT]\n\
Contracts (each with a docId and content): {{{contracts}}}";

    fn check_input(input: &BatchContractsInput) -> Result<(), String> {
        if input.contracts.is_empty() {
            return Err("contracts must not be empty".into());
        }
        Ok(())
    }
}
