pub mod analyze;
pub mod batch;
pub mod case;
pub mod clause;
pub mod insight;
pub mod parse;

use lawlens_core::flow::{input_schema, output_schema, Flow, FlowError, FlowInvoker};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Registry entry for one flow, as listed by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub output_schema: Value,
}

impl FlowInfo {
    fn of<F: Flow>() -> Self {
        Self {
            name: F::NAME,
            description: F::DESCRIPTION,
            input_schema: input_schema::<F>(),
            output_schema: output_schema::<F>(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunFlowError {
    #[error("no flow named `{0}`")]
    UnknownFlow(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

macro_rules! registry {
    ($($flow:ty),+ $(,)?) => {
        /// Every built-in flow, in catalogue order.
        pub fn all_flows() -> Vec<FlowInfo> {
            vec![$(FlowInfo::of::<$flow>()),+]
        }

        pub fn flow_names() -> Vec<&'static str> {
            vec![$(<$flow as Flow>::NAME),+]
        }

        /// Run a flow by registry name with untyped JSON input and output.
        pub async fn run_flow(invoker: &FlowInvoker, name: &str, input: Value) -> Result<Value, RunFlowError> {
            $(
                if name == <$flow as Flow>::NAME {
                    return Ok(invoker.invoke_json::<$flow>(input).await?);
                }
            )+
            Err(RunFlowError::UnknownFlow(name.to_string()))
        }
    };
}

registry!(
    parse::ParseDocument,
    parse::IdentifyRisks,
    insight::SummarizeDocument,
    insight::LegalLensSummaryFlow,
    insight::PredictRisk,
    insight::FlagUncertainClauses,
    insight::CompareToMarket,
    insight::TrackCompliance,
    insight::CheckMissingContracts,
    insight::GenerateSuggestedQuestions,
    insight::RoleLens,
    clause::ExplainClause,
    clause::Translate,
    clause::AnswerQuestion,
    clause::CompareDocuments,
    case::PredictOutcome,
    case::CaseTimelineFlow,
    case::CostForecastFlow,
    case::PersonalizeAdvice,
    batch::BatchContracts,
);
