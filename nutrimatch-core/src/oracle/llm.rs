//! LLM-backed oracle.

use async_trait::async_trait;

use super::prompt::{parse_decision, render_disambiguation_prompt};
use super::{DisambiguationOracle, OracleDecision};
use crate::error::OracleError;
use crate::llm::{LlmError, LlmProvider};
use crate::types::{IngredientQuery, ScoredCandidate};

/// Oracle that delegates candidate selection to an LLM and parses its
/// structured JSON reply.
pub struct LlmOracle {
    provider: Box<dyn LlmProvider>,
}

impl LlmOracle {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl DisambiguationOracle for LlmOracle {
    async fn disambiguate(
        &self,
        query: &IngredientQuery,
        candidates: &[ScoredCandidate],
    ) -> Result<OracleDecision, OracleError> {
        let prompt = render_disambiguation_prompt(query, candidates);
        tracing::debug!(
            ingredient = %query.name,
            candidates = candidates.len(),
            model = self.provider.model_name(),
            "delegating to disambiguation oracle"
        );

        let response = self.provider.complete(&prompt).await.map_err(|e| match e {
            LlmError::ParseError(msg) => OracleError::ParseError(msg),
            LlmError::NotConfigured(msg) => OracleError::NotConfigured(msg),
            other => OracleError::RequestFailed(other.to_string()),
        })?;

        parse_decision(&response)
    }
}
