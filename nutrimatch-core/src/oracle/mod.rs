//! Disambiguation oracle abstraction.
//!
//! The oracle picks the best candidate among fuzzy-search results. In
//! production that is a hosted language model; behind this narrow trait it
//! can be swapped for the deterministic rule-based implementation in tests or
//! offline runs.

mod llm;
mod prompt;
mod rule_based;

pub use llm::LlmOracle;
pub use prompt::{parse_decision, render_disambiguation_prompt};
pub use rule_based::RuleBasedOracle;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::OracleError;
use crate::llm::{ClaudeProvider, FakeProvider, LlmProvider};
use crate::types::{IngredientQuery, ScoredCandidate, ServingRecommendation};

/// Chosen id meaning "none of these candidates match". FDC ids are positive,
/// so zero is free to act as the sentinel.
pub const NO_MATCH_SENTINEL: i64 = 0;

/// Structured decision returned by the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleDecision {
    /// Chosen candidate id, or [`NO_MATCH_SENTINEL`].
    pub chosen_fdc_id: i64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Free-text reasoning, kept for observability.
    pub reasoning: String,
    /// Runner-up candidate ids, best first.
    #[serde(default)]
    pub alternatives: Vec<i64>,
    /// Suggested serving change when the stated serving looks implausible.
    #[serde(default)]
    pub serving_recommendation: Option<ServingRecommendation>,
    /// The oracle's own flag; the orchestrator forwards it verbatim.
    #[serde(default)]
    pub needs_review: bool,
}

/// Picks the best candidate for a query, or declines.
#[async_trait]
pub trait DisambiguationOracle: Send + Sync {
    async fn disambiguate(
        &self,
        query: &IngredientQuery,
        candidates: &[ScoredCandidate],
    ) -> Result<OracleDecision, OracleError>;
}

/// Build an oracle from environment configuration.
///
/// - `NUTRIMATCH_ORACLE`: "claude" | "rule-based" (default) | "fake"
/// - `ANTHROPIC_API_KEY`: required for "claude"
/// - `NUTRIMATCH_ORACLE_MODEL`: model name (default "claude-3-5-sonnet-20241022")
pub fn create_oracle_from_env() -> Result<Box<dyn DisambiguationOracle>, OracleError> {
    let kind = env::var("NUTRIMATCH_ORACLE").unwrap_or_else(|_| "rule-based".to_string());

    match kind.as_str() {
        "rule-based" => Ok(Box::new(RuleBasedOracle)),
        "claude" => {
            let api_key = env::var("ANTHROPIC_API_KEY")
                .map_err(|_| OracleError::NotConfigured("ANTHROPIC_API_KEY not set".to_string()))?;
            let model = env::var("NUTRIMATCH_ORACLE_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string());
            let provider: Box<dyn LlmProvider> = Box::new(ClaudeProvider::new(api_key, model));
            Ok(Box::new(LlmOracle::new(provider)))
        }
        "fake" => Ok(Box::new(LlmOracle::new(Box::new(
            FakeProvider::new().with_default_response(
                r#"{"chosen_fdc_id": 0, "confidence": 0.0, "reasoning": "fake oracle"}"#,
            ),
        )))),
        other => Err(OracleError::NotConfigured(format!(
            "Unknown oracle: {other}"
        ))),
    }
}
