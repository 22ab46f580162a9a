//! Deterministic rule-based oracle.
//!
//! Used in tests and offline runs: takes the top-scoring candidate, breaking
//! near-ties by data-type preference, with the fuzzy score standing in for
//! confidence.

use async_trait::async_trait;

use super::{DisambiguationOracle, OracleDecision, NO_MATCH_SENTINEL};
use crate::error::OracleError;
use crate::rerank::SCORE_THRESHOLD;
use crate::types::{IngredientQuery, ScoredCandidate};

/// Candidates within this score distance of the top are considered tied and
/// decided by data-type preference.
const TIE_BAND: f64 = 0.05;

pub struct RuleBasedOracle;

#[async_trait]
impl DisambiguationOracle for RuleBasedOracle {
    async fn disambiguate(
        &self,
        _query: &IngredientQuery,
        candidates: &[ScoredCandidate],
    ) -> Result<OracleDecision, OracleError> {
        let Some(top) = candidates.first() else {
            return Ok(OracleDecision {
                chosen_fdc_id: NO_MATCH_SENTINEL,
                confidence: 0.0,
                reasoning: "no candidates to choose from".to_string(),
                alternatives: Vec::new(),
                serving_recommendation: None,
                needs_review: false,
            });
        };

        if top.score < SCORE_THRESHOLD {
            return Ok(OracleDecision {
                chosen_fdc_id: NO_MATCH_SENTINEL,
                confidence: top.score,
                reasoning: format!(
                    "best candidate {:?} scored {:.2}, below the match threshold",
                    top.candidate.description, top.score
                ),
                alternatives: Vec::new(),
                serving_recommendation: None,
                needs_review: false,
            });
        }

        // Among near-ties, prefer the more reliable data tier
        let chosen = candidates
            .iter()
            .take_while(|c| top.score - c.score <= TIE_BAND)
            .min_by_key(|c| c.candidate.data_type)
            .unwrap_or(top);

        let alternatives = candidates
            .iter()
            .filter(|c| c.candidate.fdc_id != chosen.candidate.fdc_id)
            .take(3)
            .map(|c| c.candidate.fdc_id)
            .collect();

        Ok(OracleDecision {
            chosen_fdc_id: chosen.candidate.fdc_id,
            confidence: chosen.score.clamp(0.0, 1.0),
            reasoning: format!(
                "top fuzzy match ({:.2}): {}",
                chosen.score, chosen.candidate.description
            ),
            alternatives,
            serving_recommendation: None,
            needs_review: false,
        })
    }
}
