//! End-to-end ingredient resolution.
//!
//! [`IngredientMatcher`] strings the pipeline together: preprocess the raw
//! name, check the resolved-match cache, search the food database, rerank
//! fuzzily, widen with fallback queries when the results look weak, hand the
//! shortlist to the disambiguation oracle, and sanity-check its pick before
//! returning. Each stage degrades rather than fails: a dead search backend
//! means an empty candidate list, a dead cache means a miss.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::convert::UnitConverter;
use crate::fallback::generate_fallbacks;
use crate::fdc::FoodDataClient;
use crate::nutrition_cache::{cache_key, CachedNutrition, NutritionCache};
use crate::oracle::{DisambiguationOracle, OracleDecision, NO_MATCH_SENTINEL};
use crate::preprocess::preprocess;
use crate::rerank::{score_candidates, SCORE_THRESHOLD};
use crate::types::{IngredientQuery, MacroProfile, MatchResult, ScoredCandidate};

/// Oracle confidence below this is treated as a decline.
pub const MIN_ORACLE_CONFIDENCE: f64 = 0.5;

/// Relative disagreement between implied and estimated calories that forces
/// `needs_review` on.
pub const CALORIE_DEVIATION_LIMIT: f64 = 0.4;

/// Tuning knobs for the matcher. Defaults are the production values.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Results requested per search call.
    pub page_size: u32,
    /// Shortlist size sent to the oracle.
    pub candidate_limit: usize,
    /// Pause between items in [`IngredientMatcher::batch_match`].
    pub batch_delay: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            candidate_limit: 15,
            batch_delay: Duration::from_millis(200),
        }
    }
}

pub struct IngredientMatcher {
    client: Arc<dyn FoodDataClient>,
    oracle: Box<dyn DisambiguationOracle>,
    converter: UnitConverter,
    nutrition_cache: Option<Arc<dyn NutritionCache>>,
    config: MatcherConfig,
}

impl IngredientMatcher {
    pub fn new(
        client: Arc<dyn FoodDataClient>,
        oracle: Box<dyn DisambiguationOracle>,
        converter: UnitConverter,
    ) -> Self {
        Self {
            client,
            oracle,
            converter,
            nutrition_cache: None,
            config: MatcherConfig::default(),
        }
    }

    pub fn with_nutrition_cache(mut self, cache: Arc<dyn NutritionCache>) -> Self {
        self.nutrition_cache = Some(cache);
        self
    }

    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve one ingredient to a food-database match.
    pub async fn find_best_match(&self, query: &IngredientQuery) -> MatchResult {
        let normalized = preprocess(&query.name);
        let key = cache_key(
            &normalized,
            query.serving_size,
            query.serving_unit.as_deref(),
        );

        if let Some(cached) = self.cache_get(&key).await {
            tracing::debug!(name = %query.name, fdc_id = cached.fdc_id, "cache hit");
            // The calorie estimate is not part of the cache key, so the
            // sanity check has to run again; a match flagged on first
            // resolution also stays flagged.
            let needs_review =
                cached.needs_review || self.calories_disagree(query, &normalized, &cached.macros).await;
            return MatchResult::Matched {
                fdc_id: cached.fdc_id,
                description: cached.description,
                confidence: cached.confidence,
                reasoning: "previously resolved".to_string(),
                macros: cached.macros,
                alternatives: Vec::new(),
                serving_recommendation: None,
                needs_review,
            };
        }

        let tokens: Vec<String> = normalized.split_whitespace().map(String::from).collect();
        let results = self.search_lossy(&normalized).await;
        if results.is_empty() {
            tracing::info!(name = %query.name, "no candidates found");
            return MatchResult::NoMatch {
                reason: format!("No food database results for '{normalized}'"),
                best_candidate: None,
            };
        }
        let mut scored = score_candidates(results, &tokens);

        // Weak first pass: widen with drop-one-token fallback queries, then
        // rescore everything against the original tokens.
        let top_score = scored.first().map_or(0.0, |s| s.score);
        if top_score < SCORE_THRESHOLD {
            let merged = self.run_fallbacks(&tokens, scored).await;
            scored = score_candidates(merged.into_iter().map(|s| s.candidate).collect(), &tokens);
        }

        scored.truncate(self.config.candidate_limit);

        let decision = match self.oracle.disambiguate(query, &scored).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(name = %query.name, error = %e, "oracle failed");
                return MatchResult::Error {
                    message: e.to_string(),
                };
            }
        };

        self.interpret(query, &normalized, &key, &scored, decision)
            .await
    }

    /// Resolve a batch in order, pausing between items so a burst of
    /// ingredients does not hammer the oracle. Every input id comes back
    /// paired with its result, one per input regardless of individual
    /// failures.
    pub async fn batch_match(
        &self,
        items: &[(i64, IngredientQuery)],
    ) -> Vec<(i64, MatchResult)> {
        let mut results = Vec::with_capacity(items.len());
        for (i, (id, query)) in items.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }
            results.push((*id, self.find_best_match(query).await));
        }
        results
    }

    async fn interpret(
        &self,
        query: &IngredientQuery,
        normalized: &str,
        key: &str,
        scored: &[ScoredCandidate],
        decision: OracleDecision,
    ) -> MatchResult {
        if decision.chosen_fdc_id == NO_MATCH_SENTINEL
            || decision.confidence < MIN_ORACLE_CONFIDENCE
        {
            return MatchResult::NoMatch {
                reason: decision.reasoning,
                best_candidate: scored.first().map(|s| s.candidate.clone()),
            };
        }

        let Some(chosen) = scored
            .iter()
            .find(|s| s.candidate.fdc_id == decision.chosen_fdc_id)
        else {
            tracing::warn!(
                fdc_id = decision.chosen_fdc_id,
                "oracle chose an id outside the shortlist"
            );
            return MatchResult::NoMatch {
                reason: format!(
                    "Oracle chose unknown candidate {}",
                    decision.chosen_fdc_id
                ),
                best_candidate: scored.first().map(|s| s.candidate.clone()),
            };
        };
        let candidate = &chosen.candidate;

        // Search rows sometimes come back without nutrient data. Try the
        // detail endpoint once before giving up on macros.
        let mut macros = candidate.macros.clone();
        if macros.is_empty() {
            match self.client.get_details(candidate.fdc_id).await {
                Ok(Some(detail)) if !detail.macros.is_empty() => macros = detail.macros,
                Ok(_) => {
                    tracing::debug!(fdc_id = candidate.fdc_id, "detail fetch had no macros")
                }
                Err(e) => {
                    tracing::warn!(fdc_id = candidate.fdc_id, error = %e, "detail fetch failed")
                }
            }
        }

        let needs_review =
            decision.needs_review || self.calories_disagree(query, normalized, &macros).await;

        self.cache_put(
            key,
            &CachedNutrition {
                fdc_id: candidate.fdc_id,
                description: candidate.description.clone(),
                macros: macros.clone(),
                confidence: decision.confidence,
                needs_review,
                resolved_at: Utc::now(),
            },
        )
        .await;

        MatchResult::Matched {
            fdc_id: candidate.fdc_id,
            description: candidate.description.clone(),
            confidence: decision.confidence,
            reasoning: decision.reasoning,
            macros,
            alternatives: decision.alternatives,
            serving_recommendation: decision.serving_recommendation,
            needs_review,
        }
    }

    /// Does the match's implied calorie count deviate from the caller's
    /// estimate by more than the tolerance? False when either side of the
    /// comparison is unavailable.
    async fn calories_disagree(
        &self,
        query: &IngredientQuery,
        normalized: &str,
        macros: &MacroProfile,
    ) -> bool {
        let Some(estimated) = query.estimated_calories.filter(|c| *c > 0.0) else {
            return false;
        };
        let Some(implied) = self.implied_calories(query, normalized, macros).await else {
            return false;
        };
        let deviation = (implied - estimated).abs() / estimated;
        if deviation > CALORIE_DEVIATION_LIMIT {
            tracing::info!(
                name = %query.name,
                implied,
                estimated,
                "calorie estimate disagreement, flagging for review"
            );
            return true;
        }
        false
    }

    /// Calories the match implies for the stated serving, when there is one.
    async fn implied_calories(
        &self,
        query: &IngredientQuery,
        normalized: &str,
        macros: &MacroProfile,
    ) -> Option<f64> {
        let size = query.serving_size?;
        let unit = query.serving_unit.as_deref()?;
        let conversion = self
            .converter
            .convert(&size.to_string(), unit, normalized)
            .await;
        Some(macros.calories * conversion.grams / 100.0)
    }

    async fn search_lossy(&self, query: &str) -> Vec<crate::types::SearchCandidate> {
        match self.client.search(query, self.config.page_size).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(query, error = %e, "search failed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn run_fallbacks(
        &self,
        tokens: &[String],
        scored: Vec<ScoredCandidate>,
    ) -> Vec<ScoredCandidate> {
        let mut merged = scored;
        for fallback in generate_fallbacks(tokens) {
            tracing::debug!(query = %fallback, "trying fallback query");
            for candidate in self.search_lossy(&fallback).await {
                if !merged
                    .iter()
                    .any(|s| s.candidate.fdc_id == candidate.fdc_id)
                {
                    merged.push(ScoredCandidate {
                        candidate,
                        score: 0.0,
                    });
                }
            }
        }
        merged
    }

    async fn cache_get(&self, key: &str) -> Option<CachedNutrition> {
        let cache = self.nutrition_cache.as_ref()?;
        match cache.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "nutrition cache read failed");
                None
            }
        }
    }

    async fn cache_put(&self, key: &str, entry: &CachedNutrition) {
        let Some(cache) = self.nutrition_cache.as_ref() else {
            return;
        };
        if let Err(e) = cache.put(key, entry).await {
            tracing::warn!(key, error = %e, "nutrition cache write failed");
        }
    }
}
