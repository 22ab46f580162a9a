//! Disambiguation prompt rendering and decision parsing.

use super::OracleDecision;
use crate::error::OracleError;
use crate::types::{IngredientQuery, ScoredCandidate};

/// Render the structured prompt: query context plus enumerated candidates.
pub fn render_disambiguation_prompt(
    query: &IngredientQuery,
    candidates: &[ScoredCandidate],
) -> String {
    let mut context = format!("Ingredient: {}\n", query.name);
    if let (Some(size), Some(unit)) = (query.serving_size, query.serving_unit.as_deref()) {
        context.push_str(&format!("Stated serving: {size} {unit}\n"));
    }
    if let Some(category) = &query.category {
        context.push_str(&format!("Category: {category}\n"));
    }
    if let Some(estimate) = query.estimated_calories {
        context.push_str(&format!("Caller's calorie estimate: {estimate:.0}\n"));
    }

    let mut listing = String::new();
    for scored in candidates {
        let c = &scored.candidate;
        let brand = c
            .brand_owner
            .as_deref()
            .map(|b| format!(" [{b}]"))
            .unwrap_or_default();
        listing.push_str(&format!(
            "- id {}: {}{} ({:?}), per 100g: {:.0} kcal, {:.1}g protein, {:.1}g carbs, {:.1}g fat\n",
            c.fdc_id, c.description, brand, c.data_type,
            c.macros.calories, c.macros.protein, c.macros.carbs, c.macros.fat,
        ));
    }

    format!(
        r#"You are a nutrition database matching assistant. Pick the database entry that best matches the ingredient described below, or decline if none fits.

{context}
Candidates:
{listing}
Rules:
- Prefer generic reference entries over branded products when both fit.
- If the stated serving size/unit is implausible for the chosen food, include a serving_recommendation.
- Set needs_review to true when you are unsure or the candidates are all questionable.
- chosen_fdc_id must be one of the candidate ids, or 0 if nothing matches.

Respond with JSON only, no other text:
{{"chosen_fdc_id": <id or 0>, "confidence": <0.0-1.0>, "reasoning": "<one sentence>", "alternatives": [<ids>], "serving_recommendation": {{"serving_size": <number>, "serving_unit": "<unit>", "rationale": "<why>"}} or null, "needs_review": <true|false>}}"#
    )
}

/// Parse the oracle's JSON decision. Tolerates a Markdown code fence around
/// the JSON; anything else malformed is an error.
pub fn parse_decision(text: &str) -> Result<OracleDecision, OracleError> {
    let stripped = strip_code_fence(text.trim());
    let mut decision: OracleDecision = serde_json::from_str(stripped)
        .map_err(|e| OracleError::ParseError(format!("{e}: {stripped}")))?;
    decision.confidence = decision.confidence.clamp(0.0, 1.0);
    Ok(decision)
}

/// Remove a surrounding ``` or ```json fence if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches('\n');
    rest.strip_suffix("```").map_or(rest, str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, MacroProfile, SearchCandidate};

    fn scored(fdc_id: i64, description: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: SearchCandidate {
                fdc_id,
                description: description.to_string(),
                data_type: DataType::SrLegacy,
                brand_owner: None,
                macros: MacroProfile {
                    calories: 29.0,
                    protein: 0.9,
                    carbs: 6.5,
                    fat: 0.4,
                    fiber: None,
                    sugar: None,
                },
            },
            score,
        }
    }

    #[test]
    fn test_render_includes_context_and_candidates() {
        let query = IngredientQuery {
            name: "jalapeno".to_string(),
            serving_size: Some(2.0),
            serving_unit: Some("medium".to_string()),
            category: Some("produce".to_string()),
            estimated_calories: Some(10.0),
        };
        let prompt = render_disambiguation_prompt(
            &query,
            &[scored(169967, "Peppers, jalapeno, raw", 0.9)],
        );

        assert!(prompt.contains("Ingredient: jalapeno"));
        assert!(prompt.contains("Stated serving: 2 medium"));
        assert!(prompt.contains("Category: produce"));
        assert!(prompt.contains("id 169967"));
        assert!(prompt.contains("chosen_fdc_id"));
    }

    #[test]
    fn test_parse_plain_json() {
        let decision = parse_decision(
            r#"{"chosen_fdc_id": 169967, "confidence": 0.92, "reasoning": "exact match"}"#,
        )
        .unwrap();
        assert_eq!(decision.chosen_fdc_id, 169967);
        assert_eq!(decision.confidence, 0.92);
        assert!(decision.alternatives.is_empty());
        assert!(!decision.needs_review);
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "```json\n{\"chosen_fdc_id\": 5, \"confidence\": 0.7, \"reasoning\": \"ok\"}\n```";
        let decision = parse_decision(text).unwrap();
        assert_eq!(decision.chosen_fdc_id, 5);
    }

    #[test]
    fn test_parse_full_decision() {
        let text = r#"{
            "chosen_fdc_id": 169967,
            "confidence": 0.8,
            "reasoning": "best fit",
            "alternatives": [170000, 170001],
            "serving_recommendation": {"serving_size": 1.0, "serving_unit": "medium", "rationale": "2 cups of peppers is implausible"},
            "needs_review": true
        }"#;
        let decision = parse_decision(text).unwrap();
        assert_eq!(decision.alternatives, vec![170000, 170001]);
        assert!(decision.needs_review);
        let rec = decision.serving_recommendation.unwrap();
        assert_eq!(rec.serving_unit, "medium");
    }

    #[test]
    fn test_parse_malformed_is_error() {
        assert!(parse_decision("I think the answer is jalapeno").is_err());
        assert!(parse_decision(r#"{"chosen_fdc_id": "not a number"}"#).is_err());
    }

    #[test]
    fn test_confidence_clamped() {
        let decision = parse_decision(
            r#"{"chosen_fdc_id": 1, "confidence": 1.7, "reasoning": "overconfident"}"#,
        )
        .unwrap();
        assert_eq!(decision.confidence, 1.0);
    }
}
