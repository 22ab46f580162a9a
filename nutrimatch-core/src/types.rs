//! Core data model for ingredient resolution.

use serde::{Deserialize, Serialize};

/// A single ingredient resolution request. Constructed once per call and
/// discarded after producing a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientQuery {
    /// Raw ingredient name as the caller wrote it ("2% greek yogurt").
    pub name: String,
    /// Serving amount, if the caller knows it. Must be positive to be useful.
    pub serving_size: Option<f64>,
    /// Serving unit ("cup", "oz", "large", ...).
    pub serving_unit: Option<String>,
    /// Optional category tag ("protein", "produce") passed through to the oracle.
    pub category: Option<String>,
    /// Caller's prior calorie estimate for this serving, used only for
    /// sanity-checking the chosen match.
    pub estimated_calories: Option<f64>,
}

impl IngredientQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serving_size: None,
            serving_unit: None,
            category: None,
            estimated_calories: None,
        }
    }

    pub fn with_serving(mut self, size: f64, unit: impl Into<String>) -> Self {
        self.serving_size = Some(size);
        self.serving_unit = Some(unit.into());
        self
    }
}

/// Nutrition per 100 grams, the reference quantity used by food-composition
/// databases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroProfile {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
}

impl MacroProfile {
    /// True when every macro value is zero, the signal that a search result
    /// omitted nutrient data and a detail fetch is worth trying.
    pub fn is_empty(&self) -> bool {
        self.calories == 0.0 && self.protein == 0.0 && self.carbs == 0.0 && self.fat == 0.0
    }
}

/// Database record tiers, ordered from most to least reliable.
/// `Ord` follows declaration order, so `Foundation < SrLegacy` etc.;
/// smaller means preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    /// Laboratory-analyzed reference foods.
    Foundation,
    /// Legacy standard-reference tables.
    SrLegacy,
    /// Survey foods (FNDDS).
    Survey,
    /// User-submitted branded products.
    Branded,
    Unknown,
}

impl DataType {
    pub fn from_api(s: &str) -> Self {
        match s {
            "Foundation" => Self::Foundation,
            "SR Legacy" => Self::SrLegacy,
            "Survey (FNDDS)" => Self::Survey,
            "Branded" => Self::Branded,
            _ => Self::Unknown,
        }
    }
}

/// One result row from the food-composition database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub fdc_id: i64,
    pub description: String,
    pub data_type: DataType,
    pub brand_owner: Option<String>,
    pub macros: MacroProfile,
}

/// A candidate annotated with its fuzzy relevance score in [0, 1].
/// Ephemeral: produced by the reranker and discarded after selection.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: SearchCandidate,
    pub score: f64,
}

/// Suggested change to the caller's serving expression, produced by the
/// oracle when the stated serving looks implausible for the matched food.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServingRecommendation {
    pub serving_size: f64,
    pub serving_unit: String,
    pub rationale: String,
}

/// The externally visible outcome of a resolution. Closed set: callers must
/// handle every variant and must not assume a match exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchResult {
    Matched {
        fdc_id: i64,
        description: String,
        /// Oracle confidence in [0, 1].
        confidence: f64,
        reasoning: String,
        macros: MacroProfile,
        /// Runner-up candidate ids, best first.
        alternatives: Vec<i64>,
        serving_recommendation: Option<ServingRecommendation>,
        /// Set by the oracle, or forced on when the implied calories disagree
        /// with the caller's estimate.
        needs_review: bool,
    },
    NoMatch {
        reason: String,
        best_candidate: Option<SearchCandidate>,
    },
    Error {
        message: String,
    },
}

/// Confidence tag attached to a unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Result of converting a serving expression to grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub grams: f64,
    pub confidence: Confidence,
}
