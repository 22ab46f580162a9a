//! Static reference tables for serving-to-grams conversion.
//!
//! Density multipliers are relative to water (1.0 = water). Item weights are
//! grams per canonical piece. Both tables ship as embedded JSON so the
//! converter keeps working when the reference store is unreachable; the
//! store-backed tables use the same lookup rules via [`find_in_table`].

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

// =============================================================================
// Unit conversion factors
// =============================================================================

pub const GRAMS_PER_OZ: f64 = 28.3495;
pub const GRAMS_PER_LB: f64 = 453.592;
pub const GRAMS_PER_KG: f64 = 1000.0;
pub const GRAMS_PER_MG: f64 = 0.001;

/// Grams of water per unit volume. Multiply by an ingredient's density
/// multiplier to get actual grams.
pub const WATER_GRAMS_PER_ML: f64 = 1.0;
pub const WATER_GRAMS_PER_L: f64 = 1000.0;
pub const WATER_GRAMS_PER_TSP: f64 = 4.92892;
pub const WATER_GRAMS_PER_TBSP: f64 = 14.7868;
pub const WATER_GRAMS_PER_FL_OZ: f64 = 29.5735;
pub const WATER_GRAMS_PER_CUP: f64 = 236.588;
pub const WATER_GRAMS_PER_PINT: f64 = 473.176;
pub const WATER_GRAMS_PER_QUART: f64 = 946.353;
pub const WATER_GRAMS_PER_GALLON: f64 = 3785.41;

/// How a unit converts to grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Fixed mass conversion, independent of the ingredient.
    Weight,
    /// Nominal water-density conversion; needs an ingredient density
    /// multiplier to be accurate.
    Volume,
}

/// Units that count pieces rather than measure mass or volume.
const COUNTABLE_UNITS: &[&str] = &[
    "large", "medium", "small", "whole", "piece", "slice", "clove", "fillet", "breast", "thigh",
    "stalk", "head", "sprig", "can", "container", "scoop", "serving",
];

/// Normalize a unit string for matching: lowercase, trim, drop a plural 's'
/// and trailing periods ("Cups." -> "cup").
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    let unit = unit.trim_end_matches('.');
    // "s" alone is not a unit; don't strip it to empty
    if unit.len() > 1 && unit.ends_with('s') && !unit.ends_with("ss") {
        unit[..unit.len() - 1].to_string()
    } else {
        unit.to_string()
    }
}

/// Look up the grams-per-unit factor for a weight or volume unit.
///
/// Volume factors assume water density; callers apply the ingredient's
/// density multiplier on top.
pub fn base_unit_grams(unit: &str) -> Option<(f64, UnitKind)> {
    let factor = match normalize_unit(unit).as_str() {
        "g" | "gram" | "gm" => (1.0, UnitKind::Weight),
        "kg" | "kilogram" => (GRAMS_PER_KG, UnitKind::Weight),
        "mg" | "milligram" => (GRAMS_PER_MG, UnitKind::Weight),
        "oz" | "ounce" => (GRAMS_PER_OZ, UnitKind::Weight),
        "lb" | "pound" => (GRAMS_PER_LB, UnitKind::Weight),
        "ml" | "milliliter" | "millilitre" => (WATER_GRAMS_PER_ML, UnitKind::Volume),
        "l" | "liter" | "litre" => (WATER_GRAMS_PER_L, UnitKind::Volume),
        "tsp" | "teaspoon" => (WATER_GRAMS_PER_TSP, UnitKind::Volume),
        "tbsp" | "tablespoon" | "tbl" => (WATER_GRAMS_PER_TBSP, UnitKind::Volume),
        "fl oz" | "fluid ounce" => (WATER_GRAMS_PER_FL_OZ, UnitKind::Volume),
        "cup" | "c" => (WATER_GRAMS_PER_CUP, UnitKind::Volume),
        "pint" | "pt" => (WATER_GRAMS_PER_PINT, UnitKind::Volume),
        "quart" | "qt" => (WATER_GRAMS_PER_QUART, UnitKind::Volume),
        "gallon" | "gal" => (WATER_GRAMS_PER_GALLON, UnitKind::Volume),
        _ => return None,
    };
    Some(factor)
}

/// Check whether a unit names a countable piece: the fixed set above, an
/// empty unit ("2 eggs"), or a unit that is itself numeric ("1" in "2 x 1").
pub fn is_countable_unit(unit: &str) -> bool {
    let normalized = normalize_unit(unit);
    if normalized.is_empty() {
        return true;
    }
    if normalized.parse::<f64>().is_ok() {
        return true;
    }
    COUNTABLE_UNITS.contains(&normalized.as_str())
}

// =============================================================================
// Embedded fallback tables
// =============================================================================

static DENSITIES_JSON: &str = include_str!("data/densities.json");
static ITEM_WEIGHTS_JSON: &str = include_str!("data/item_weights.json");

#[derive(Deserialize)]
struct DataFile {
    ingredients: HashMap<String, f64>,
}

static DENSITIES: LazyLock<HashMap<String, f64>> = LazyLock::new(|| {
    let data: DataFile =
        serde_json::from_str(DENSITIES_JSON).expect("densities.json should be valid JSON");
    data.ingredients
});

static ITEM_WEIGHTS: LazyLock<HashMap<String, f64>> = LazyLock::new(|| {
    let data: DataFile =
        serde_json::from_str(ITEM_WEIGHTS_JSON).expect("item_weights.json should be valid JSON");
    data.ingredients
});

/// Embedded density multipliers (relative to water), used when the reference
/// store has never loaded or is unreachable.
pub fn fallback_density_multipliers() -> &'static HashMap<String, f64> {
    &DENSITIES
}

/// Embedded per-item weights in grams.
pub fn fallback_item_weights() -> &'static HashMap<String, f64> {
    &ITEM_WEIGHTS
}

// =============================================================================
// Lookup
// =============================================================================

/// Normalize an ingredient name for table matching.
pub fn normalize_ingredient_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find a value for an ingredient: exact match first, then substring
/// containment in either direction ("boneless chicken breast" matches the
/// "chicken breast" entry, and "egg" matches "eggs, scrambled").
pub fn find_in_table(table: &HashMap<String, f64>, name: &str) -> Option<f64> {
    let normalized = normalize_ingredient_name(name);
    if normalized.is_empty() {
        return None;
    }

    if let Some(&value) = table.get(&normalized) {
        return Some(value);
    }

    // Substring pass: prefer the longest key so "garlic clove" beats "garlic"
    table
        .iter()
        .filter(|(key, _)| normalized.contains(key.as_str()) || key.contains(&normalized))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, &value)| value)
}
