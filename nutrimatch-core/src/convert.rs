//! Serving-to-grams conversion.
//!
//! Every conversion produces a result; ambiguity only lowers the confidence
//! tag. The ladder, in order: countable-item weight, direct unit factor
//! (volume units scaled by a density multiplier), item-weight retry for
//! unknown units, and a last-resort 100 g-per-unit guess.

use std::sync::Arc;

use food_reference::{base_unit_grams, find_in_table, is_countable_unit, UnitKind};

use crate::refcache::{ReferenceCache, ReferenceTables};
use crate::types::{Confidence, ConversionResult};

/// Grams assumed per unit when nothing else matches.
const LAST_RESORT_GRAMS: f64 = 100.0;

/// Converts serving expressions to grams using the injected reference cache.
pub struct UnitConverter {
    cache: Arc<ReferenceCache>,
}

impl UnitConverter {
    pub fn new(cache: Arc<ReferenceCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    /// Convert, refreshing the reference tables first if they have expired.
    pub async fn convert(&self, amount: &str, unit: &str, ingredient: &str) -> ConversionResult {
        let tables = self.cache.tables().await;
        convert_with_tables(&tables, amount, unit, ingredient)
    }

    /// Convert against the current snapshot only, for call sites that cannot
    /// await a cache reload.
    pub fn convert_sync(&self, amount: &str, unit: &str, ingredient: &str) -> ConversionResult {
        convert_with_tables(&self.cache.current(), amount, unit, ingredient)
    }
}

fn convert_with_tables(
    tables: &ReferenceTables,
    amount: &str,
    unit: &str,
    ingredient: &str,
) -> ConversionResult {
    let Some(quantity) = parse_amount(amount) else {
        tracing::debug!(amount, unit, ingredient, "unparseable amount, using 100g fallback");
        return ConversionResult {
            grams: LAST_RESORT_GRAMS,
            confidence: Confidence::Low,
        };
    };
    let quantity = quantity.max(0.0);

    // Countable items get their canonical per-piece weight
    if is_countable_unit(unit) {
        if let Some(weight) = find_in_table(&tables.item_weights, ingredient) {
            return ConversionResult {
                grams: quantity * weight,
                confidence: Confidence::High,
            };
        }
    }

    // Direct conversion factor to grams
    if let Some((factor, kind)) = base_unit_grams(unit) {
        return match kind {
            UnitKind::Weight => ConversionResult {
                grams: quantity * factor,
                confidence: Confidence::High,
            },
            UnitKind::Volume => match find_in_table(&tables.densities, ingredient) {
                Some(multiplier) => ConversionResult {
                    grams: quantity * factor * multiplier,
                    confidence: Confidence::High,
                },
                // Default multiplier of 1.0 (water)
                None => ConversionResult {
                    grams: quantity * factor,
                    confidence: Confidence::Medium,
                },
            },
        };
    }

    // Unknown unit: an item weight is still a better guess than nothing
    if let Some(weight) = find_in_table(&tables.item_weights, ingredient) {
        return ConversionResult {
            grams: quantity * weight,
            confidence: Confidence::Medium,
        };
    }

    ConversionResult {
        grams: quantity * LAST_RESORT_GRAMS,
        confidence: Confidence::Low,
    }
}

/// Parse an amount string into a decimal value.
///
/// Handles integers ("8"), decimals ("2.5"), fractions ("1/2"), and mixed
/// numbers ("1 1/2").
pub fn parse_amount(amount: &str) -> Option<f64> {
    let amount = amount.trim();
    if amount.is_empty() {
        return None;
    }

    // Mixed number: "1 1/2"
    let parts: Vec<&str> = amount.split_whitespace().collect();
    if parts.len() == 2 {
        let whole: f64 = parts[0].parse().ok()?;
        let frac = parse_fraction(parts[1])?;
        return Some(whole + frac);
    }

    if amount.contains('/') {
        return parse_fraction(amount);
    }

    amount.parse().ok()
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (num, denom) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let denom: f64 = denom.trim().parse().ok()?;
    if denom == 0.0 {
        return None;
    }
    Some(num / denom)
}
