//! Static food reference data for nutrition calculations.
//!
//! This crate provides the data a unit converter needs to turn serving
//! expressions into grams: weight/volume conversion factors, a countable-unit
//! set, and embedded fallback tables of ingredient density multipliers and
//! per-item weights.
//!
//! # Example
//!
//! ```
//! use food_reference::{base_unit_grams, fallback_density_multipliers, find_in_table, UnitKind};
//!
//! let (water_grams, kind) = base_unit_grams("cup").unwrap();
//! assert_eq!(kind, UnitKind::Volume);
//! let multiplier = find_in_table(fallback_density_multipliers(), "honey").unwrap();
//! let grams = 0.5 * water_grams * multiplier;
//! assert!(grams > 150.0);
//! ```

mod tables;

pub use tables::{
    base_unit_grams, fallback_density_multipliers, fallback_item_weights, find_in_table,
    is_countable_unit, normalize_ingredient_name, normalize_unit, UnitKind, GRAMS_PER_KG,
    GRAMS_PER_LB, GRAMS_PER_MG, GRAMS_PER_OZ, WATER_GRAMS_PER_CUP, WATER_GRAMS_PER_FL_OZ,
    WATER_GRAMS_PER_GALLON, WATER_GRAMS_PER_L, WATER_GRAMS_PER_ML, WATER_GRAMS_PER_PINT,
    WATER_GRAMS_PER_QUART, WATER_GRAMS_PER_TBSP, WATER_GRAMS_PER_TSP,
};
