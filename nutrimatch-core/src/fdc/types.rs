//! Wire schemas for the FoodData Central API.
//!
//! Search responses and detail responses encode nutrients differently: search
//! rows carry a flat numeric `nutrientId` per entry, detail records nest a
//! `nutrient` object keyed by the legacy nutrient `number` string. Both map
//! to the same per-100g [`MacroProfile`]; missing macro entries resolve to 0,
//! missing fiber/sugar to `None`.

use serde::Deserialize;

use crate::types::{DataType, MacroProfile, SearchCandidate};

// Search-schema nutrient ids
const SEARCH_ID_ENERGY: i64 = 1008;
const SEARCH_ID_PROTEIN: i64 = 1003;
const SEARCH_ID_FAT: i64 = 1004;
const SEARCH_ID_CARBS: i64 = 1005;
const SEARCH_ID_FIBER: i64 = 1079;
const SEARCH_ID_SUGAR: i64 = 2000;

// Detail-schema nutrient numbers
const DETAIL_NUM_ENERGY: &str = "208";
const DETAIL_NUM_PROTEIN: &str = "203";
const DETAIL_NUM_FAT: &str = "204";
const DETAIL_NUM_CARBS: &str = "205";
const DETAIL_NUM_FIBER: &str = "291";
const DETAIL_NUM_SUGAR: &str = "269";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFood {
    pub fdc_id: i64,
    pub description: String,
    #[serde(default)]
    pub data_type: String,
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNutrient {
    pub nutrient_id: Option<i64>,
    pub value: Option<f64>,
}

impl SearchFood {
    pub fn into_candidate(self) -> SearchCandidate {
        let find = |id: i64| {
            self.food_nutrients
                .iter()
                .find(|n| n.nutrient_id == Some(id))
                .and_then(|n| n.value)
        };

        let macros = MacroProfile {
            calories: find(SEARCH_ID_ENERGY).unwrap_or(0.0),
            protein: find(SEARCH_ID_PROTEIN).unwrap_or(0.0),
            carbs: find(SEARCH_ID_CARBS).unwrap_or(0.0),
            fat: find(SEARCH_ID_FAT).unwrap_or(0.0),
            fiber: find(SEARCH_ID_FIBER),
            sugar: find(SEARCH_ID_SUGAR),
        };

        SearchCandidate {
            fdc_id: self.fdc_id,
            description: self.description,
            data_type: DataType::from_api(&self.data_type),
            brand_owner: self.brand_owner,
            macros,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailFood {
    pub fdc_id: i64,
    pub description: String,
    #[serde(default)]
    pub data_type: String,
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<DetailNutrient>,
}

#[derive(Debug, Deserialize)]
pub struct DetailNutrient {
    pub nutrient: Option<DetailNutrientRef>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DetailNutrientRef {
    pub number: Option<String>,
}

impl DetailFood {
    pub fn into_candidate(self) -> SearchCandidate {
        let find = |number: &str| {
            self.food_nutrients
                .iter()
                .find(|n| {
                    n.nutrient
                        .as_ref()
                        .and_then(|info| info.number.as_deref())
                        == Some(number)
                })
                .and_then(|n| n.amount)
        };

        let macros = MacroProfile {
            calories: find(DETAIL_NUM_ENERGY).unwrap_or(0.0),
            protein: find(DETAIL_NUM_PROTEIN).unwrap_or(0.0),
            carbs: find(DETAIL_NUM_CARBS).unwrap_or(0.0),
            fat: find(DETAIL_NUM_FAT).unwrap_or(0.0),
            fiber: find(DETAIL_NUM_FIBER),
            sugar: find(DETAIL_NUM_SUGAR),
        };

        SearchCandidate {
            fdc_id: self.fdc_id,
            description: self.description,
            data_type: DataType::from_api(&self.data_type),
            brand_owner: self.brand_owner,
            macros,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_schema_extraction() {
        let json = r#"{
            "foods": [{
                "fdcId": 169967,
                "description": "Peppers, jalapeno, raw",
                "dataType": "SR Legacy",
                "foodNutrients": [
                    {"nutrientId": 1008, "value": 29.0},
                    {"nutrientId": 1003, "value": 0.91},
                    {"nutrientId": 1005, "value": 6.5},
                    {"nutrientId": 1004, "value": 0.37},
                    {"nutrientId": 1079, "value": 2.8}
                ]
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let candidate = response.foods.into_iter().next().unwrap().into_candidate();
        assert_eq!(candidate.fdc_id, 169967);
        assert_eq!(candidate.data_type, DataType::SrLegacy);
        assert_eq!(candidate.macros.calories, 29.0);
        assert_eq!(candidate.macros.fiber, Some(2.8));
        // Sugar absent from the response
        assert_eq!(candidate.macros.sugar, None);
    }

    #[test]
    fn test_search_schema_missing_macros_are_zero() {
        let json = r#"{
            "foods": [{
                "fdcId": 1,
                "description": "Sparse entry",
                "dataType": "Branded",
                "brandOwner": "Acme",
                "foodNutrients": []
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let candidate = response.foods.into_iter().next().unwrap().into_candidate();
        assert!(candidate.macros.is_empty());
        assert_eq!(candidate.macros.fiber, None);
        assert_eq!(candidate.brand_owner.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_detail_schema_extraction() {
        let json = r#"{
            "fdcId": 169967,
            "description": "Peppers, jalapeno, raw",
            "dataType": "SR Legacy",
            "foodNutrients": [
                {"nutrient": {"number": "208"}, "amount": 29.0},
                {"nutrient": {"number": "203"}, "amount": 0.91},
                {"nutrient": {"number": "205"}, "amount": 6.5},
                {"nutrient": {"number": "204"}, "amount": 0.37},
                {"nutrient": {"number": "269"}, "amount": 4.12}
            ]
        }"#;

        let detail: DetailFood = serde_json::from_str(json).unwrap();
        let candidate = detail.into_candidate();
        assert_eq!(candidate.macros.calories, 29.0);
        assert_eq!(candidate.macros.protein, 0.91);
        assert_eq!(candidate.macros.sugar, Some(4.12));
        assert_eq!(candidate.macros.fiber, None);
    }

    #[test]
    fn test_missing_data_type_is_unknown() {
        let json = r#"{"foods": [{"fdcId": 2, "description": "No type"}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let candidate = response.foods.into_iter().next().unwrap().into_candidate();
        assert_eq!(candidate.data_type, DataType::Unknown);
    }
}
