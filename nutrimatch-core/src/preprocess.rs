//! Query preprocessing: spelling correction and non-food token stripping.
//!
//! Runs before every search so that "Trader Joes jalopeno peppers" becomes
//! "jalapeno peppers". Pure function, no failure mode.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Known misspelling -> canonical spelling, applied token-by-token. Never
/// applied as substrings: "pinto" must not be corrected inside "pintos".
static SPELLING_CORRECTIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("jalopeno", "jalapeno"),
        ("jalepeno", "jalapeno"),
        ("halapeno", "jalapeno"),
        ("brocoli", "broccoli"),
        ("brocolli", "broccoli"),
        ("broccolli", "broccoli"),
        ("avacado", "avocado"),
        ("avocodo", "avocado"),
        ("tomatoe", "tomato"),
        ("potatoe", "potato"),
        ("bananna", "banana"),
        ("zuchini", "zucchini"),
        ("zuccini", "zucchini"),
        ("cillantro", "cilantro"),
        ("cilantro,", "cilantro"),
        ("letuce", "lettuce"),
        ("lettuse", "lettuce"),
        ("spinich", "spinach"),
        ("spinnach", "spinach"),
        ("chiken", "chicken"),
        ("chicken,", "chicken"),
        ("samon", "salmon"),
        ("salmone", "salmon"),
        ("yogurt,", "yogurt"),
        ("yougurt", "yogurt"),
        ("yoghurt", "yogurt"),
        ("mozarella", "mozzarella"),
        ("mozzarela", "mozzarella"),
        ("parmesean", "parmesan"),
        ("parmasan", "parmesan"),
        ("quinao", "quinoa"),
        ("quiona", "quinoa"),
        ("cucmber", "cucumber"),
        ("cucumbr", "cucumber"),
        ("asparagas", "asparagus"),
        ("canteloupe", "cantaloupe"),
        ("rasberry", "raspberry"),
        ("rasberries", "raspberries"),
        ("bluberries", "blueberries"),
        ("strawberrys", "strawberries"),
        ("garbonzo", "garbanzo"),
        ("chick-peas", "chickpeas"),
        ("mayonaise", "mayonnaise"),
        ("worchestershire", "worcestershire"),
        ("worcestshire", "worcestershire"),
    ])
});

/// Retailer, brand, and filler tokens that carry no signal for a
/// food-composition search.
static STRIP_TOKENS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "kroger",
        "walmart",
        "costco",
        "safeway",
        "albertsons",
        "wegmans",
        "publix",
        "aldi",
        "heb",
        "kirkland",
        "organic",
        "natural",
        "premium",
        "fresh",
        "brand",
        "store",
        "generic",
        "signature",
        "select",
        "value",
    ]
});

/// Normalize a raw ingredient description for searching.
///
/// Lowercases, fixes known misspellings token-by-token, then drops
/// retailer/brand/filler tokens. If stripping would leave nothing, the
/// corrected string is returned unstripped; the result is never empty for
/// non-empty input.
pub fn preprocess(raw: &str) -> String {
    let corrected: Vec<String> = raw
        .split_whitespace()
        .map(|token| {
            let lower = token.to_lowercase();
            SPELLING_CORRECTIONS
                .get(lower.as_str())
                .map_or(lower, |fixed| (*fixed).to_string())
        })
        .collect();

    let stripped: Vec<&String> = corrected
        .iter()
        .filter(|token| !STRIP_TOKENS.contains(&token.as_str()))
        .collect();

    if stripped.is_empty() {
        corrected.join(" ")
    } else {
        stripped
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrects_misspellings() {
        assert_eq!(preprocess("jalopeno"), "jalapeno");
        assert_eq!(preprocess("Brocoli florets"), "broccoli florets");
    }

    #[test]
    fn test_correction_is_token_exact_not_substring() {
        // "jalopenos" is not in the dictionary; a substring-based corrector
        // would mangle it
        assert_eq!(preprocess("jalopenos"), "jalopenos");
    }

    #[test]
    fn test_strips_brand_tokens() {
        assert_eq!(preprocess("Kirkland organic chicken breast"), "chicken breast");
        assert_eq!(preprocess("kroger 2% milk"), "2% milk");
    }

    #[test]
    fn test_never_returns_empty() {
        assert_eq!(preprocess("Kirkland"), "kirkland");
        assert_eq!(preprocess("organic premium"), "organic premium");
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(preprocess("Chicken Breast"), "chicken breast");
    }

    #[test]
    fn test_correction_and_strip_compose() {
        assert_eq!(preprocess("Walmart jalopeno peppers"), "jalapeno peppers");
    }
}
