//! Alternate queries for when the initial search scores poorly.
//!
//! Leftover brand or store words that survive preprocessing are the usual
//! culprit, and they tend to sit at the front of the query, so dropping the
//! first token is tried first, by iteration order rather than any explicit
//! re-sort.

/// Maximum number of alternate queries to produce.
pub const MAX_FALLBACKS: usize = 3;

/// Generate up to three fallback queries, each formed by removing exactly one
/// token left to right. Queries with fewer than two tokens get no fallbacks,
/// and any remainder shorter than two characters is skipped.
pub fn generate_fallbacks(tokens: &[String]) -> Vec<String> {
    if tokens.len() < 2 {
        return Vec::new();
    }

    let mut fallbacks = Vec::new();
    for skip in 0..tokens.len() {
        if fallbacks.len() >= MAX_FALLBACKS {
            break;
        }
        let remaining: Vec<&str> = tokens
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, t)| t.as_str())
            .collect();
        let query = remaining.join(" ");
        if query.len() < 2 {
            continue;
        }
        fallbacks.push(query);
    }
    fallbacks
}
