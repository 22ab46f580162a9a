//! Fuzzy reranking of search results against the preprocessed query.
//!
//! External search engines order by their own relevance; this module re-sorts
//! candidates with a deterministic token-overlap + Jaro-Winkler blend so the
//! oracle sees our idea of relevance, not the API's.

use crate::types::{ScoredCandidate, SearchCandidate};
use std::cmp::Ordering;

/// Below this top score the orchestrator treats results as poor and tries
/// fallback queries. Tunable, not load-bearing.
pub const SCORE_THRESHOLD: f64 = 0.4;

/// A query token counts as matched when it is contained in (or contains) a
/// description token, or the two are this similar. Tunable.
pub const TOKEN_MATCH_THRESHOLD: f64 = 0.85;

const TOKEN_OVERLAP_WEIGHT: f64 = 0.7;
const FULL_STRING_WEIGHT: f64 = 0.3;

/// Standard Jaro similarity over characters.
///
/// Matching window is floor(max(len1, len2) / 2) - 1 (clamped at zero);
/// transposition count is the number of matched characters out of sequence,
/// halved.
pub fn jaro(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, &ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && ca == b[j] {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Count transpositions across the matched characters
    let mut transposed = 0usize;
    let mut j = 0usize;
    for (i, &ca) in a.iter().enumerate() {
        if a_matched[i] {
            while !b_matched[j] {
                j += 1;
            }
            if ca != b[j] {
                transposed += 1;
            }
            j += 1;
        }
    }

    let m = matches as f64;
    let t = (transposed / 2) as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro-Winkler: Jaro plus a prefix bonus of `prefix * 0.1 * (1 - jaro)` for
/// up to 4 shared leading characters.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let base = jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(4)
        .take_while(|(ca, cb)| ca == cb)
        .count();
    base + prefix as f64 * 0.1 * (1.0 - base)
}

/// Does a query token have a fuzzy match against any description token?
fn token_has_match(query_token: &str, description_tokens: &[&str]) -> bool {
    description_tokens.iter().any(|desc| {
        desc.contains(query_token)
            || query_token.contains(desc)
            || jaro_winkler(query_token, desc) > TOKEN_MATCH_THRESHOLD
    })
}

/// Score candidates against the query tokens and sort best-first.
///
/// Score = 0.7 * (fraction of query tokens fuzzily matched) + 0.3 *
/// Jaro-Winkler(full query, full description). Pure function of its inputs;
/// ties break by data-type preference then id so the ordering is stable
/// across runs.
pub fn score_candidates(
    candidates: Vec<SearchCandidate>,
    query_tokens: &[String],
) -> Vec<ScoredCandidate> {
    let query_full = query_tokens.join(" ");

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let description = candidate.description.to_lowercase();
            let description_tokens: Vec<&str> = description.split_whitespace().collect();

            let overlap = if query_tokens.is_empty() {
                0.0
            } else {
                let matched = query_tokens
                    .iter()
                    .filter(|token| token_has_match(token, &description_tokens))
                    .count();
                matched as f64 / query_tokens.len() as f64
            };

            let full = jaro_winkler(&query_full, &description);
            let score = TOKEN_OVERLAP_WEIGHT * overlap + FULL_STRING_WEIGHT * full;
            ScoredCandidate { candidate, score }
        })
        .collect();

    scored.sort_by(|left, right| {
        right
            .score
            .partial_cmp(&left.score)
            .unwrap_or(Ordering::Equal)
            .then(left.candidate.data_type.cmp(&right.candidate.data_type))
            .then(left.candidate.fdc_id.cmp(&right.candidate.fdc_id))
    });
    scored
}
