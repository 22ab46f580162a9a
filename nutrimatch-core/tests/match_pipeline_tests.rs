//! End-to-end pipeline tests with a mock food database and a canned oracle.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nutrimatch_core::error::OracleError;
use nutrimatch_core::oracle::NO_MATCH_SENTINEL;
use nutrimatch_core::{
    DataType, DisambiguationOracle, IngredientMatcher, IngredientQuery, MacroProfile, MatchResult,
    MemoryNutritionCache, MockFoodDataClient, OracleDecision, ReferenceCache, ScoredCandidate,
    SearchCandidate, UnitConverter,
};

/// Oracle that always returns the same decision and counts invocations.
struct CannedOracle {
    decision: OracleDecision,
    calls: Arc<AtomicUsize>,
}

impl CannedOracle {
    fn choosing(fdc_id: i64, confidence: f64) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle = Self {
            decision: OracleDecision {
                chosen_fdc_id: fdc_id,
                confidence,
                reasoning: "canned".to_string(),
                alternatives: Vec::new(),
                serving_recommendation: None,
                needs_review: false,
            },
            calls: calls.clone(),
        };
        (oracle, calls)
    }
}

#[async_trait]
impl DisambiguationOracle for CannedOracle {
    async fn disambiguate(
        &self,
        _query: &IngredientQuery,
        _candidates: &[ScoredCandidate],
    ) -> Result<OracleDecision, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.decision.clone())
    }
}

fn candidate(fdc_id: i64, description: &str, calories: f64) -> SearchCandidate {
    SearchCandidate {
        fdc_id,
        description: description.to_string(),
        data_type: DataType::SrLegacy,
        brand_owner: None,
        macros: MacroProfile {
            calories,
            protein: 1.0,
            carbs: 5.0,
            fat: 0.5,
            fiber: None,
            sugar: None,
        },
    }
}

fn matcher(
    client: MockFoodDataClient,
    oracle: impl DisambiguationOracle + 'static,
) -> IngredientMatcher {
    let converter = UnitConverter::new(Arc::new(ReferenceCache::without_store()));
    IngredientMatcher::new(Arc::new(client), Box::new(oracle), converter)
}

#[tokio::test]
async fn test_misspelled_ingredient_resolves_without_fallbacks() {
    // "jalopeno" is corrected before searching, so the mock only answers the
    // corrected query. A strong first-pass match means no fallback searches.
    let client = MockFoodDataClient::new().with_search(
        "jalapeno peppers",
        vec![
            candidate(169967, "Peppers, jalapeno, raw", 29.0),
            candidate(170000, "Peppers, sweet, green, raw", 20.0),
        ],
    );
    let (oracle, _) = CannedOracle::choosing(169967, 0.9);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("jalopeno peppers"))
        .await;

    match result {
        MatchResult::Matched {
            fdc_id,
            description,
            confidence,
            needs_review,
            ..
        } => {
            assert_eq!(fdc_id, 169967);
            assert_eq!(description, "Peppers, jalapeno, raw");
            assert!((confidence - 0.9).abs() < 1e-9);
            assert!(!needs_review);
        }
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_results_skips_oracle() {
    let client = MockFoodDataClient::new();
    let (oracle, calls) = CannedOracle::choosing(1, 0.9);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("xqzzt"))
        .await;

    assert!(matches!(result, MatchResult::NoMatch { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_error_treated_as_no_results() {
    let client = MockFoodDataClient::new().with_failing_searches();
    let (oracle, calls) = CannedOracle::choosing(1, 0.9);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("chicken breast"))
        .await;

    assert!(matches!(result, MatchResult::NoMatch { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sentinel_means_no_match_regardless_of_confidence() {
    let client = MockFoodDataClient::new().with_search(
        "chicken breast",
        vec![candidate(171077, "Chicken, broilers or fryers, breast", 165.0)],
    );
    let (oracle, _) = CannedOracle::choosing(NO_MATCH_SENTINEL, 0.99);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("chicken breast"))
        .await;

    match result {
        MatchResult::NoMatch {
            reason,
            best_candidate,
        } => {
            assert_eq!(reason, "canned");
            assert_eq!(best_candidate.unwrap().fdc_id, 171077);
        }
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_low_confidence_means_no_match() {
    let client = MockFoodDataClient::new().with_search(
        "chicken breast",
        vec![candidate(171077, "Chicken, broilers or fryers, breast", 165.0)],
    );
    let (oracle, _) = CannedOracle::choosing(171077, 0.3);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("chicken breast"))
        .await;

    assert!(matches!(result, MatchResult::NoMatch { .. }));
}

#[tokio::test]
async fn test_calorie_disagreement_forces_review() {
    // 400 kcal/100g and a 100 g serving implies 400 kcal against an estimate
    // of 100 kcal, far past the tolerance.
    let client = MockFoodDataClient::new().with_search(
        "granola",
        vec![candidate(173500, "Granola, homemade", 400.0)],
    );
    let (oracle, _) = CannedOracle::choosing(173500, 0.9);

    let mut query = IngredientQuery::new("granola").with_serving(100.0, "g");
    query.estimated_calories = Some(100.0);

    let result = matcher(client, oracle).find_best_match(&query).await;

    match result {
        MatchResult::Matched { needs_review, .. } => assert!(needs_review),
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_consistent_calories_do_not_force_review() {
    let client = MockFoodDataClient::new().with_search(
        "granola",
        vec![candidate(173500, "Granola, homemade", 400.0)],
    );
    let (oracle, _) = CannedOracle::choosing(173500, 0.9);

    let mut query = IngredientQuery::new("granola").with_serving(100.0, "g");
    query.estimated_calories = Some(390.0);

    let result = matcher(client, oracle).find_best_match(&query).await;

    match result {
        MatchResult::Matched { needs_review, .. } => assert!(!needs_review),
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_macros_trigger_detail_fetch() {
    let mut empty = candidate(748967, "Eggs, Grade A, Large, egg whole", 0.0);
    empty.macros = MacroProfile::default();
    let mut full = empty.clone();
    full.macros = MacroProfile {
        calories: 148.0,
        protein: 12.4,
        carbs: 0.96,
        fat: 9.96,
        fiber: None,
        sugar: None,
    };

    let client = MockFoodDataClient::new()
        .with_search("egg", vec![empty])
        .with_details(full);
    let (oracle, _) = CannedOracle::choosing(748967, 0.9);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("egg"))
        .await;

    match result {
        MatchResult::Matched { macros, .. } => {
            assert!((macros.calories - 148.0).abs() < 1e-9);
        }
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fallback_queries_widen_weak_results() {
    // The full query only finds an irrelevant row; dropping the first token
    // finds the real one.
    let client = MockFoodDataClient::new()
        .with_search(
            "smuckers yogurt parfait",
            vec![candidate(99, "Motor oil, synthetic", 0.0)],
        )
        .with_search(
            "yogurt parfait",
            vec![candidate(170886, "Yogurt, plain, whole milk", 61.0)],
        );
    let (oracle, _) = CannedOracle::choosing(170886, 0.8);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("smuckers yogurt parfait"))
        .await;

    match result {
        MatchResult::Matched { fdc_id, .. } => assert_eq!(fdc_id, 170886),
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_first_pass_skips_fallback_queries() {
    // A fallback query would find yogurt, but zero first-pass results go
    // straight to NoMatch without widening.
    let client = MockFoodDataClient::new().with_search(
        "yogurt",
        vec![candidate(170886, "Yogurt, plain, whole milk", 61.0)],
    );
    let (oracle, calls) = CannedOracle::choosing(170886, 0.9);

    let result = matcher(client, oracle)
        .find_best_match(&IngredientQuery::new("zzz yogurt"))
        .await;

    assert!(matches!(result, MatchResult::NoMatch { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cache_hit_short_circuits_pipeline() {
    let client = MockFoodDataClient::new().with_search(
        "chicken breast",
        vec![candidate(171077, "Chicken, broilers or fryers, breast", 165.0)],
    );
    let (oracle, calls) = CannedOracle::choosing(171077, 0.9);
    let cache = Arc::new(MemoryNutritionCache::new());

    let matcher = matcher(client, oracle).with_nutrition_cache(cache.clone());
    let query = IngredientQuery::new("chicken breast");

    let first = matcher.find_best_match(&query).await;
    assert!(matches!(first, MatchResult::Matched { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    let second = matcher.find_best_match(&query).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    match second {
        MatchResult::Matched {
            fdc_id, reasoning, ..
        } => {
            assert_eq!(fdc_id, 171077);
            assert_eq!(reasoning, "previously resolved");
        }
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cache_hit_keeps_review_flag() {
    // 400 kcal/100g against a 100 kcal estimate flags the first resolution;
    // the repeat query must come back flagged too, not laundered by the
    // cache.
    let client = MockFoodDataClient::new().with_search(
        "granola",
        vec![candidate(173500, "Granola, homemade", 400.0)],
    );
    let (oracle, calls) = CannedOracle::choosing(173500, 0.9);
    let cache = Arc::new(MemoryNutritionCache::new());

    let matcher = matcher(client, oracle).with_nutrition_cache(cache);
    let mut query = IngredientQuery::new("granola").with_serving(100.0, "g");
    query.estimated_calories = Some(100.0);

    let first = matcher.find_best_match(&query).await;
    match first {
        MatchResult::Matched { needs_review, .. } => assert!(needs_review),
        other => panic!("expected Matched, got {other:?}"),
    }

    let second = matcher.find_best_match(&query).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second call should hit the cache");
    match second {
        MatchResult::Matched {
            needs_review,
            reasoning,
            ..
        } => {
            assert_eq!(reasoning, "previously resolved");
            assert!(needs_review);
        }
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cache_hit_rechecks_calorie_estimate() {
    // First resolution has no estimate and caches unflagged; a repeat of the
    // same name and serving with a wildly different estimate re-runs the
    // sanity check against the cached macros.
    let client = MockFoodDataClient::new().with_search(
        "granola",
        vec![candidate(173500, "Granola, homemade", 400.0)],
    );
    let (oracle, _) = CannedOracle::choosing(173500, 0.9);
    let cache = Arc::new(MemoryNutritionCache::new());

    let matcher = matcher(client, oracle).with_nutrition_cache(cache);
    let query = IngredientQuery::new("granola").with_serving(100.0, "g");

    let first = matcher.find_best_match(&query).await;
    match first {
        MatchResult::Matched { needs_review, .. } => assert!(!needs_review),
        other => panic!("expected Matched, got {other:?}"),
    }

    let mut with_estimate = query.clone();
    with_estimate.estimated_calories = Some(100.0);
    let second = matcher.find_best_match(&with_estimate).await;
    match second {
        MatchResult::Matched {
            needs_review,
            reasoning,
            ..
        } => {
            assert_eq!(reasoning, "previously resolved");
            assert!(needs_review);
        }
        other => panic!("expected Matched, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_preserves_order() {
    let client = MockFoodDataClient::new()
        .with_search("apple", vec![candidate(1, "Apples, raw", 52.0)])
        .with_search("banana", vec![candidate(2, "Bananas, raw", 89.0)]);
    let (oracle, calls) = CannedOracle::choosing(1, 0.9);

    // The canned oracle picks id 1, which only exists for the apple query;
    // banana resolves to NoMatch. Ids come back paired, in input order.
    let results = matcher(client, oracle)
        .batch_match(&[
            (11, IngredientQuery::new("apple")),
            (22, IngredientQuery::new("banana")),
            (33, IngredientQuery::new("nothing here")),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![11, 22, 33]
    );
    assert!(matches!(
        results[0].1,
        MatchResult::Matched { fdc_id: 1, .. }
    ));
    assert!(matches!(results[1].1, MatchResult::NoMatch { .. }));
    assert!(matches!(results[2].1, MatchResult::NoMatch { .. }));
    // Oracle ran for the two queries that produced candidates.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
