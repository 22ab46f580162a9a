pub mod convert;
pub mod error;
pub mod fallback;
pub mod fdc;
pub mod llm;
pub mod matcher;
pub mod nutrition_cache;
pub mod oracle;
pub mod preprocess;
pub mod refcache;
pub mod rerank;
pub mod store;
pub mod types;

pub use convert::UnitConverter;
pub use error::{OracleError, SearchError, StoreError};
pub use fdc::{FdcClient, FoodDataClient, MockFoodDataClient};
pub use matcher::{IngredientMatcher, MatcherConfig};
pub use nutrition_cache::{
    cache_key, CachedNutrition, MemoryNutritionCache, NutritionCache, PgNutritionCache,
};
pub use oracle::{
    create_oracle_from_env, DisambiguationOracle, LlmOracle, OracleDecision, RuleBasedOracle,
    NO_MATCH_SENTINEL,
};
pub use refcache::{ReferenceCache, ReferenceTables};
pub use store::{create_pool, DbPool, PgReferenceStore, ReferenceStore};
pub use types::{
    Confidence, ConversionResult, DataType, IngredientQuery, MacroProfile, MatchResult,
    ScoredCandidate, SearchCandidate, ServingRecommendation,
};
