//! Persisted cache of resolved ingredient -> nutrition mappings.
//!
//! Keyed by normalized name plus serving size/unit so "2 cups rice" and
//! "1 oz rice" cache independently (the serving context can change which
//! database entry the oracle picks). Cache failures are logged and treated as
//! misses; they never fail a match.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Double, Text, Timestamptz};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::DbPool;
use crate::types::MacroProfile;

/// A previously resolved match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedNutrition {
    pub fdc_id: i64,
    pub description: String,
    pub macros: MacroProfile,
    pub confidence: f64,
    /// Carried through to repeat lookups; a match flagged for review stays
    /// flagged when served from the cache.
    pub needs_review: bool,
    pub resolved_at: DateTime<Utc>,
}

/// Build the cache key from the normalized name and serving expression.
pub fn cache_key(name: &str, serving_size: Option<f64>, serving_unit: Option<&str>) -> String {
    let name = name.trim().to_lowercase();
    let size = serving_size.map_or_else(|| "-".to_string(), |s| s.to_string());
    let unit = serving_unit.map_or_else(String::new, |u| u.trim().to_lowercase());
    format!("{name}|{size}|{unit}")
}

/// Keyed storage for resolved matches.
#[async_trait]
pub trait NutritionCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachedNutrition>, StoreError>;
    async fn put(&self, key: &str, entry: &CachedNutrition) -> Result<(), StoreError>;
}

/// In-memory cache for tests and storeless runs.
#[derive(Default)]
pub struct MemoryNutritionCache {
    entries: DashMap<String, CachedNutrition>,
}

impl MemoryNutritionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl NutritionCache for MemoryNutritionCache {
    async fn get(&self, key: &str) -> Result<Option<CachedNutrition>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn put(&self, key: &str, entry: &CachedNutrition) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), entry.clone());
        Ok(())
    }
}

#[derive(QueryableByName)]
struct ResolvedRow {
    #[diesel(sql_type = BigInt)]
    fdc_id: i64,
    #[diesel(sql_type = Text)]
    description: String,
    #[diesel(sql_type = Text)]
    macros: String,
    #[diesel(sql_type = Double)]
    confidence: f64,
    #[diesel(sql_type = Bool)]
    needs_review: bool,
    #[diesel(sql_type = Timestamptz)]
    resolved_at: DateTime<Utc>,
}

// Static SQL; the cache key and payload are always passed via bind().
const GET_QUERY: &str = "SELECT fdc_id, description, macros, confidence, needs_review, resolved_at \
    FROM resolved_nutrition WHERE cache_key = $1";
const PUT_QUERY: &str = "INSERT INTO resolved_nutrition \
    (cache_key, fdc_id, description, macros, confidence, needs_review, resolved_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7) \
    ON CONFLICT (cache_key) DO UPDATE SET \
    fdc_id = EXCLUDED.fdc_id, description = EXCLUDED.description, \
    macros = EXCLUDED.macros, confidence = EXCLUDED.confidence, \
    needs_review = EXCLUDED.needs_review, resolved_at = EXCLUDED.resolved_at";

/// Postgres-backed cache.
pub struct PgNutritionCache {
    pool: DbPool,
}

impl PgNutritionCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NutritionCache for PgNutritionCache {
    async fn get(&self, key: &str) -> Result<Option<CachedNutrition>, StoreError> {
        let pool = self.pool.clone();
        let key = key.to_string();
        let row = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
            diesel::sql_query(GET_QUERY)
                .bind::<Text, _>(&key)
                .load::<ResolvedRow>(&mut conn)
                .map(|mut rows| rows.pop())
                .map_err(|e| StoreError::QueryFailed(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::QueryFailed(format!("blocking task failed: {e}")))??;

        let Some(row) = row else {
            return Ok(None);
        };
        let macros: MacroProfile = serde_json::from_str(&row.macros)
            .map_err(|e| StoreError::QueryFailed(format!("bad cached macros: {e}")))?;
        Ok(Some(CachedNutrition {
            fdc_id: row.fdc_id,
            description: row.description,
            macros,
            confidence: row.confidence,
            needs_review: row.needs_review,
            resolved_at: row.resolved_at,
        }))
    }

    async fn put(&self, key: &str, entry: &CachedNutrition) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        let key = key.to_string();
        let macros_json = serde_json::to_string(&entry.macros)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
            diesel::sql_query(PUT_QUERY)
                .bind::<Text, _>(&key)
                .bind::<BigInt, _>(entry.fdc_id)
                .bind::<Text, _>(&entry.description)
                .bind::<Text, _>(&macros_json)
                .bind::<Double, _>(entry.confidence)
                .bind::<Bool, _>(entry.needs_review)
                .bind::<Timestamptz, _>(entry.resolved_at)
                .execute(&mut conn)
                .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|e| StoreError::QueryFailed(format!("blocking task failed: {e}")))??;
        Ok(())
    }
}
