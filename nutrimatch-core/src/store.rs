//! Reference-data store access.
//!
//! The density-multiplier and item-weight tables live in Postgres so they can
//! be curated without a redeploy. The store is strictly best-effort: the
//! converter falls back to the embedded `food-reference` tables whenever it
//! is absent or unreachable.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{Double, Text};
use std::collections::HashMap;

use crate::error::StoreError;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool for the given database URL.
pub fn create_pool(database_url: &str) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder()
        .build(manager)
        .map_err(|e| StoreError::ConnectionFailed(e.to_string()))
}

/// Read access to the two reference tables. Implementations return complete
/// snapshots; the cache never merges partial loads.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Ingredient name -> density multiplier relative to water.
    async fn load_density_multipliers(&self) -> Result<HashMap<String, f64>, StoreError>;

    /// Ingredient name -> canonical per-item weight in grams.
    async fn load_item_weights(&self) -> Result<HashMap<String, f64>, StoreError>;
}

/// Row shape shared by both reference queries.
#[derive(QueryableByName)]
struct NamedValueRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Double)]
    value: f64,
}

// Static SQL, no user input. Raw queries keep this crate free of a generated
// schema for two trivially shaped tables.
const DENSITY_QUERY: &str =
    "SELECT name, multiplier AS value FROM ingredient_densities";
const ITEM_WEIGHT_QUERY: &str =
    "SELECT name, grams AS value FROM ingredient_item_weights";

/// Postgres-backed reference store.
pub struct PgReferenceStore {
    pool: DbPool,
}

impl PgReferenceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run a name/value query on a blocking thread (diesel is synchronous).
    async fn load_named_values(&self, query: &'static str) -> Result<HashMap<String, f64>, StoreError> {
        let pool = self.pool.clone();
        let rows = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
            diesel::sql_query(query)
                .load::<NamedValueRow>(&mut conn)
                .map_err(|e| StoreError::QueryFailed(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::QueryFailed(format!("blocking task failed: {e}")))??;

        Ok(rows
            .into_iter()
            .map(|row| (row.name.to_lowercase(), row.value))
            .collect())
    }
}

#[async_trait]
impl ReferenceStore for PgReferenceStore {
    async fn load_density_multipliers(&self) -> Result<HashMap<String, f64>, StoreError> {
        self.load_named_values(DENSITY_QUERY).await
    }

    async fn load_item_weights(&self) -> Result<HashMap<String, f64>, StoreError> {
        self.load_named_values(ITEM_WEIGHT_QUERY).await
    }
}
