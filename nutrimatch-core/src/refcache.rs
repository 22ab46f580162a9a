//! Time-boxed cache of the reference tables.
//!
//! Process-wide shared state, injected where needed rather than reached via a
//! global. Readers take an `Arc` snapshot and never block on a reload; a
//! reload builds a complete replacement table set and swaps the pointer, so a
//! reader sees either the old tables or the new ones, never a partial merge.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::StoreError;
use crate::store::ReferenceStore;

/// How long a loaded snapshot is served before a refresh is attempted.
pub const REFERENCE_TTL: Duration = Duration::from_secs(300);

/// One immutable generation of reference data.
#[derive(Debug)]
pub struct ReferenceTables {
    /// Ingredient name -> density multiplier relative to water.
    pub densities: HashMap<String, f64>,
    /// Ingredient name -> canonical per-item weight in grams.
    pub item_weights: HashMap<String, f64>,
    /// When this snapshot was loaded from the store. `None` for the embedded
    /// fallback tables, which are always considered stale.
    loaded_at: Option<Instant>,
}

impl ReferenceTables {
    /// Embedded fallback tables from `food-reference`.
    fn from_static() -> Self {
        Self {
            densities: food_reference::fallback_density_multipliers().clone(),
            item_weights: food_reference::fallback_item_weights().clone(),
            loaded_at: None,
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at
            .is_some_and(|loaded| loaded.elapsed() < ttl)
    }
}

/// TTL cache over a [`ReferenceStore`], seeded with the embedded tables.
///
/// With no store configured it serves the embedded tables forever. Reload is
/// lazy (triggered by whichever caller finds the snapshot expired) and
/// single-flight: concurrent callers collapse onto one store fetch, the
/// others wait and pick up the result. A failed reload keeps the previous
/// snapshot and is not retried until the TTL elapses again.
pub struct ReferenceCache {
    store: Option<Arc<dyn ReferenceStore>>,
    ttl: Duration,
    snapshot: RwLock<Arc<ReferenceTables>>,
    /// Single-flight guard; holds the time of the last load attempt so a
    /// failing store isn't hammered on every call.
    reload: tokio::sync::Mutex<Option<Instant>>,
}

impl ReferenceCache {
    pub fn new(store: Option<Arc<dyn ReferenceStore>>) -> Self {
        Self::with_ttl(store, REFERENCE_TTL)
    }

    pub fn with_ttl(store: Option<Arc<dyn ReferenceStore>>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: RwLock::new(Arc::new(ReferenceTables::from_static())),
            reload: tokio::sync::Mutex::new(None),
        }
    }

    /// Static-only cache, for callers without a store.
    pub fn without_store() -> Self {
        Self::new(None)
    }

    /// The current snapshot, whatever its age. Never blocks on a reload.
    pub fn current(&self) -> Arc<ReferenceTables> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn swap(&self, tables: Arc<ReferenceTables>) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = tables,
            Err(poisoned) => *poisoned.into_inner() = tables,
        }
    }

    /// The current snapshot, refreshing from the store first if it has
    /// expired.
    pub async fn tables(&self) -> Arc<ReferenceTables> {
        let Some(store) = &self.store else {
            return self.current();
        };

        let snapshot = self.current();
        if snapshot.is_fresh(self.ttl) {
            return snapshot;
        }

        let mut last_attempt = self.reload.lock().await;

        // Double-check: another caller may have finished a reload while we
        // waited on the guard.
        let snapshot = self.current();
        if snapshot.is_fresh(self.ttl) {
            return snapshot;
        }
        if last_attempt.is_some_and(|at| at.elapsed() < self.ttl) {
            // A recent attempt failed; keep serving what we have.
            return snapshot;
        }

        *last_attempt = Some(Instant::now());
        match Self::load(store.as_ref()).await {
            Ok(tables) => {
                tracing::debug!(
                    densities = tables.densities.len(),
                    item_weights = tables.item_weights.len(),
                    "reference tables reloaded"
                );
                let tables = Arc::new(tables);
                self.swap(Arc::clone(&tables));
                tables
            }
            Err(e) => {
                tracing::warn!(error = %e, "reference store reload failed, keeping previous tables");
                snapshot
            }
        }
    }

    /// Load both tables; a snapshot is only swapped in when both loads
    /// succeed.
    async fn load(store: &dyn ReferenceStore) -> Result<ReferenceTables, StoreError> {
        let densities = store.load_density_multipliers().await?;
        let item_weights = store.load_item_weights().await?;
        Ok(ReferenceTables {
            densities,
            item_weights,
            loaded_at: Some(Instant::now()),
        })
    }
}
