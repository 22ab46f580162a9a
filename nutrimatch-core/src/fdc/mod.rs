//! Food-composition search client.
//!
//! Wraps the USDA FoodData Central search and detail endpoints behind the
//! [`FoodDataClient`] trait so the pipeline can run against a mock in tests.

mod client;
mod types;

pub use client::FdcClient;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::SearchError;
use crate::types::SearchCandidate;

/// Trait for food-composition database access, enabling mockability in tests.
#[async_trait]
pub trait FoodDataClient: Send + Sync {
    /// Search for candidate foods. A degraded backend (rate limit, server
    /// error) yields an empty list, not an error.
    async fn search(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<SearchCandidate>, SearchError>;

    /// Fetch the full record for one food id. `None` when the id is unknown
    /// or the backend is degraded.
    async fn get_details(&self, fdc_id: i64) -> Result<Option<SearchCandidate>, SearchError>;
}

/// Mock client for testing: canned results keyed by exact query string.
#[derive(Default)]
pub struct MockFoodDataClient {
    searches: HashMap<String, Vec<SearchCandidate>>,
    details: HashMap<i64, SearchCandidate>,
    fail_searches: bool,
}

impl MockFoodDataClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register results for a query. Unregistered queries return no results.
    pub fn with_search(mut self, query: &str, results: Vec<SearchCandidate>) -> Self {
        self.searches.insert(query.to_string(), results);
        self
    }

    /// Register a detail record for an id.
    pub fn with_details(mut self, candidate: SearchCandidate) -> Self {
        self.details.insert(candidate.fdc_id, candidate);
        self
    }

    /// Make every search return a transport error.
    pub fn with_failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }
}

#[async_trait]
impl FoodDataClient for MockFoodDataClient {
    async fn search(
        &self,
        query: &str,
        _page_size: u32,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        if self.fail_searches {
            return Err(SearchError::ParseError("mock transport failure".to_string()));
        }
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }

    async fn get_details(&self, fdc_id: i64) -> Result<Option<SearchCandidate>, SearchError> {
        Ok(self.details.get(&fdc_id).cloned())
    }
}
