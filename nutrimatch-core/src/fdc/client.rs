//! reqwest-backed FoodData Central client.

use async_trait::async_trait;
use std::env;
use std::time::Duration;

use super::types::{DetailFood, SearchResponse};
use super::FoodDataClient;
use crate::error::SearchError;
use crate::types::SearchCandidate;

const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the USDA FoodData Central API.
pub struct FdcClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FdcClient {
    /// Create a client with the given API key.
    pub fn new(api_key: String) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a client from the `FDC_API_KEY` environment variable.
    /// USDA issues free keys; `DEMO_KEY` works at a reduced rate limit.
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key = env::var("FDC_API_KEY").unwrap_or_else(|_| "DEMO_KEY".to_string());
        Self::new(api_key)
    }

    /// Override the API base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Append the prefix-match wildcard unless the caller already did.
fn ensure_wildcard(query: &str) -> String {
    if query.ends_with('*') {
        query.to_string()
    } else {
        format!("{query}*")
    }
}

#[async_trait]
impl FoodDataClient for FdcClient {
    async fn search(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let wildcard_query = ensure_wildcard(query);
        let url = format!("{}/foods/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", wildcard_query.as_str()),
                ("pageSize", &page_size.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            tracing::warn!(query, "food search rate limited, returning no candidates");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            tracing::warn!(query, status = %status, "food search failed, returning no candidates");
            return Ok(Vec::new());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        tracing::debug!(query, results = body.foods.len(), "food search completed");
        Ok(body
            .foods
            .into_iter()
            .map(|food| food.into_candidate())
            .collect())
    }

    async fn get_details(&self, fdc_id: i64) -> Result<Option<SearchCandidate>, SearchError> {
        let url = format!("{}/food/{fdc_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(fdc_id, status = %status, "detail fetch failed");
            return Ok(None);
        }

        let detail: DetailFood = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        Ok(Some(detail.into_candidate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_appended() {
        assert_eq!(ensure_wildcard("chicken"), "chicken*");
    }

    #[test]
    fn test_wildcard_not_duplicated() {
        assert_eq!(ensure_wildcard("chicken*"), "chicken*");
    }
}
