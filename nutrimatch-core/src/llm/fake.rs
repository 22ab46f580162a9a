//! Fake LLM provider for testing.
//!
//! Returns deterministic responses based on prompt substring matching, so
//! oracle tests run without network access or API costs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::HashMap;

/// A fake provider matching prompts by registered substring.
#[derive(Debug, Default)]
pub struct FakeProvider {
    /// Map of prompt substring -> response
    responses: HashMap<String, String>,
    /// Returned when no pattern matches
    default_response: Option<String>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider returning `response` for prompts containing `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Set the response used when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in &self.responses {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: no response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
