//! LLM provider abstraction for the disambiguation oracle.
//!
//! The oracle only needs a prompt-in, text-out completion call; this module
//! provides that behind a trait so tests can run on a deterministic fake
//! without network access.

mod claude;
mod fake;

pub use claude::ClaudeProvider;
pub use fake::FakeProvider;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// A text-completion provider. Implementations are stateless and thread-safe.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt and get the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
