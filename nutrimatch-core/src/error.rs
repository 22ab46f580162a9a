use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse oracle decision: {0}")]
    ParseError(String),

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}
