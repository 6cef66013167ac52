//! Search client error types.

use thiserror::Error;

/// Errors that can occur when talking to the search index.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to send the request.
    #[error("Request failed: {0}")]
    Request(String),

    /// The index answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Failed to parse the response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Invalid client configuration.
    #[error("Invalid search configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_decode() {
            SearchError::Parse(e.to_string())
        } else {
            SearchError::Request(e.to_string())
        }
    }
}
