//! Query layer error types.

use thiserror::Error;

/// Result type for query operations.
pub type DriverResult<T> = Result<T, QueryError>;

/// Errors that can occur while routing or running a model query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No driver is registered under the requested (or default) name.
    #[error("Query driver not found: {0}")]
    DriverNotFound(String),

    /// Driver names must be non-empty.
    #[error("Query driver name must not be empty")]
    InvalidDriverName,

    /// The model is not in the driver's catalog.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A filter or sort field is not queryable on the model.
    #[error("Field `{field}` is not queryable on {model}")]
    InvalidField { model: String, field: String },

    /// A filter value cannot be expressed by the driver.
    #[error("Invalid filter on `{field}`: {reason}")]
    InvalidFilter { field: String, reason: String },

    /// The cursor token is malformed or does not belong to this driver.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Relational store error.
    #[error(transparent)]
    Database(#[from] shop_db::DbError),

    /// Search index error.
    #[error(transparent)]
    Search(#[from] shop_search::SearchError),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    /// Whether the error came from the routing layer rather than a backend.
    pub fn is_routing_error(&self) -> bool {
        matches!(
            self,
            QueryError::DriverNotFound(_) | QueryError::InvalidDriverName
        )
    }
}
