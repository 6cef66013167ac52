//! Database error types.

use thiserror::Error;

/// Errors that can occur when using the database.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to open the database or acquire a connection.
    #[error("Failed to connect to database: {0}")]
    Connect(String),

    /// Failed to execute a statement.
    #[error("Query execution failed: {0}")]
    Query(String),

    /// Failed to deserialize a row.
    #[error("Deserialization error: {0}")]
    Deserialize(String),

    /// Type conversion error.
    #[error("Type conversion error: {0}")]
    Type(String),

    /// No rows returned when one was expected.
    #[error("No rows returned")]
    NotFound,
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Deserialize(e.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Connect(e.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Type(e.to_string())
            }
            other => DbError::Query(other.to_string()),
        }
    }
}
