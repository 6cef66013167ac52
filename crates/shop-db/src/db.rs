//! Database connection and query execution.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};

use crate::{DbError, QueryResult, Row, Value};

/// Default pool size when none is configured.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQLite database handle.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open a database by URL (e.g. `sqlite://shopping.db`).
    ///
    /// The file is created if it does not exist.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        Self::connect_with(url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Open a database by URL with an explicit pool size.
    pub async fn connect_with(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::Connect(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;

        tracing::debug!(url, max_connections, "opened sqlite pool");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// Uses a single pooled connection that is never recycled, since every
    /// new SQLite memory connection would start from an empty database.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connect(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Execute a SQL statement that doesn't return rows.
    ///
    /// Use this for INSERT, UPDATE, DELETE, CREATE TABLE, etc. Returns the
    /// number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let query = bind_all(sqlx::query(sql), params);
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Execute a SQL query and return raw results.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let result = db.query("SELECT * FROM products WHERE price < ?", params![100.0]).await?;
    /// for row in result.iter() {
    ///     let name = row.get("name").and_then(|v| v.as_text());
    ///     println!("Product: {:?}", name);
    /// }
    /// ```
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        tracing::trace!(sql, params = params.len(), "sqlite query");

        let query = bind_all(sqlx::query(sql), params);
        let sqlite_rows = query.fetch_all(&self.pool).await?;

        let columns: Vec<String> = sqlite_rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = sqlite_rows
            .iter()
            .map(|row| convert_row(row, &columns))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult::new(columns, rows))
    }

    /// Execute a SQL query and deserialize results into a vector.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, DbError> {
        self.query(sql, params).await?.deserialize_all()
    }

    /// Execute a SQL query and return a single row.
    ///
    /// Returns an error if no rows are returned.
    pub async fn query_one<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<T, DbError> {
        let result = self.query(sql, params).await?;
        result.first().ok_or(DbError::NotFound)?.deserialize()
    }

    /// Execute a SQL query and return an optional single row.
    pub async fn query_optional<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, DbError> {
        let result = self.query(sql, params).await?;
        match result.first() {
            Some(row) => Ok(Some(row.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(i) => query.bind(*i),
            Value::Real(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.clone()),
            Value::Blob(b) => query.bind(b.clone()),
        };
    }
    query
}

fn convert_row(row: &SqliteRow, columns: &[String]) -> Result<Row, DbError> {
    let mut values = Vec::with_capacity(columns.len());

    for index in 0..columns.len() {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }

        // SQLite reports the storage class of the value itself, not the
        // declared column type, so expression columns decode correctly.
        let type_name = raw.type_info().name().to_ascii_uppercase();
        let value = match type_name.as_str() {
            "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => {
                Value::Integer(row.try_get_unchecked::<i64, _>(index)?)
            }
            "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                Value::Real(row.try_get_unchecked::<f64, _>(index)?)
            }
            "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
            _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
        };
        values.push(value);
    }

    Ok(Row::new(columns.to_vec(), values))
}
