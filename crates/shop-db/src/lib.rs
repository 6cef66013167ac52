//! Async SQLite access layer for the Shopping query drivers.
//!
//! Wraps an `sqlx` SQLite pool behind a small, dynamically typed API so the
//! database query driver can build statements at runtime and hand rows back
//! as JSON records.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_db::{Db, params};
//!
//! let db = Db::connect("sqlite://shopping.db").await?;
//!
//! db.execute(
//!     "INSERT INTO categories (name, slug) VALUES (?, ?)",
//!     params!["Shoes", "shoes"],
//! ).await?;
//!
//! let result = db.query(
//!     "SELECT id, name FROM categories WHERE slug = ?",
//!     params!["shoes"],
//! ).await?;
//! for row in result.iter() {
//!     println!("{:?}", row.get("name"));
//! }
//! ```

mod db;
mod error;
mod types;

pub use db::Db;
pub use error::DbError;
pub use types::{QueryResult, Row, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{params, Db, DbError, QueryResult, Row, Value};
}

/// Create a parameter list for SQL statements.
///
/// # Example
///
/// ```rust,ignore
/// use shop_db::params;
///
/// let params = params!["value1", 42, 3.14];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[]
    };
    ($($param:expr),+ $(,)?) => {
        &[$($crate::Value::from($param)),+]
    };
}
