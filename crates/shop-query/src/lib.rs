//! Driver-routed model queries for the Shopping domain.
//!
//! This crate routes pagination, search and listing calls for a model to a
//! named query driver:
//!
//! - **database**: SQLite tables, supports every model
//! - **typesense**: Typesense collections, supports indexed models only
//!
//! When the chosen driver does not support a model, the call is served by
//! the `database` driver instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_query::prelude::*;
//!
//! let config = QueryConfig::load("shopping.toml")?;
//! let manager = QueryManager::from_config(&config).await?;
//!
//! let filters = Filters::new().with("status", "active");
//! let options = SearchOptions::new().with_sort("price", SortDirection::Desc);
//!
//! // Served by typesense when it is the default, by database otherwise
//! let page = manager.paginate("Product", &filters, &options, 15, None).await?;
//! println!("{} of {} products", page.len(), page.total);
//!
//! // Address is not indexed, so this always reaches the database
//! let addresses = manager.all("Address", &Filters::new(), Some("typesense")).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod cursor;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod manager;
pub mod request;
pub mod results;

pub use catalog::{ModelCatalog, ModelDefinition};
pub use config::QueryConfig;
pub use cursor::Cursor;
pub use driver::QueryDriver;
pub use drivers::{DatabaseDriver, TypesenseDriver};
pub use error::{DriverResult, QueryError};
pub use manager::{QueryManager, DATABASE_DRIVER, TYPESENSE_DRIVER};
pub use request::{Filters, SearchOptions, SortDirection};
pub use results::{CursorPage, Page, Record, SimplePage};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{ModelCatalog, ModelDefinition};
    pub use crate::config::QueryConfig;
    pub use crate::cursor::Cursor;
    pub use crate::driver::QueryDriver;
    pub use crate::drivers::{DatabaseDriver, TypesenseDriver};
    pub use crate::error::{DriverResult, QueryError};
    pub use crate::manager::{QueryManager, DATABASE_DRIVER, TYPESENSE_DRIVER};
    pub use crate::request::{Filters, SearchOptions, SortDirection};
    pub use crate::results::{CursorPage, Page, Record, SimplePage};
}
