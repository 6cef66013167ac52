//! Query driver implementations.

mod database;
mod sql;
mod typesense;

pub use database::DatabaseDriver;
pub use typesense::TypesenseDriver;
