//! The query driver contract.

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::request::{Filters, SearchOptions};
use crate::results::{CursorPage, Page, Record, SimplePage};

/// A backing-store specific implementation of model queries.
///
/// `supports` is consulted on every routed call, so it must be cheap and
/// must not change its answer for a model during the life of the process.
#[async_trait]
pub trait QueryDriver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this driver can serve queries for `model`.
    fn supports(&self, model: &str) -> bool;

    /// A page of results with a total count.
    async fn paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<Page>;

    /// A page of results without a total count.
    async fn simple_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<SimplePage>;

    /// A page of results addressed by an opaque cursor.
    async fn cursor_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
        cursor: Option<&str>,
    ) -> DriverResult<CursorPage>;

    /// Free-text matches for `query` over `fields`, in match order.
    async fn search(
        &self,
        model: &str,
        query: &str,
        fields: &[String],
        filters: &Filters,
    ) -> DriverResult<Vec<Record>>;

    /// Every record matching `filters`.
    async fn all(&self, model: &str, filters: &Filters) -> DriverResult<Vec<Record>>;
}
