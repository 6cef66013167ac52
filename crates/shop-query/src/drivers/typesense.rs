//! Search index (Typesense) driver.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use shop_search::{SearchBackend, SearchParams, SearchResponse};

use crate::catalog::{is_identifier, ModelCatalog, ModelDefinition};
use crate::cursor::Cursor;
use crate::driver::QueryDriver;
use crate::error::{DriverResult, QueryError};
use crate::request::{scalar_to_string, Filters, SearchOptions};
use crate::results::{CursorPage, Page, Record, SimplePage};

/// Largest page Typesense will serve.
pub const MAX_PER_PAGE: u32 = 250;

/// Page number carried in a search cursor. Typesense has no keyset paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PageCursor {
    page: u32,
}

/// Queries models through their Typesense collections.
///
/// Only catalogued models with a collection are supported; the manager routes
/// everything else to the database driver.
pub struct TypesenseDriver {
    backend: Arc<dyn SearchBackend>,
    catalog: Arc<ModelCatalog>,
}

impl TypesenseDriver {
    /// Create a driver over a search backend and catalog.
    pub fn new(backend: Arc<dyn SearchBackend>, catalog: Arc<ModelCatalog>) -> Self {
        Self { backend, catalog }
    }

    fn collection<'a>(&'a self, model: &str) -> DriverResult<(&'a ModelDefinition, &'a str)> {
        let definition = self.catalog.require(model)?;
        let collection = definition
            .collection
            .as_deref()
            .ok_or_else(|| QueryError::UnknownModel(model.to_string()))?;
        Ok((definition, collection))
    }

    fn paged_params(
        model: &ModelDefinition,
        filters: &Filters,
        options: &SearchOptions,
        page: u32,
        per_page: u32,
    ) -> DriverResult<Option<SearchParams>> {
        let q = options.search_term().unwrap_or("*");
        let mut fields = options.search_fields();
        if fields.is_empty() {
            fields = model.search_fields.clone();
        }
        for field in &fields {
            model.check_field(field)?;
        }

        let Some(filter) = filter_by(model, filters)? else {
            return Ok(None);
        };
        let mut params = SearchParams::new(q)
            .with_query_by(&fields)
            .with_filter_by(filter)
            .with_page(page, per_page);

        if let Some(field) = options.sort_by() {
            model.check_field(field)?;
            params = params.with_sort_by(format!(
                "{}:{}",
                field,
                options.sort_direction().as_str()
            ));
        }

        for (key, value) in options.extra() {
            if let Some(value) = scalar_to_string(value) {
                params = params.with_extra(key.clone(), value);
            }
        }
        Ok(Some(params))
    }

    async fn run(&self, collection: &str, params: &SearchParams) -> DriverResult<SearchResponse> {
        Ok(self.backend.search(collection, params).await?)
    }

    /// Walk every page of a query, keeping hit order.
    async fn collect_all(&self, collection: &str, params: SearchParams) -> DriverResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let params = params.clone().with_page(page, MAX_PER_PAGE);
            let response = self.run(collection, &params).await?;
            let found = response.found;
            let batch = response.into_documents();
            if batch.is_empty() {
                break;
            }
            records.extend(batch);
            if records.len() as u64 >= found {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}

#[async_trait]
impl QueryDriver for TypesenseDriver {
    fn name(&self) -> &str {
        "typesense"
    }

    fn supports(&self, model: &str) -> bool {
        self.catalog
            .get(model)
            .map(ModelDefinition::is_indexed)
            .unwrap_or(false)
    }

    async fn paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<Page> {
        let (definition, collection) = self.collection(model)?;
        let per_page = clamp_per_page(per_page);
        let page = options.page();

        let Some(params) = Self::paged_params(definition, filters, options, page, per_page)? else {
            return Ok(Page::new(Vec::new(), 0, page, per_page));
        };
        let response = self.run(collection, &params).await?;
        let total = response.found;

        tracing::debug!(model, total, page, per_page, "typesense paginate");
        Ok(Page::new(response.into_documents(), total, page, per_page))
    }

    async fn simple_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<SimplePage> {
        let (definition, collection) = self.collection(model)?;
        let per_page = clamp_per_page(per_page);
        let page = options.page();

        let Some(params) = Self::paged_params(definition, filters, options, page, per_page)? else {
            return Ok(SimplePage::new(Vec::new(), page, per_page, false));
        };
        let response = self.run(collection, &params).await?;
        let has_more = response.has_more(per_page);

        Ok(SimplePage::new(response.into_documents(), page, per_page, has_more))
    }

    async fn cursor_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
        cursor: Option<&str>,
    ) -> DriverResult<CursorPage> {
        let (definition, collection) = self.collection(model)?;
        let per_page = clamp_per_page(per_page);
        let page = match cursor {
            Some(token) => Cursor::decode::<PageCursor>(token)?.page.max(1),
            None => 1,
        };

        let Some(params) = Self::paged_params(definition, filters, options, page, per_page)? else {
            return Ok(CursorPage::new(Vec::new(), per_page, None, None));
        };
        let response = self.run(collection, &params).await?;
        let has_more = response.has_more(per_page);
        let items = response.into_documents();

        let next_cursor = if has_more && !items.is_empty() {
            Some(Cursor::encode(&PageCursor { page: page + 1 })?)
        } else {
            None
        };
        let prev_cursor = if page > 1 {
            Some(Cursor::encode(&PageCursor { page: page - 1 })?)
        } else {
            None
        };

        Ok(CursorPage::new(items, per_page, next_cursor, prev_cursor))
    }

    async fn search(
        &self,
        model: &str,
        query: &str,
        fields: &[String],
        filters: &Filters,
    ) -> DriverResult<Vec<Record>> {
        let (definition, collection) = self.collection(model)?;
        let fields: &[String] = if fields.is_empty() {
            &definition.search_fields
        } else {
            fields
        };
        for field in fields {
            definition.check_field(field)?;
        }

        let Some(filter) = filter_by(definition, filters)? else {
            return Ok(Vec::new());
        };
        let q = if query.trim().is_empty() { "*" } else { query.trim() };
        let params = SearchParams::new(q)
            .with_query_by(fields)
            .with_filter_by(filter);
        self.collect_all(collection, params).await
    }

    async fn all(&self, model: &str, filters: &Filters) -> DriverResult<Vec<Record>> {
        let (definition, collection) = self.collection(model)?;
        let Some(filter) = filter_by(definition, filters)? else {
            return Ok(Vec::new());
        };
        let params = SearchParams::match_all()
            .with_query_by(&definition.search_fields)
            .with_filter_by(filter);
        self.collect_all(collection, params).await
    }
}

/// Render filters as a Typesense `filter_by` expression.
///
/// `None` means no document can match: some field must be one of an empty set.
fn filter_by(model: &ModelDefinition, filters: &Filters) -> DriverResult<Option<String>> {
    let mut parts = Vec::with_capacity(filters.len());
    let mut matches_nothing = false;

    for (field, value) in filters.iter() {
        model.check_field(field)?;
        debug_assert!(is_identifier(field));

        let rendered = match value {
            Json::Array(items) if items.is_empty() => {
                matches_nothing = true;
                continue;
            }
            Json::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| filter_value(field, item))
                    .collect::<DriverResult<Vec<_>>>()?;
                format!("[{}]", values.join(","))
            }
            scalar => filter_value(field, scalar)?,
        };
        parts.push(format!("{}:={}", field, rendered));
    }

    if matches_nothing {
        return Ok(None);
    }
    Ok(Some(parts.join(" && ")))
}

fn filter_value(field: &str, value: &Json) -> DriverResult<String> {
    match value {
        Json::String(s) if s.contains('`') => Err(QueryError::InvalidFilter {
            field: field.to_string(),
            reason: "backtick in value".to_string(),
        }),
        Json::String(s) => Ok(format!("`{}`", s)),
        Json::Number(_) | Json::Bool(_) => scalar_to_string(value).ok_or_else(|| {
            QueryError::InvalidFilter {
                field: field.to_string(),
                reason: "unrepresentable value".to_string(),
            }
        }),
        Json::Null => Err(QueryError::InvalidFilter {
            field: field.to_string(),
            reason: "the search index cannot filter on null".to_string(),
        }),
        Json::Array(_) | Json::Object(_) => Err(QueryError::InvalidFilter {
            field: field.to_string(),
            reason: "nested arrays and objects are not supported".to_string(),
        }),
    }
}

fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(1, MAX_PER_PAGE)
}
