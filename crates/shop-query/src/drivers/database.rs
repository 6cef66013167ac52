//! Relational database driver.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shop_db::{Db, Value};

use crate::catalog::{ModelCatalog, ModelDefinition};
use crate::cursor::Cursor;
use crate::driver::QueryDriver;
use crate::drivers::sql::{Seek, Select};
use crate::error::{DriverResult, QueryError};
use crate::request::{Filters, SearchOptions, SortDirection};
use crate::results::{CursorPage, Page, Record, SimplePage};

/// Largest page the database driver will return.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Next,
    Prev,
}

/// Keyset position carried in a database cursor.
///
/// An inclusive cursor also matches the row holding `key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyCursor {
    key: serde_json::Value,
    dir: Direction,
    #[serde(default)]
    inclusive: bool,
}

/// Queries model tables in SQLite.
///
/// Supports every model name: as the universal fallback it must accept any
/// routed call, and models missing from the catalog fail with
/// [`QueryError::UnknownModel`] when queried.
pub struct DatabaseDriver {
    db: Db,
    catalog: Arc<ModelCatalog>,
}

impl DatabaseDriver {
    /// Create a driver over a database and catalog.
    pub fn new(db: Db, catalog: Arc<ModelCatalog>) -> Self {
        Self { db, catalog }
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Db {
        &self.db
    }

    fn model(&self, model: &str) -> DriverResult<&ModelDefinition> {
        self.catalog.require(model)
    }

    /// Filters, optional free-text term and sort order shared by the paged queries.
    fn base_select<'a>(
        &self,
        model: &'a ModelDefinition,
        filters: &Filters,
        options: &SearchOptions,
    ) -> DriverResult<Select<'a>> {
        let mut select = Select::new(model).filters(filters)?;

        if let Some(term) = options.search_term() {
            let fields = non_empty_or(options.search_fields(), &model.search_fields);
            select = select.text_match(term, &fields)?;
        }

        if let Some(field) = options.sort_by() {
            select = select.order_by(field, options.sort_direction())?;
        }
        Ok(select.order_by_key(SortDirection::Asc))
    }

    async fn fetch(&self, select: &Select<'_>) -> DriverResult<Vec<Record>> {
        let (sql, params) = select.build();
        let result = self.db.query(&sql, &params).await?;
        Ok(result.into_json_objects())
    }

    fn key_cursor(model: &ModelDefinition, record: &Record, dir: Direction) -> DriverResult<Cursor> {
        let key = record.get(&model.primary_key).cloned().ok_or_else(|| {
            QueryError::InvalidCursor(format!(
                "{} rows have no `{}` column",
                model.name, model.primary_key
            ))
        })?;
        Cursor::encode(&KeyCursor {
            key,
            dir,
            inclusive: false,
        })
    }
}

#[async_trait]
impl QueryDriver for DatabaseDriver {
    fn name(&self) -> &str {
        "database"
    }

    fn supports(&self, _model: &str) -> bool {
        true
    }

    async fn paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<Page> {
        let definition = self.model(model)?;
        let per_page = clamp_per_page(per_page);
        let page = options.page();

        let select = self.base_select(definition, filters, options)?;
        let (count_sql, count_params) = select.build_count();
        let total = self
            .db
            .query(&count_sql, &count_params)
            .await?
            .scalar_integer()
            .unwrap_or(0)
            .max(0) as u64;

        let offset = u64::from(page - 1) * u64::from(per_page);
        let items = if offset >= total {
            Vec::new()
        } else {
            self.fetch(&select.limit(u64::from(per_page)).offset(offset))
                .await?
        };

        tracing::debug!(model, total, page, per_page, "database paginate");
        Ok(Page::new(items, total, page, per_page))
    }

    async fn simple_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<SimplePage> {
        let definition = self.model(model)?;
        let per_page = clamp_per_page(per_page);
        let page = options.page();
        let offset = u64::from(page - 1) * u64::from(per_page);

        // One extra row tells us whether another page exists.
        let select = self
            .base_select(definition, filters, options)?
            .limit(u64::from(per_page) + 1)
            .offset(offset);
        let mut items = self.fetch(&select).await?;

        let has_more = items.len() > per_page as usize;
        items.truncate(per_page as usize);
        Ok(SimplePage::new(items, page, per_page, has_more))
    }

    async fn cursor_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
        cursor: Option<&str>,
    ) -> DriverResult<CursorPage> {
        let definition = self.model(model)?;
        let per_page = clamp_per_page(per_page);
        let position = cursor.map(Cursor::decode::<KeyCursor>).transpose()?;

        let mut select = Select::new(definition).filters(filters)?;
        if let Some(term) = options.search_term() {
            let fields = non_empty_or(options.search_fields(), &definition.search_fields);
            select = select.text_match(term, &fields)?;
        }

        let backwards = matches!(position, Some(KeyCursor { dir: Direction::Prev, .. }));
        if let Some(position) = &position {
            let key = Value::try_from(&position.key).map_err(|e| {
                QueryError::InvalidCursor(e.to_string())
            })?;
            let seek = match (backwards, position.inclusive) {
                (false, false) => Seek::After,
                (false, true) => Seek::AtOrAfter,
                (true, false) => Seek::Before,
                (true, true) => Seek::AtOrBefore,
            };
            select = select.seek(seek, key);
        }

        let direction = if backwards {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        let select = select
            .order_by_key(direction)
            .limit(u64::from(per_page) + 1);

        let mut items = self.fetch(&select).await?;
        let more_in_direction = items.len() > per_page as usize;
        items.truncate(per_page as usize);
        if backwards {
            items.reverse();
        }

        let (has_next, has_prev) = if backwards {
            (!items.is_empty(), more_in_direction)
        } else {
            (more_in_direction, position.is_some() && !items.is_empty())
        };

        let mut next_cursor = match items.last() {
            Some(last) if has_next => Some(Self::key_cursor(definition, last, Direction::Next)?),
            _ => None,
        };
        let mut prev_cursor = match items.first() {
            Some(first) if has_prev => Some(Self::key_cursor(definition, first, Direction::Prev)?),
            _ => None,
        };

        // Rows past the cursor may have been deleted; an empty page still
        // leads back to the page the cursor came from.
        if items.is_empty() {
            if let Some(position) = position {
                let dir = if backwards {
                    Direction::Next
                } else {
                    Direction::Prev
                };
                let back = Cursor::encode(&KeyCursor {
                    key: position.key,
                    dir,
                    inclusive: true,
                })?;
                if backwards {
                    next_cursor = Some(back);
                } else {
                    prev_cursor = Some(back);
                }
            }
        }

        Ok(CursorPage::new(items, per_page, next_cursor, prev_cursor))
    }

    async fn search(
        &self,
        model: &str,
        query: &str,
        fields: &[String],
        filters: &Filters,
    ) -> DriverResult<Vec<Record>> {
        let definition = self.model(model)?;
        let fields = non_empty_or(fields.to_vec(), &definition.search_fields);

        let select = Select::new(definition)
            .filters(filters)?
            .text_match(query, &fields)?
            .order_by_key(SortDirection::Asc);
        self.fetch(&select).await
    }

    async fn all(&self, model: &str, filters: &Filters) -> DriverResult<Vec<Record>> {
        let definition = self.model(model)?;
        let select = Select::new(definition)
            .filters(filters)?
            .order_by_key(SortDirection::Asc);
        self.fetch(&select).await
    }
}

fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(1, MAX_PER_PAGE)
}

fn non_empty_or(fields: Vec<String>, defaults: &[String]) -> Vec<String> {
    if fields.is_empty() {
        defaults.to_vec()
    } else {
        fields
    }
}
