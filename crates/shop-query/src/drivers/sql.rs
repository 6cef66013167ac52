//! SQL statement builder for model queries.

use serde_json::Value as Json;
use shop_db::Value;

use crate::catalog::ModelDefinition;
use crate::error::{DriverResult, QueryError};
use crate::request::{Filters, SortDirection};

/// Keyset comparison for cursor pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Seek {
    After,
    Before,
    AtOrAfter,
    AtOrBefore,
}

/// A `SELECT` over one model's table.
///
/// Every column name passes through [`ModelDefinition::check_field`] before it
/// reaches the SQL text; values are always bound.
#[derive(Debug)]
pub(crate) struct Select<'a> {
    model: &'a ModelDefinition,
    clauses: Vec<String>,
    params: Vec<Value>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'a> Select<'a> {
    pub(crate) fn new(model: &'a ModelDefinition) -> Self {
        Self {
            model,
            clauses: Vec::new(),
            params: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// AND one clause per filter.
    pub(crate) fn filters(mut self, filters: &Filters) -> DriverResult<Self> {
        for (field, value) in filters.iter() {
            self.model.check_field(field)?;
            let column = quote(field);

            match value {
                Json::Null => self.clauses.push(format!("{} IS NULL", column)),
                Json::Array(items) if items.is_empty() => self.clauses.push("1 = 0".to_string()),
                Json::Array(items) => {
                    let placeholders = vec!["?"; items.len()].join(", ");
                    for item in items {
                        self.params.push(bind_value(field, item)?);
                    }
                    self.clauses.push(format!("{} IN ({})", column, placeholders));
                }
                scalar => {
                    self.params.push(bind_value(field, scalar)?);
                    self.clauses.push(format!("{} = ?", column));
                }
            }
        }
        Ok(self)
    }

    /// AND a `LIKE` match of `term` against any of `fields`.
    ///
    /// Blank terms and empty field lists add nothing.
    pub(crate) fn text_match(mut self, term: &str, fields: &[String]) -> DriverResult<Self> {
        let term = term.trim();
        if term.is_empty() || fields.is_empty() {
            return Ok(self);
        }

        let mut ors = Vec::with_capacity(fields.len());
        let pattern = format!("%{}%", escape_like(term));
        for field in fields {
            self.model.check_field(field)?;
            ors.push(format!("{} LIKE ? ESCAPE '\\'", quote(field)));
            self.params.push(Value::Text(pattern.clone()));
        }
        self.clauses.push(format!("({})", ors.join(" OR ")));
        Ok(self)
    }

    /// AND a keyset bound on the primary key.
    pub(crate) fn seek(mut self, seek: Seek, key: Value) -> Self {
        let op = match seek {
            Seek::After => ">",
            Seek::Before => "<",
            Seek::AtOrAfter => ">=",
            Seek::AtOrBefore => "<=",
        };
        self.clauses
            .push(format!("{} {} ?", quote(&self.model.primary_key), op));
        self.params.push(key);
        self
    }

    /// Append an ORDER BY term.
    pub(crate) fn order_by(mut self, field: &str, direction: SortDirection) -> DriverResult<Self> {
        self.model.check_field(field)?;
        self.order_by
            .push(format!("{} {}", quote(field), direction.as_sql()));
        Ok(self)
    }

    /// Order by the primary key, as a tiebreaker or the sole order.
    pub(crate) fn order_by_key(mut self, direction: SortDirection) -> Self {
        let key = quote(&self.model.primary_key);
        if !self.order_by.iter().any(|o| o.starts_with(&format!("{} ", key))) {
            self.order_by.push(format!("{} {}", key, direction.as_sql()));
        }
        self
    }

    pub(crate) fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }

    /// Build the row query.
    pub(crate) fn build(&self) -> (String, Vec<Value>) {
        let mut sql = format!(
            "SELECT * FROM {} WHERE {}",
            quote(&self.model.table),
            self.where_clause()
        );
        let mut params = self.params.clone();

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(clamp_i64(limit)));
            if let Some(offset) = self.offset {
                sql.push_str(" OFFSET ?");
                params.push(Value::Integer(clamp_i64(offset)));
            }
        }

        (sql, params)
    }

    /// Build the matching `COUNT(*)` query.
    pub(crate) fn build_count(&self) -> (String, Vec<Value>) {
        let sql = format!(
            "SELECT COUNT(*) AS aggregate FROM {} WHERE {}",
            quote(&self.model.table),
            self.where_clause()
        );
        (sql, self.params.clone())
    }
}

/// Double-quote an identifier that has already been validated.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn bind_value(field: &str, value: &Json) -> DriverResult<Value> {
    match value {
        Json::Array(_) | Json::Object(_) => Err(QueryError::InvalidFilter {
            field: field.to_string(),
            reason: "nested arrays and objects are not supported".to_string(),
        }),
        scalar => Value::try_from(scalar).map_err(|e| QueryError::InvalidFilter {
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
