//! Per-call query inputs: filters and search options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Option key naming the sort field.
pub const SORT_BY: &str = "sort_by";
/// Option key naming the sort direction (`asc` or `desc`).
pub const SORT_DIRECTION: &str = "sort_direction";
/// Option key naming the 1-indexed page for offset pagination.
pub const PAGE: &str = "page";
/// Option key carrying a free-text term.
pub const SEARCH: &str = "search";
/// Option key listing the fields the free-text term applies to.
pub const SEARCH_FIELDS: &str = "search_fields";

const KNOWN_OPTIONS: [&str; 5] = [SORT_BY, SORT_DIRECTION, PAGE, SEARCH, SEARCH_FIELDS];

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Lowercase form used by the search index.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parse case-insensitively; anything other than `desc` sorts ascending.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Field filters, keyed by field name.
///
/// Scalars match by equality, arrays by membership and `null` matches
/// missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, Value>);

impl Filters {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a filter.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Get the filter value for a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterate filters in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no filters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Search options: sorting, paging and free-text settings.
///
/// Keys other than the ones this module names are kept and exposed through
/// [`SearchOptions::extra`]; drivers decide whether to use them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchOptions(BTreeMap<String, Value>);

impl SearchOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an option.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Set the sort field and direction.
    pub fn with_sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.with(SORT_BY, Value::String(field.into()))
            .with(SORT_DIRECTION, direction.as_str())
    }

    /// Set the page.
    pub fn with_page(self, page: u32) -> Self {
        self.with(PAGE, page)
    }

    /// Set a free-text term and the fields it applies to.
    pub fn with_search<I, S>(self, term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<Value> = fields.into_iter().map(|f| Value::String(f.into())).collect();
        self.with(SEARCH, Value::String(term.into()))
            .with(SEARCH_FIELDS, Value::Array(fields))
    }

    /// Get a raw option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The sort field, if any.
    pub fn sort_by(&self) -> Option<&str> {
        self.get(SORT_BY).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// The sort direction, ascending unless `desc` was given.
    pub fn sort_direction(&self) -> SortDirection {
        self.get(SORT_DIRECTION)
            .and_then(Value::as_str)
            .map(SortDirection::parse)
            .unwrap_or_default()
    }

    /// The requested page, at least 1. Accepts numbers and numeric strings.
    pub fn page(&self) -> u32 {
        let page = match self.get(PAGE) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        page.map(|p| p.clamp(1, u64::from(u32::MAX)) as u32).unwrap_or(1)
    }

    /// The free-text term, if non-blank.
    pub fn search_term(&self) -> Option<&str> {
        self.get(SEARCH)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Fields for the free-text term. Accepts an array or a comma separated string.
    pub fn search_fields(&self) -> Vec<String> {
        match self.get(SEARCH_FIELDS) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Options this module does not interpret.
    pub fn extra(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| !KNOWN_OPTIONS.contains(&k.as_str()))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SearchOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Render a scalar JSON value without quotes (`"abc"` becomes `abc`).
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
