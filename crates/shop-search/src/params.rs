//! Search request parameters.

use std::collections::BTreeMap;

/// Parameters for a Typesense `documents/search` call.
///
/// Built fluently and rendered into query-string pairs by
/// [`SearchParams::to_query_pairs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Text query; `*` matches every document.
    pub q: String,
    /// Comma separated fields to search in.
    pub query_by: Option<String>,
    /// Typesense filter expression.
    pub filter_by: Option<String>,
    /// Typesense sort expression.
    pub sort_by: Option<String>,
    /// Page number (1-indexed).
    pub page: u32,
    /// Hits per page.
    pub per_page: u32,
    /// Additional raw parameters forwarded as-is.
    pub extra: BTreeMap<String, String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new("*")
    }
}

impl SearchParams {
    /// Create parameters for a text query.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            query_by: None,
            filter_by: None,
            sort_by: None,
            page: 1,
            per_page: 10,
            extra: BTreeMap::new(),
        }
    }

    /// Match every document.
    pub fn match_all() -> Self {
        Self::new("*")
    }

    /// Set the fields to search in.
    pub fn with_query_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.query_by = if joined.is_empty() { None } else { Some(joined) };
        self
    }

    /// Set the filter expression. Empty expressions are dropped.
    pub fn with_filter_by(mut self, filter_by: impl Into<String>) -> Self {
        let filter_by = filter_by.into();
        self.filter_by = if filter_by.is_empty() { None } else { Some(filter_by) };
        self
    }

    /// Set the sort expression.
    pub fn with_sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    /// Set pagination.
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page.max(1);
        self.per_page = per_page.max(1);
        self
    }

    /// Add a raw parameter.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Render as query-string pairs. Typed fields win over `extra` on conflict.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("q".to_string(), self.q.clone())];

        if let Some(query_by) = &self.query_by {
            pairs.push(("query_by".to_string(), query_by.clone()));
        }
        if let Some(filter_by) = &self.filter_by {
            pairs.push(("filter_by".to_string(), filter_by.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by".to_string(), sort_by.clone()));
        }
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("per_page".to_string(), self.per_page.to_string()));

        for (key, value) in &self.extra {
            if !pairs.iter().any(|(k, _)| k == key) {
                pairs.push((key.clone(), value.clone()));
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_pairs() {
        let params = SearchParams::new("shoe")
            .with_query_by(["name", "description"])
            .with_filter_by("status:=active")
            .with_sort_by("price:asc")
            .with_page(2, 20)
            .with_extra("prefix", "false");

        assert_eq!(
            params.to_query_pairs(),
            vec![
                ("q".to_string(), "shoe".to_string()),
                ("query_by".to_string(), "name,description".to_string()),
                ("filter_by".to_string(), "status:=active".to_string()),
                ("sort_by".to_string(), "price:asc".to_string()),
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "20".to_string()),
                ("prefix".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_extra_does_not_override_typed_fields() {
        let params = SearchParams::match_all().with_extra("page", "9");
        let pairs = params.to_query_pairs();
        let pages: Vec<_> = pairs.iter().filter(|(k, _)| k == "page").collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].1, "1");
    }

    #[test]
    fn test_empty_parts_are_dropped() {
        let params = SearchParams::match_all()
            .with_query_by(Vec::<String>::new())
            .with_filter_by("");
        assert_eq!(params.query_by, None);
        assert_eq!(params.filter_by, None);
    }
}
