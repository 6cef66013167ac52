//! Routing and fallback behaviour of the query manager.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use shop_db::DbError;
use shop_query::prelude::*;

/// A call as seen by a driver: operation, model and the key arguments.
#[derive(Debug, Clone, PartialEq)]
struct Call {
    op: &'static str,
    model: String,
    detail: String,
}

/// Serves an allow-list of models and records every call it receives.
struct RecordingDriver {
    label: &'static str,
    models: Option<Vec<&'static str>>,
    calls: Mutex<Vec<Call>>,
    fail_with_db_error: bool,
}

impl RecordingDriver {
    /// Supports every model.
    fn universal(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            models: None,
            calls: Mutex::new(Vec::new()),
            fail_with_db_error: false,
        })
    }

    /// Supports only `models`.
    fn only(label: &'static str, models: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            label,
            models: Some(models.to_vec()),
            calls: Mutex::new(Vec::new()),
            fail_with_db_error: false,
        })
    }

    fn failing(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            models: None,
            calls: Mutex::new(Vec::new()),
            fail_with_db_error: true,
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, model: &str, detail: String) -> DriverResult<()> {
        self.calls.lock().unwrap().push(Call {
            op,
            model: model.to_string(),
            detail,
        });
        if self.fail_with_db_error {
            return Err(QueryError::Database(DbError::Query("no such table: products".into())));
        }
        Ok(())
    }

    fn tagged(&self) -> Vec<Record> {
        json!([{ "served_by": self.label }])
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }
}

#[async_trait]
impl QueryDriver for RecordingDriver {
    fn name(&self) -> &str {
        self.label
    }

    fn supports(&self, model: &str) -> bool {
        match &self.models {
            Some(models) => models.contains(&model),
            None => true,
        }
    }

    async fn paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<Page> {
        self.record(
            "paginate",
            model,
            format!("filters={} page={} per_page={}", filters.len(), options.page(), per_page),
        )?;
        Ok(Page::new(self.tagged(), 42, options.page(), per_page))
    }

    async fn simple_paginate(
        &self,
        model: &str,
        _filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
    ) -> DriverResult<SimplePage> {
        self.record("simple_paginate", model, format!("per_page={}", per_page))?;
        Ok(SimplePage::new(self.tagged(), options.page(), per_page, true))
    }

    async fn cursor_paginate(
        &self,
        model: &str,
        _filters: &Filters,
        _options: &SearchOptions,
        per_page: u32,
        cursor: Option<&str>,
    ) -> DriverResult<CursorPage> {
        self.record(
            "cursor_paginate",
            model,
            format!("per_page={} cursor={}", per_page, cursor.unwrap_or("-")),
        )?;
        Ok(CursorPage::new(self.tagged(), per_page, None, None))
    }

    async fn search(
        &self,
        model: &str,
        query: &str,
        fields: &[String],
        _filters: &Filters,
    ) -> DriverResult<Vec<Record>> {
        self.record("search", model, format!("q={} fields={}", query, fields.join(",")))?;
        Ok(self.tagged())
    }

    async fn all(&self, model: &str, filters: &Filters) -> DriverResult<Vec<Record>> {
        self.record("all", model, format!("filters={}", filters.len()))?;
        Ok(self.tagged())
    }
}

struct Fixture {
    manager: QueryManager,
    database: Arc<RecordingDriver>,
    typesense: Arc<RecordingDriver>,
}

fn fixture(default: &str) -> Fixture {
    let database = RecordingDriver::universal("database");
    let typesense = RecordingDriver::only("typesense", &["Product", "Category"]);

    let mut manager = QueryManager::new(DATABASE_DRIVER);
    manager
        .register_driver(DATABASE_DRIVER, database.clone())
        .unwrap();
    manager
        .register_driver(TYPESENSE_DRIVER, typesense.clone())
        .unwrap();
    manager.set_default_driver(default).unwrap();

    Fixture {
        manager,
        database,
        typesense,
    }
}

fn served_by(records: &[Record]) -> &str {
    records[0]["served_by"].as_str().unwrap()
}

#[test]
fn test_get_driver_returns_registered_instance() {
    let f = fixture(DATABASE_DRIVER);

    let database: Arc<dyn QueryDriver> = f.database.clone();
    let typesense: Arc<dyn QueryDriver> = f.typesense.clone();
    assert!(Arc::ptr_eq(&f.manager.get_driver(Some("database")).unwrap(), &database));
    assert!(Arc::ptr_eq(&f.manager.get_driver(Some("typesense")).unwrap(), &typesense));
}

#[test]
fn test_get_driver_without_name_uses_default() {
    let mut f = fixture(DATABASE_DRIVER);
    assert_eq!(f.manager.get_driver(None).unwrap().name(), "database");

    f.manager.set_default_driver("typesense").unwrap();
    assert_eq!(f.manager.get_driver(None).unwrap().name(), "typesense");
}

#[test]
fn test_get_driver_applies_no_fallback() {
    let f = fixture(DATABASE_DRIVER);
    // typesense cannot serve Address, but get_driver hands it out anyway
    let driver = f.manager.get_driver(Some("typesense")).unwrap();
    assert!(!driver.supports("Address"));
    assert_eq!(driver.name(), "typesense");
}

#[test]
fn test_get_driver_unknown_name() {
    let f = fixture(DATABASE_DRIVER);
    let err = f.manager.get_driver(Some("redis")).err().unwrap();
    assert!(matches!(err, QueryError::DriverNotFound(ref n) if n == "redis"));
}

#[test]
fn test_set_default_unknown_keeps_previous() {
    let mut f = fixture(TYPESENSE_DRIVER);
    let err = f.manager.set_default_driver("redis").unwrap_err();

    assert!(matches!(err, QueryError::DriverNotFound(ref n) if n == "redis"));
    assert!(err.is_routing_error());
    assert_eq!(f.manager.default_driver(), "typesense");
}

#[test]
fn test_best_driver_follows_registration_order() {
    let f = fixture(DATABASE_DRIVER);
    // database is registered first and supports everything
    assert_eq!(f.manager.get_best_driver_for_model("Product"), "database");

    let mut manager = QueryManager::new(DATABASE_DRIVER);
    manager
        .register_driver("typesense", RecordingDriver::only("typesense", &["Product"]))
        .unwrap();
    manager
        .register_driver("database", RecordingDriver::universal("database"))
        .unwrap();
    assert_eq!(manager.get_best_driver_for_model("Product"), "typesense");
    assert_eq!(manager.get_best_driver_for_model("Address"), "database");
}

#[test]
fn test_best_driver_is_database_even_when_unsupported() {
    let mut manager = QueryManager::new(DATABASE_DRIVER);
    manager
        .register_driver("database", RecordingDriver::only("database", &["Address"]))
        .unwrap();
    manager
        .register_driver("typesense", RecordingDriver::only("typesense", &["Product"]))
        .unwrap();

    assert_eq!(manager.get_best_driver_for_model("Wishlist"), "database");
}

#[tokio::test]
async fn test_search_routes_to_supporting_driver() {
    let f = fixture(DATABASE_DRIVER);

    let hits = f
        .manager
        .search("Product", "shoe", &[], &Filters::new(), Some("typesense"))
        .await
        .unwrap();

    assert_eq!(served_by(&hits), "typesense");
    assert_eq!(
        f.typesense.calls(),
        vec![Call {
            op: "search",
            model: "Product".to_string(),
            detail: "q=shoe fields=".to_string(),
        }]
    );
    assert!(f.database.calls().is_empty());
}

#[tokio::test]
async fn test_search_falls_back_for_unsupported_model() {
    let f = fixture(DATABASE_DRIVER);

    let hits = f
        .manager
        .search("UnknownModel", "x", &[], &Filters::new(), Some("typesense"))
        .await
        .unwrap();

    assert_eq!(served_by(&hits), "database");
    assert!(f.typesense.calls().is_empty());
    assert_eq!(f.database.calls()[0].model, "UnknownModel");
}

#[tokio::test]
async fn test_every_operation_falls_back_from_default() {
    let f = fixture(TYPESENSE_DRIVER);
    let filters = Filters::new().with("customer_id", 7);
    let options = SearchOptions::new().with_page(3);

    let page = f
        .manager
        .paginate("Address", &filters, &options, 15, None)
        .await
        .unwrap();
    assert_eq!(served_by(&page.items), "database");

    let simple = f
        .manager
        .simple_paginate("Address", &filters, &options, 15, None)
        .await
        .unwrap();
    assert_eq!(served_by(&simple.items), "database");

    let cursor = f
        .manager
        .cursor_paginate("Address", &filters, &options, 15, Some("abc"), None)
        .await
        .unwrap();
    assert_eq!(served_by(&cursor.items), "database");

    let hits = f
        .manager
        .search("Address", "main st", &["line1".to_string()], &filters, None)
        .await
        .unwrap();
    assert_eq!(served_by(&hits), "database");

    let all = f.manager.all("Address", &filters, None).await.unwrap();
    assert_eq!(served_by(&all), "database");

    let ops: Vec<_> = f.database.calls().into_iter().map(|c| c.op).collect();
    assert_eq!(
        ops,
        vec!["paginate", "simple_paginate", "cursor_paginate", "search", "all"]
    );
    assert!(f.typesense.calls().is_empty());
}

#[tokio::test]
async fn test_arguments_are_passed_unchanged() {
    let f = fixture(TYPESENSE_DRIVER);
    let filters = Filters::new().with("status", "active").with("category_id", 4);
    let options = SearchOptions::new().with_page(2);

    let page = f
        .manager
        .paginate("Product", &filters, &options, 25, None)
        .await
        .unwrap();
    // The manager returns the driver's page untouched.
    assert_eq!(page.total, 42);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.per_page, 25);

    f.manager
        .cursor_paginate("Category", &Filters::new(), &options, 5, Some("tok"), None)
        .await
        .unwrap();

    assert_eq!(
        f.typesense
            .calls()
            .into_iter()
            .map(|c| c.detail)
            .collect::<Vec<_>>(),
        vec![
            "filters=2 page=2 per_page=25".to_string(),
            "per_page=5 cursor=tok".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_unknown_driver_does_not_fall_back() {
    let f = fixture(DATABASE_DRIVER);

    let err = f
        .manager
        .paginate("Product", &Filters::new(), &SearchOptions::new(), 15, Some("redis"))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::DriverNotFound(ref n) if n == "redis"));
    assert!(f.database.calls().is_empty());
    assert!(f.typesense.calls().is_empty());
}

#[tokio::test]
async fn test_driver_errors_pass_through() {
    let mut manager = QueryManager::new(DATABASE_DRIVER);
    manager
        .register_driver(DATABASE_DRIVER, RecordingDriver::failing("database"))
        .unwrap();

    let err = manager
        .all("Product", &Filters::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Database(DbError::Query(ref m)) if m.contains("no such table")));
    assert!(!err.is_routing_error());
}

#[tokio::test]
async fn test_replaced_driver_serves_calls() {
    let f = fixture(DATABASE_DRIVER);
    let mut manager = f.manager;
    let replacement = RecordingDriver::universal("database-replica");
    manager
        .register_driver(DATABASE_DRIVER, replacement.clone())
        .unwrap();

    let all = manager.all("Wishlist", &Filters::new(), None).await.unwrap();
    assert_eq!(served_by(&all), "database-replica");
    assert!(f.database.calls().is_empty());
    assert_eq!(replacement.calls().len(), 1);
    assert_eq!(manager.driver_names(), vec!["database", "typesense"]);
}
