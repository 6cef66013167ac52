//! Driver registry and routed query entry point.

use std::fmt;
use std::sync::Arc;

use shop_db::Db;
use shop_search::SearchClient;

use crate::config::QueryConfig;
use crate::driver::QueryDriver;
use crate::drivers::{DatabaseDriver, TypesenseDriver};
use crate::error::{DriverResult, QueryError};
use crate::request::{Filters, SearchOptions};
use crate::results::{CursorPage, Page, Record, SimplePage};

/// Name of the relational driver, the universal fallback.
pub const DATABASE_DRIVER: &str = "database";
/// Name of the search index driver.
pub const TYPESENSE_DRIVER: &str = "typesense";

/// Routes model queries to named drivers.
///
/// Each routed call resolves the explicit driver name (or the default),
/// swaps in the `database` driver when the chosen one does not support the
/// model, and returns the driver's result untouched.
///
/// Registration takes `&mut self`; set the manager up once, then share it
/// behind an `Arc` for read-only use.
pub struct QueryManager {
    drivers: Vec<(String, Arc<dyn QueryDriver>)>,
    default_driver: String,
}

impl fmt::Debug for QueryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryManager")
            .field("drivers", &self.driver_names())
            .field("default_driver", &self.default_driver)
            .finish()
    }
}

impl QueryManager {
    /// Create an empty manager with a default driver name.
    ///
    /// The name is not checked here; routed calls fail with `DriverNotFound`
    /// until a driver is registered under it.
    pub fn new(default_driver: impl Into<String>) -> Self {
        Self {
            drivers: Vec::new(),
            default_driver: default_driver.into(),
        }
    }

    /// Build a manager from configuration.
    ///
    /// Registers `database` always and `typesense` when enabled, then makes
    /// `query_method` the default.
    pub async fn from_config(config: &QueryConfig) -> DriverResult<Self> {
        let catalog = Arc::new(config.catalog()?);
        let db = Db::connect_with(&config.database.url, config.database.max_connections).await?;

        let mut manager = Self::new(DATABASE_DRIVER);
        manager.register_driver(
            DATABASE_DRIVER,
            Arc::new(DatabaseDriver::new(db, catalog.clone())),
        )?;

        if config.typesense.enabled {
            let client = SearchClient::new(config.typesense.search.clone())?;
            manager.register_driver(
                TYPESENSE_DRIVER,
                Arc::new(TypesenseDriver::new(Arc::new(client), catalog)),
            )?;
        }

        manager.set_default_driver(&config.query_method)?;
        Ok(manager)
    }

    /// Register a driver, builder style.
    pub fn with_driver(
        mut self,
        name: impl Into<String>,
        driver: Arc<dyn QueryDriver>,
    ) -> DriverResult<Self> {
        self.register_driver(name, driver)?;
        Ok(self)
    }

    /// Insert or replace a driver. A replaced driver keeps its registration slot.
    pub fn register_driver(
        &mut self,
        name: impl Into<String>,
        driver: Arc<dyn QueryDriver>,
    ) -> DriverResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(QueryError::InvalidDriverName);
        }

        match self.drivers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                tracing::info!(driver = %name, "replacing query driver");
                slot.1 = driver;
            }
            None => {
                tracing::info!(driver = %name, "registering query driver");
                self.drivers.push((name, driver));
            }
        }
        Ok(())
    }

    /// Change the default driver. Unknown names leave the default unchanged.
    pub fn set_default_driver(&mut self, name: &str) -> DriverResult<()> {
        if self.find(name).is_none() {
            return Err(QueryError::DriverNotFound(name.to_string()));
        }
        if self.default_driver != name {
            tracing::info!(from = %self.default_driver, to = name, "default query driver changed");
            self.default_driver = name.to_string();
        }
        Ok(())
    }

    /// The current default driver name.
    pub fn default_driver(&self) -> &str {
        &self.default_driver
    }

    /// Registered driver names, in registration order.
    pub fn driver_names(&self) -> Vec<&str> {
        self.drivers.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Whether a driver is registered under `name`.
    pub fn has_driver(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The driver registered under `name`, or under the default name.
    ///
    /// No capability fallback is applied here.
    pub fn get_driver(&self, name: Option<&str>) -> DriverResult<Arc<dyn QueryDriver>> {
        let name = name.unwrap_or(&self.default_driver);
        self.find(name)
            .cloned()
            .ok_or_else(|| QueryError::DriverNotFound(name.to_string()))
    }

    /// The first driver, in registration order, that supports `model`.
    ///
    /// Falls back to the `database` name without asking whether that driver
    /// supports the model, or whether it is registered at all.
    pub fn get_best_driver_for_model(&self, model: &str) -> &str {
        self.drivers
            .iter()
            .find(|(_, driver)| driver.supports(model))
            .map(|(name, _)| name.as_str())
            .unwrap_or(DATABASE_DRIVER)
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn QueryDriver>> {
        self.drivers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, driver)| driver)
    }

    /// The name of the driver that will serve `model` when `driver` is requested.
    ///
    /// Applies the same fallback as the query operations, so an unsupported
    /// model without a registered `database` driver is an error here too.
    pub fn resolve_name(&self, model: &str, driver: Option<&str>) -> DriverResult<&str> {
        self.route(model, driver).map(|(name, _)| name)
    }

    /// The requested driver when it supports `model`, the `database` driver otherwise.
    fn route(
        &self,
        model: &str,
        driver: Option<&str>,
    ) -> DriverResult<(&str, &Arc<dyn QueryDriver>)> {
        let requested = driver.unwrap_or(&self.default_driver);
        let (name, selected) = self
            .drivers
            .iter()
            .find(|(n, _)| n == requested)
            .ok_or_else(|| QueryError::DriverNotFound(requested.to_string()))?;

        if selected.supports(model) {
            return Ok((name.as_str(), selected));
        }

        let fallback = self
            .find(DATABASE_DRIVER)
            .ok_or_else(|| QueryError::DriverNotFound(DATABASE_DRIVER.to_string()))?;
        Ok((DATABASE_DRIVER, fallback))
    }

    /// Pick the driver that will serve `model`.
    fn resolve(&self, model: &str, driver: Option<&str>) -> DriverResult<&Arc<dyn QueryDriver>> {
        let requested = driver.unwrap_or(&self.default_driver);
        let (served_by, selected) = self.route(model, driver)?;

        if served_by == requested {
            tracing::debug!(model, driver = requested, "query routed");
        } else {
            tracing::warn!(
                model,
                requested,
                fallback = served_by,
                "driver does not support model, falling back"
            );
        }
        Ok(selected)
    }

    /// A page of results with a total count.
    pub async fn paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
        driver: Option<&str>,
    ) -> DriverResult<Page> {
        self.resolve(model, driver)?
            .paginate(model, filters, options, per_page)
            .await
    }

    /// A page of results without a total count.
    pub async fn simple_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
        driver: Option<&str>,
    ) -> DriverResult<SimplePage> {
        self.resolve(model, driver)?
            .simple_paginate(model, filters, options, per_page)
            .await
    }

    /// A page of results addressed by an opaque cursor.
    pub async fn cursor_paginate(
        &self,
        model: &str,
        filters: &Filters,
        options: &SearchOptions,
        per_page: u32,
        cursor: Option<&str>,
        driver: Option<&str>,
    ) -> DriverResult<CursorPage> {
        self.resolve(model, driver)?
            .cursor_paginate(model, filters, options, per_page, cursor)
            .await
    }

    /// Free-text matches for `query` over `fields`.
    pub async fn search(
        &self,
        model: &str,
        query: &str,
        fields: &[String],
        filters: &Filters,
        driver: Option<&str>,
    ) -> DriverResult<Vec<Record>> {
        self.resolve(model, driver)?
            .search(model, query, fields, filters)
            .await
    }

    /// Every record matching `filters`.
    pub async fn all(
        &self,
        model: &str,
        filters: &Filters,
        driver: Option<&str>,
    ) -> DriverResult<Vec<Record>> {
        self.resolve(model, driver)?.all(model, filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Answers `supports` from a fixed list and returns empty results.
    struct StubDriver {
        name: &'static str,
        models: &'static [&'static str],
    }

    #[async_trait]
    impl QueryDriver for StubDriver {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, model: &str) -> bool {
            self.models.contains(&model)
        }

        async fn paginate(
            &self,
            _: &str,
            _: &Filters,
            options: &SearchOptions,
            per_page: u32,
        ) -> DriverResult<Page> {
            Ok(Page::new(Vec::new(), 0, options.page(), per_page))
        }

        async fn simple_paginate(
            &self,
            _: &str,
            _: &Filters,
            options: &SearchOptions,
            per_page: u32,
        ) -> DriverResult<SimplePage> {
            Ok(SimplePage::new(Vec::new(), options.page(), per_page, false))
        }

        async fn cursor_paginate(
            &self,
            _: &str,
            _: &Filters,
            _: &SearchOptions,
            per_page: u32,
            _: Option<&str>,
        ) -> DriverResult<CursorPage> {
            Ok(CursorPage::new(Vec::new(), per_page, None, None))
        }

        async fn search(
            &self,
            _: &str,
            _: &str,
            _: &[String],
            _: &Filters,
        ) -> DriverResult<Vec<Record>> {
            Ok(Vec::new())
        }

        async fn all(&self, _: &str, _: &Filters) -> DriverResult<Vec<Record>> {
            Ok(Vec::new())
        }
    }

    fn stub(name: &'static str, models: &'static [&'static str]) -> Arc<dyn QueryDriver> {
        Arc::new(StubDriver { name, models })
    }

    #[test]
    fn test_register_keeps_order_and_replaces_in_place() {
        let mut manager = QueryManager::new(DATABASE_DRIVER);
        manager.register_driver("database", stub("database", &[])).unwrap();
        manager.register_driver("typesense", stub("typesense", &[])).unwrap();
        manager.register_driver("database", stub("database-v2", &[])).unwrap();

        assert_eq!(manager.driver_names(), vec!["database", "typesense"]);
        assert_eq!(manager.get_driver(None).unwrap().name(), "database-v2");
    }

    #[test]
    fn test_empty_driver_name_rejected() {
        let mut manager = QueryManager::new(DATABASE_DRIVER);
        let err = manager.register_driver("", stub("x", &[])).unwrap_err();
        assert!(matches!(err, QueryError::InvalidDriverName));
        assert!(manager.driver_names().is_empty());
    }

    #[test]
    fn test_set_default_requires_registered_driver() {
        let mut manager = QueryManager::new(DATABASE_DRIVER)
            .with_driver("database", stub("database", &[]))
            .unwrap();

        let err = manager.set_default_driver("redis").unwrap_err();
        assert!(matches!(err, QueryError::DriverNotFound(ref n) if n == "redis"));
        assert_eq!(manager.default_driver(), "database");
    }

    #[test]
    fn test_unregistered_default_fails_lookups() {
        let manager = QueryManager::new("typesense");
        assert!(matches!(
            manager.get_driver(None),
            Err(QueryError::DriverNotFound(ref n)) if n == "typesense"
        ));
    }

    #[test]
    fn test_best_driver_defaults_to_database_name() {
        let manager = QueryManager::new(DATABASE_DRIVER)
            .with_driver("typesense", stub("typesense", &["Product"]))
            .unwrap();

        assert_eq!(manager.get_best_driver_for_model("Product"), "typesense");
        // Not registered, still the answer.
        assert_eq!(manager.get_best_driver_for_model("Address"), "database");
    }

    #[test]
    fn test_resolve_name_follows_fallback() {
        let manager = QueryManager::new("typesense")
            .with_driver("database", stub("database", &[]))
            .unwrap()
            .with_driver("typesense", stub("typesense", &["Product"]))
            .unwrap();

        assert_eq!(manager.resolve_name("Product", None).unwrap(), "typesense");
        assert_eq!(manager.resolve_name("Address", None).unwrap(), "database");
        assert_eq!(
            manager.resolve_name("Product", Some("database")).unwrap(),
            "database"
        );
        assert!(matches!(
            manager.resolve_name("Product", Some("redis")),
            Err(QueryError::DriverNotFound(ref n)) if n == "redis"
        ));
    }

    #[test]
    fn test_resolve_name_without_database_driver() {
        let manager = QueryManager::new("typesense")
            .with_driver("typesense", stub("typesense", &["Product"]))
            .unwrap();

        assert_eq!(manager.resolve_name("Product", None).unwrap(), "typesense");
        assert!(matches!(
            manager.resolve_name("Address", None),
            Err(QueryError::DriverNotFound(ref n)) if n == "database"
        ));
        // The best-driver answer still names database.
        assert_eq!(manager.get_best_driver_for_model("Address"), "database");
    }

    #[tokio::test]
    async fn test_fallback_needs_database_driver() {
        let manager = QueryManager::new("typesense")
            .with_driver("typesense", stub("typesense", &["Product"]))
            .unwrap();

        assert!(manager.all("Product", &Filters::new(), None).await.is_ok());
        let err = manager.all("Address", &Filters::new(), None).await.unwrap_err();
        assert!(matches!(err, QueryError::DriverNotFound(ref n) if n == "database"));
    }
}
