//! Query layer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shop_search::SearchConfig;

use crate::catalog::{ModelCatalog, ModelDefinition};
use crate::error::{DriverResult, QueryError};
use crate::manager::DATABASE_DRIVER;

/// Environment variable overriding `query_method`.
pub const ENV_QUERY_METHOD: &str = "SHOPPING_QUERY_METHOD";
/// Environment variable overriding `database.url`.
pub const ENV_DATABASE_URL: &str = "SHOPPING_DATABASE_URL";
/// Environment variable overriding `typesense.api_key`.
pub const ENV_TYPESENSE_API_KEY: &str = "TYPESENSE_API_KEY";
/// Environment variable overriding `typesense.host`.
pub const ENV_TYPESENSE_HOST: &str = "TYPESENSE_HOST";

/// Top-level configuration (`shopping.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default driver name.
    #[serde(default = "default_query_method")]
    pub query_method: String,

    /// Relational store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Search index settings.
    #[serde(default)]
    pub typesense: TypesenseConfig,

    /// Model definitions; empty means the built-in Shopping catalog.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelDefinition>,
}

fn default_query_method() -> String {
    DATABASE_DRIVER.to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            query_method: default_query_method(),
            database: DatabaseConfig::default(),
            typesense: TypesenseConfig::default(),
            models: Vec::new(),
        }
    }
}

impl QueryConfig {
    /// Load config from a TOML or JSON file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| {
                QueryError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Self::from_toml_str(&content)?
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse TOML without touching the environment.
    pub fn from_toml_str(content: &str) -> DriverResult<Self> {
        toml::from_str(content).map_err(|e| QueryError::Config(e.to_string()))
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a variable lookup. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(method) = get(ENV_QUERY_METHOD) {
            self.query_method = method.trim().to_string();
        }
        if let Some(url) = get(ENV_DATABASE_URL) {
            self.database.url = url;
        }
        if let Some(key) = get(ENV_TYPESENSE_API_KEY) {
            self.typesense.search.api_key = key;
        }
        if let Some(host) = get(ENV_TYPESENSE_HOST) {
            self.typesense.search.host = host;
        }
    }

    /// The model catalog this config describes.
    pub fn catalog(&self) -> DriverResult<ModelCatalog> {
        if self.models.is_empty() {
            Ok(ModelCatalog::shopping())
        } else {
            ModelCatalog::from_definitions(self.models.iter().cloned())
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> DriverResult<String> {
        toml::to_string_pretty(self).map_err(|e| QueryError::Config(e.to_string()))
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://shopping.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesenseConfig {
    /// Whether to register the search driver at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Node connection settings.
    #[serde(flatten)]
    pub search: SearchConfig,
}

fn default_enabled() -> bool {
    true
}

impl Default for TypesenseConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            search: SearchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::from_toml_str("").unwrap();
        assert_eq!(config.query_method, "database");
        assert_eq!(config.database.url, "sqlite://shopping.db");
        assert!(config.typesense.enabled);
        assert_eq!(config.typesense.search.port, 8108);
        assert_eq!(config.catalog().unwrap().len(), 14);
    }

    #[test]
    fn test_parse_full_file() {
        let config = QueryConfig::from_toml_str(
            r#"
            query_method = "typesense"

            [database]
            url = "sqlite::memory:"

            [typesense]
            host = "search.internal"
            port = 443
            protocol = "https"
            api_key = "secret"
            collection_prefix = "shop_"

            [[models]]
            name = "Product"
            table = "products"
            collection = "products"
            search_fields = ["name"]
            fields = ["name", "price"]
            "#,
        )
        .unwrap();

        assert_eq!(config.query_method, "typesense");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.typesense.search.base_url(), "https://search.internal:443");
        assert_eq!(config.typesense.search.collection_prefix, "shop_");

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.names(), vec!["Product"]);
        assert_eq!(catalog.get("Product").unwrap().primary_key, "id");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_QUERY_METHOD, " typesense "),
            (ENV_TYPESENSE_API_KEY, "from-env"),
            (ENV_DATABASE_URL, "   "),
        ]
        .into_iter()
        .collect();

        let mut config = QueryConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.query_method, "typesense");
        assert_eq!(config.typesense.search.api_key, "from-env");
        assert_eq!(config.database.url, "sqlite://shopping.db");
    }

    #[test]
    fn test_bad_model_table_is_config_error() {
        let config = QueryConfig::from_toml_str(
            r#"
            [[models]]
            name = "Evil"
            table = "products; DROP TABLE products"
            "#,
        )
        .unwrap();
        assert!(matches!(config.catalog(), Err(QueryError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip_keeps_method() {
        let mut config = QueryConfig::default();
        config.query_method = "typesense".to_string();
        let text = config.to_toml_string().unwrap();
        let back = QueryConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.query_method, "typesense");
    }
}
