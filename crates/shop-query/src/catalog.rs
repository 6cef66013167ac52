//! Model catalog: what each driver needs to know about a model.

use serde::{Deserialize, Serialize};

use crate::error::{DriverResult, QueryError};

/// How a model is stored and indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model identifier used by callers (e.g. `Product`).
    pub name: String,
    /// Backing table.
    pub table: String,
    /// Primary key column, used for default ordering and cursors.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Search index collection; `None` when the model is not indexed.
    #[serde(default)]
    pub collection: Option<String>,
    /// Fields searched when a caller does not name any.
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Fields allowed in filters and sorting. Empty allows any identifier.
    #[serde(default)]
    pub fields: Vec<String>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ModelDefinition {
    /// Create a definition for a table, keyed by `id`, not indexed.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: default_primary_key(),
            collection: None,
            search_fields: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Set the primary key column.
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Mark the model as indexed in a search collection.
    pub fn indexed(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Set the default search fields.
    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict filterable/sortable fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the model has a search collection.
    pub fn is_indexed(&self) -> bool {
        self.collection.is_some()
    }

    /// Check a field can be used in filters, sorting or text matching.
    pub fn check_field(&self, field: &str) -> DriverResult<()> {
        let allowed = is_identifier(field)
            && (self.fields.is_empty()
                || field == self.primary_key
                || self.fields.iter().any(|f| f == field));

        if allowed {
            Ok(())
        } else {
            Err(QueryError::InvalidField {
                model: self.name.clone(),
                field: field.to_string(),
            })
        }
    }

    /// Check the table and primary key are safe to splice into SQL.
    pub fn validate(&self) -> DriverResult<()> {
        if self.name.is_empty() {
            return Err(QueryError::Config("model name must not be empty".to_string()));
        }
        for (what, ident) in [("table", &self.table), ("primary key", &self.primary_key)] {
            if !is_identifier(ident) {
                return Err(QueryError::Config(format!(
                    "{} `{}` of model {} is not a valid identifier",
                    what, ident, self.name
                )));
            }
        }
        Ok(())
    }
}

/// Ordered set of model definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<ModelDefinition>,
}

impl ModelCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from definitions, validating each one.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ModelDefinition>,
    ) -> DriverResult<Self> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Add or replace a model definition.
    pub fn register(&mut self, definition: ModelDefinition) -> DriverResult<()> {
        definition.validate()?;
        match self.models.iter_mut().find(|m| m.name == definition.name) {
            Some(existing) => *existing = definition,
            None => self.models.push(definition),
        }
        Ok(())
    }

    /// Add a definition, builder style.
    pub fn with(mut self, definition: ModelDefinition) -> DriverResult<Self> {
        self.register(definition)?;
        Ok(self)
    }

    /// Look up a model.
    pub fn get(&self, model: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == model)
    }

    /// Look up a model or fail with `UnknownModel`.
    pub fn require(&self, model: &str) -> DriverResult<&ModelDefinition> {
        self.get(model)
            .ok_or_else(|| QueryError::UnknownModel(model.to_string()))
    }

    /// Iterate definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.iter()
    }

    /// Model names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The Shopping package's models.
    pub fn shopping() -> Self {
        let models = vec![
            ModelDefinition::new("Product", "products")
                .indexed("products")
                .with_search_fields(["name", "description", "sku"])
                .with_fields([
                    "name", "description", "sku", "price", "category_id", "status",
                    "created_at", "updated_at",
                ]),
            ModelDefinition::new("Category", "categories")
                .indexed("categories")
                .with_search_fields(["name", "description"])
                .with_fields([
                    "name", "slug", "description", "parent_id", "is_active", "position",
                    "created_at", "updated_at",
                ]),
            ModelDefinition::new("Address", "addresses")
                .with_search_fields(["line1", "city", "postal_code"])
                .with_fields([
                    "customer_id", "type", "line1", "line2", "city", "state", "postal_code",
                    "country", "is_default", "created_at",
                ]),
            ModelDefinition::new("CustomerPreference", "customer_preferences")
                .with_search_fields(["key"])
                .with_fields(["customer_id", "key", "value", "updated_at"]),
            ModelDefinition::new("CustomerNote", "customer_notes")
                .indexed("customer_notes")
                .with_search_fields(["title", "content"])
                .with_fields([
                    "customer_id", "author_id", "title", "content", "is_private", "created_at",
                ]),
            ModelDefinition::new("Wishlist", "wishlists")
                .with_search_fields(["name"])
                .with_fields(["customer_id", "product_id", "name", "is_public", "created_at"]),
            ModelDefinition::new("EmployeeBenefit", "employee_benefits")
                .with_search_fields(["name", "provider"])
                .with_fields([
                    "employee_id", "name", "provider", "status", "start_date", "end_date",
                ]),
            ModelDefinition::new("EmployeeSkill", "employee_skills")
                .with_search_fields(["name"])
                .with_fields(["employee_id", "name", "level", "certified", "created_at"]),
            ModelDefinition::new("EmployeeTraining", "employee_trainings")
                .with_search_fields(["title", "provider"])
                .with_fields([
                    "employee_id", "title", "provider", "status", "completed_at", "created_at",
                ]),
            ModelDefinition::new("EmployeeTimeOff", "employee_time_offs")
                .with_search_fields(["reason"])
                .with_fields([
                    "employee_id", "type", "status", "reason", "start_date", "end_date",
                ]),
            ModelDefinition::new("SalaryHistory", "salary_histories")
                .with_search_fields(["reason"])
                .with_fields([
                    "employee_id", "amount", "currency", "reason", "effective_date",
                ]),
            ModelDefinition::new("ProviderRating", "provider_ratings")
                .with_search_fields(["comment"])
                .with_fields(["provider_id", "customer_id", "rating", "comment", "created_at"]),
            ModelDefinition::new("ProviderPayment", "provider_payments")
                .with_search_fields(["reference"])
                .with_fields([
                    "provider_id", "amount", "currency", "status", "reference", "paid_at",
                ]),
            ModelDefinition::new("ProviderNote", "provider_notes")
                .indexed("provider_notes")
                .with_search_fields(["title", "content"])
                .with_fields(["provider_id", "author_id", "title", "content", "created_at"]),
        ];

        Self { models }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier() {
        assert!(is_identifier("category_id"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("name; DROP TABLE products"));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_check_field() {
        let product = ModelDefinition::new("Product", "products").with_fields(["name", "price"]);
        assert!(product.check_field("name").is_ok());
        assert!(product.check_field("id").is_ok());
        assert!(matches!(
            product.check_field("password"),
            Err(QueryError::InvalidField { .. })
        ));

        let open = ModelDefinition::new("Tag", "tags");
        assert!(open.check_field("anything").is_ok());
        assert!(open.check_field("bad field").is_err());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut catalog = ModelCatalog::new()
            .with(ModelDefinition::new("A", "a"))
            .unwrap()
            .with(ModelDefinition::new("B", "b"))
            .unwrap();
        catalog.register(ModelDefinition::new("A", "a2")).unwrap();

        assert_eq!(catalog.names(), vec!["A", "B"]);
        assert_eq!(catalog.get("A").unwrap().table, "a2");
    }

    #[test]
    fn test_rejects_unsafe_table() {
        let err = ModelCatalog::new()
            .with(ModelDefinition::new("Evil", "x; DROP TABLE y"))
            .unwrap_err();
        assert!(matches!(err, QueryError::Config(_)));
    }

    #[test]
    fn test_shopping_catalog() {
        let catalog = ModelCatalog::shopping();
        assert_eq!(catalog.len(), 14);
        assert!(catalog.get("Product").unwrap().is_indexed());
        assert!(!catalog.get("Address").unwrap().is_indexed());
        assert!(catalog.iter().all(|m| m.validate().is_ok()));
        assert!(matches!(
            catalog.require("Spaceship"),
            Err(QueryError::UnknownModel(_))
        ));
    }
}
