//! Database value types and conversions.

use crate::DbError;
use base64::Engine;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// A database value that can be used as a parameter or result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Integer value.
    Integer(i64),
    /// Real/float value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl Value {
    /// Try to get the value as an i64.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to get the value as an f64.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get the value as a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert to a JSON value. Blobs that are not UTF-8 are base64 encoded.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Blob(b) => match std::str::from_utf8(b) {
                Ok(s) => serde_json::Value::String(s.to_string()),
                Err(_) => serde_json::Value::String(
                    base64::engine::general_purpose::STANDARD.encode(b),
                ),
            },
        }
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = DbError;

    /// Scalars only. Arrays and objects have no single column representation.
    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::from(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(DbError::Type(format!("number out of range: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            other => Err(DbError::Type(format!(
                "cannot bind non-scalar JSON value: {}",
                other
            ))),
        }
    }
}

// Conversions from Rust types to Value
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(if v { 1 } else { 0 })
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A row from a query result.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create a new row from columns and values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Get a value by column index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get all values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Convert the row to a HashMap.
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Convert the row to a JSON object keyed by column name.
    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Try to deserialize the row into a type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DbError> {
        let json = serde_json::Value::Object(self.to_json_object());
        serde_json::from_value(json).map_err(|e| DbError::Deserialize(e.to_string()))
    }
}

/// Query result containing rows.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// The column names.
    pub columns: Vec<String>,
    /// The rows.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Create a new query result.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the first row.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Read the first column of the first row as an integer (`COUNT(*)` and friends).
    pub fn scalar_integer(&self) -> Option<i64> {
        self.first()
            .and_then(|row| row.get_index(0))
            .and_then(Value::as_integer)
    }

    /// Convert every row to a JSON object.
    pub fn into_json_objects(self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows.iter().map(Row::to_json_object).collect()
    }

    /// Deserialize all rows into a vector of a type.
    pub fn deserialize_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, DbError> {
        self.rows.iter().map(|row| row.deserialize()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[test]
    fn test_row_lookup() {
        let row = Row::new(
            vec!["id".into(), "name".into()],
            vec![Value::Integer(7), Value::Text("Shoes".into())],
        );
        assert_eq!(row.get("name").and_then(Value::as_text), Some("Shoes"));
        assert!(row.get("missing").is_none());
        assert_eq!(row.get_index(0).and_then(Value::as_integer), Some(7));
    }

    #[test]
    fn test_row_deserialize() {
        #[derive(Deserialize)]
        struct Category {
            id: i64,
            name: String,
            parent_id: Option<i64>,
        }

        let row = Row::new(
            vec!["id".into(), "name".into(), "parent_id".into()],
            vec![Value::Integer(3), Value::Text("Boots".into()), Value::Null],
        );
        let category: Category = row.deserialize().unwrap();
        assert_eq!(category.id, 3);
        assert_eq!(category.name, "Boots");
        assert_eq!(category.parent_id, None);
    }

    #[test]
    fn test_blob_to_json() {
        assert_eq!(
            Value::Blob(b"plain".to_vec()).to_json(),
            serde_json::json!("plain")
        );
        assert_eq!(
            Value::Blob(vec![0xff, 0xfe]).to_json(),
            serde_json::json!("//4=")
        );
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::try_from(&serde_json::json!(5)).unwrap(), Value::Integer(5));
        assert_eq!(Value::try_from(&serde_json::json!(1.5)).unwrap(), Value::Real(1.5));
        assert_eq!(Value::try_from(&serde_json::json!(true)).unwrap(), Value::Integer(1));
        assert_eq!(
            Value::try_from(&serde_json::json!("active")).unwrap(),
            Value::Text("active".into())
        );
        assert!(Value::try_from(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_scalar_integer() {
        let result = QueryResult::new(
            vec!["count".into()],
            vec![Row::new(vec!["count".into()], vec![Value::Integer(42)])],
        );
        assert_eq!(result.scalar_integer(), Some(42));
        assert_eq!(QueryResult::default().scalar_integer(), None);
    }
}
