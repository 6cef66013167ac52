//! Opaque cursor tokens.
//!
//! A cursor is URL-safe base64 over a small JSON payload. Each driver picks
//! its own payload shape; callers only ever pass the token back.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DriverResult, QueryError};

/// An opaque pagination token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encode a payload into a token.
    pub fn encode<T: Serialize>(payload: &T) -> DriverResult<Self> {
        let json = serde_json::to_vec(payload)
            .map_err(|e| QueryError::InvalidCursor(e.to_string()))?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode a token into a payload.
    pub fn decode<T: DeserializeOwned>(token: &str) -> DriverResult<T> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| QueryError::InvalidCursor(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| QueryError::InvalidCursor(e.to_string()))
    }

    /// Get the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct PagePayload {
        page: u32,
    }

    #[test]
    fn test_token_is_url_safe() {
        let cursor = Cursor::encode(&serde_json::json!({"key": "a/b+c?", "dir": "next"})).unwrap();
        assert!(cursor
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        let back: serde_json::Value = Cursor::decode(cursor.as_str()).unwrap();
        assert_eq!(back["key"], "a/b+c?");
    }

    #[test]
    fn test_garbage_is_invalid_cursor() {
        let err = Cursor::decode::<PagePayload>("not a cursor!").unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor(_)));

        let wrong_shape = Cursor::encode(&serde_json::json!({"key": 1})).unwrap();
        let err = Cursor::decode::<PagePayload>(wrong_shape.as_str()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor(_)));
    }
}
