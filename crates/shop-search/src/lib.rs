//! Typesense search client for the Shopping query drivers.
//!
//! Provides a small async client for the Typesense `documents/search`
//! endpoint, plus the [`SearchBackend`] trait the search-index query driver
//! is written against.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_search::{SearchBackend, SearchClient, SearchConfig, SearchParams};
//!
//! let client = SearchClient::new(SearchConfig::default())?;
//!
//! let response = client
//!     .search(
//!         "products",
//!         &SearchParams::new("trail shoe")
//!             .with_query_by(["name", "description"])
//!             .with_filter_by("status:=active")
//!             .with_page(1, 24),
//!     )
//!     .await?;
//!
//! println!("{} matches", response.found);
//! ```

mod error;
mod params;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::SearchError;
pub use params::SearchParams;
pub use response::{Document, SearchHit, SearchResponse};

/// Header carrying the Typesense API key.
const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Anything that can answer a search against a named collection.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a search against `collection`.
    async fn search(
        &self,
        collection: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse, SearchError>;
}

/// Connection settings for a Typesense node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `http` or `https`.
    pub protocol: String,
    /// Host name.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Optional path prefix when Typesense sits behind a proxy.
    pub path: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Prefix prepended to every collection name.
    pub collection_prefix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8108,
            path: String::new(),
            api_key: String::new(),
            timeout_secs: 5,
            collection_prefix: String::new(),
        }
    }
}

impl SearchConfig {
    /// Base URL of the node, without a trailing slash.
    pub fn base_url(&self) -> String {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("{}://{}:{}", self.protocol, self.host, self.port)
        } else {
            format!("{}://{}:{}/{}", self.protocol, self.host, self.port, path)
        }
    }

    /// Validate settings before building a client.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !matches!(self.protocol.as_str(), "http" | "https") {
            return Err(SearchError::Config(format!(
                "unsupported protocol: {}",
                self.protocol
            )));
        }
        if self.host.is_empty() {
            return Err(SearchError::Config("host must not be empty".to_string()));
        }
        Ok(())
    }
}

/// HTTP client for a Typesense node.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    collection_prefix: String,
}

impl SearchClient {
    /// Build a client from configuration.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            api_key: config.api_key,
            collection_prefix: config.collection_prefix,
        })
    }

    /// Full collection name including the configured prefix.
    pub fn collection_name(&self, collection: &str) -> String {
        format!("{}{}", self.collection_prefix, collection)
    }

    /// URL of the search endpoint for a collection.
    pub fn search_url(&self, collection: &str) -> String {
        format!(
            "{}/collections/{}/documents/search",
            self.base_url,
            self.collection_name(collection)
        )
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn search(
        &self,
        collection: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse, SearchError> {
        let url = self.search_url(collection);
        tracing::debug!(%url, q = %params.q, page = params.page, "typesense search");

        let reply = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&params.to_query_pairs())
            .send()
            .await?;

        let status = reply.status();
        if !status.is_success() {
            let body = reply.text().await.unwrap_or_default();
            return Err(SearchError::Http {
                status: status.as_u16(),
                message: response::error_message(&body),
            });
        }

        let bytes = reply.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Document, SearchBackend, SearchClient, SearchConfig, SearchError, SearchParams,
        SearchResponse,
    };
}
