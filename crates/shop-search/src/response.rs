//! Search response handling.

use serde::Deserialize;

/// A JSON document stored in the index.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Body of a `documents/search` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Number of documents matching the query and filters.
    #[serde(default)]
    pub found: u64,
    /// Number of documents in the collection.
    #[serde(default)]
    pub out_of: u64,
    /// Page that was returned (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Server side search time.
    #[serde(default)]
    pub search_time_ms: u64,
    /// Hits in rank order.
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

fn default_page() -> u32 {
    1
}

impl SearchResponse {
    /// Whether more hits exist past this page for the given page size.
    pub fn has_more(&self, per_page: u32) -> bool {
        u64::from(self.page) * u64::from(per_page) < self.found
    }

    /// Consume the response, keeping only the documents in rank order.
    pub fn into_documents(self) -> Vec<Document> {
        self.hits.into_iter().map(|hit| hit.document).collect()
    }
}

/// A single ranked hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// The stored document.
    pub document: Document,
    /// Typesense text match score.
    #[serde(default)]
    pub text_match: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract the `message` field from a Typesense error body, falling back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
