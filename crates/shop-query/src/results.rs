//! Query results and pagination.

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;

/// One result row or document, as a JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A page of results with a total count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// The result items.
    pub items: Vec<Record>,
    /// Total number of matching items.
    pub total: u64,
    /// Current page (1-indexed).
    pub current_page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Last page number; at least 1.
    pub last_page: u32,
}

impl Page {
    /// Create a page, deriving the last page number from the total.
    ///
    /// Page numbers start at 1; 0 is read as 1.
    pub fn new(items: Vec<Record>, total: u64, current_page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let last_page = if total == 0 {
            1
        } else {
            total.div_ceil(u64::from(per_page)).min(u64::from(u32::MAX)) as u32
        };

        Self {
            items,
            total,
            current_page: current_page.max(1),
            per_page,
            last_page,
        }
    }

    /// Whether there's a page after this one.
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Whether this is the first page.
    pub fn on_first_page(&self) -> bool {
        self.current_page <= 1
    }

    /// Get start item number (1-indexed), 0 when empty.
    pub fn first_item(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            u64::from(self.current_page.saturating_sub(1)) * u64::from(self.per_page) + 1
        }
    }

    /// Get end item number, 0 when empty.
    pub fn last_item(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            self.first_item() + self.items.len() as u64 - 1
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A page of results without a total count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePage {
    /// The result items.
    pub items: Vec<Record>,
    /// Current page (1-indexed).
    pub current_page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Whether another page follows.
    pub has_more: bool,
}

impl SimplePage {
    /// Create a simple page.
    pub fn new(items: Vec<Record>, current_page: u32, per_page: u32, has_more: bool) -> Self {
        Self {
            items,
            current_page,
            per_page,
            has_more,
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A page of results addressed by opaque cursors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage {
    /// The result items.
    pub items: Vec<Record>,
    /// Items per page.
    pub per_page: u32,
    /// Cursor for the following page, if any.
    pub next_cursor: Option<Cursor>,
    /// Cursor for the preceding page, if any.
    pub prev_cursor: Option<Cursor>,
}

impl CursorPage {
    /// Create a cursor page.
    pub fn new(
        items: Vec<Record>,
        per_page: u32,
        next_cursor: Option<Cursor>,
        prev_cursor: Option<Cursor>,
    ) -> Self {
        Self {
            items,
            per_page,
            next_cursor,
            prev_cursor,
        }
    }

    /// Whether another page follows.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
