//! Pagination types for list queries.

use crate::config::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Page request shared by every list operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    /// 1-indexed page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page, capped at [`MAX_PAGE_SIZE`]
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Free-text filter over the entity's search columns
    #[serde(default)]
    pub search: Option<String>,
    /// Also return inactive and soft-deleted rows
    #[serde(default)]
    pub include_inactive: bool,
}

const fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

const fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    /// First page with the default size
    #[must_use]
    pub fn first() -> Self {
        Self::default()
    }

    /// Requests a specific page and size
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    /// Adds a free-text filter
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Includes inactive and soft-deleted rows
    #[must_use]
    pub const fn including_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// Page number, never below 1
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Page size in `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Trimmed search term, `None` when blank
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            include_inactive: false,
        }
    }
}

/// One page of results with its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Rows matching the query across all pages
    pub total_items: u64,
    /// Number of pages at the requested size
    pub total_pages: u64,
    /// 1-indexed page number returned
    pub current_page: u64,
}

impl<T> Page<T> {
    /// Builds a page and derives `total_pages`
    #[must_use]
    pub fn new(items: Vec<T>, current_page: u64, limit: u64, total_items: u64) -> Self {
        let total_pages = if limit > 0 {
            total_items.div_ceil(limit)
        } else {
            0
        };
        Self {
            items,
            total_items,
            total_pages,
            current_page,
        }
    }

    /// Converts every item, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}
