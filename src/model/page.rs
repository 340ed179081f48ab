//! Page request/result types exchanged with a page fetcher.

use super::Query;

/// One page of a query: `limit` items starting at `offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Committed query text.
    pub query: Query,
    /// Number of items to skip.
    pub offset: usize,
    /// Maximum number of items to return.
    pub limit: usize,
}

impl PageRequest {
    /// Create a request for `limit` items starting at `offset`.
    pub fn new(query: Query, offset: usize, limit: usize) -> Self {
        Self {
            query,
            offset,
            limit,
        }
    }
}

/// Items returned for a [`PageRequest`], in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    /// Items in backend order.
    pub items: Vec<T>,
    /// Whether the backend has items past this page.
    pub has_more: bool,
}

impl<T> PageResult<T> {
    /// Create a page.
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    /// A final page with no items.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}
