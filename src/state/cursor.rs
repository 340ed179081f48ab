//! Pagination cursor (pure).
//!
//! Tracks where the next page starts and whether the backend has more.

/// Offset/has-more bookkeeping for one query lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    offset: usize,
    has_more: bool,
    in_flight: bool,
}

/// Window of the next page to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Index of the first item to fetch.
    pub offset: usize,
    /// Number of items to request.
    pub limit: usize,
}

impl PaginationCursor {
    /// A cursor at offset 0 with more items assumed.
    pub fn new() -> Self {
        Self {
            offset: 0,
            has_more: true,
            in_flight: false,
        }
    }

    /// Start over for a new query: offset 0, more available, nothing in flight.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Claim the next page window.
    ///
    /// Returns `None` ("nothing to do") when the backend is exhausted or a fetch
    /// is already in flight. Otherwise marks the cursor in flight until
    /// [`record_page`](Self::record_page) or [`release`](Self::release).
    pub fn advance(&mut self, page_size: usize) -> Option<PageWindow> {
        if !self.has_more || self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(PageWindow {
            offset: self.offset,
            limit: page_size,
        })
    }

    /// Apply a successful page.
    ///
    /// `returned` is the number of items the backend actually sent, which may be
    /// less than the requested limit on the final page.
    pub fn record_page(&mut self, returned: usize, has_more: bool) {
        self.offset += returned;
        self.has_more = has_more;
        self.in_flight = false;
    }

    /// Give up the in-flight claim after a failure without moving the offset.
    pub fn release(&mut self) {
        self.in_flight = false;
    }

    /// Number of items received so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether another page may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a page request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new()
    }
}
