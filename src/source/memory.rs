//! In-memory page fetcher over a loaded catalog.

use super::{CancelToken, PageFetcher};
use crate::model::{FetchError, PageRequest, PageResult, Query, TrendingHashtag, UserSummary};
use std::fmt;
use std::thread;
use std::time::Duration;

/// Latency is simulated in slices this long so cancellation is noticed promptly.
const LATENCY_SLICE: Duration = Duration::from_millis(5);

type Matcher<T> = fn(&T, &Query) -> bool;

/// Serves pages from a fixed list of records.
///
/// Matching records keep catalog order. An optional artificial latency makes the
/// debounce/cancel behaviour observable from the CLI.
pub struct MemoryDirectory<T> {
    records: Vec<T>,
    matcher: Matcher<T>,
    latency: Duration,
}

impl<T> MemoryDirectory<T> {
    /// Serve `records`, keeping those for which `matcher` accepts the query.
    pub fn new(records: Vec<T>, matcher: Matcher<T>) -> Self {
        Self {
            records,
            matcher,
            latency: Duration::ZERO,
        }
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of records in the catalog.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn wait(&self, cancel: &CancelToken) -> Result<(), FetchError> {
        let mut remaining = self.latency;
        while !remaining.is_zero() {
            if cancel.is_cancelled() {
                return Err(FetchError::network("request canceled"));
            }
            let slice = remaining.min(LATENCY_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        Ok(())
    }
}

impl MemoryDirectory<UserSummary> {
    /// User search: case-insensitive substring of username or display name.
    pub fn users(records: Vec<UserSummary>) -> Self {
        Self::new(records, UserSummary::matches)
    }
}

impl MemoryDirectory<TrendingHashtag> {
    /// Trending hashtags, most-used first; matched by tag prefix.
    pub fn hashtags(mut records: Vec<TrendingHashtag>) -> Self {
        records.sort_by(|a, b| b.post_count.cmp(&a.post_count).then_with(|| a.tag.cmp(&b.tag)));
        Self::new(records, TrendingHashtag::matches)
    }
}

impl<T: Clone + Send + Sync> PageFetcher<T> for MemoryDirectory<T> {
    fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancelToken,
    ) -> Result<PageResult<T>, FetchError> {
        if request.limit == 0 {
            return Err(FetchError::validation("limit must be positive"));
        }
        self.wait(cancel)?;

        let mut matching = self
            .records
            .iter()
            .filter(|record| (self.matcher)(*record, &request.query))
            .skip(request.offset);
        let items: Vec<T> = matching.by_ref().take(request.limit).cloned().collect();
        let has_more = matching.next().is_some();

        Ok(PageResult::new(items, has_more))
    }
}

impl<T> fmt::Debug for MemoryDirectory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDirectory")
            .field("records", &self.records.len())
            .field("latency", &self.latency)
            .finish()
    }
}
