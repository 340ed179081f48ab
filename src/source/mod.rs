//! Page sources.
//!
//! This module provides the fetch side of the controller:
//! - [`PageFetcher`], the collaborator capability injected into a session
//! - [`FetchWorker`], a background thread that runs fetches off the owning thread
//! - [`MemoryDirectory`], an in-memory fetcher over a loaded catalog
//! - [`load_catalog`], JSONL catalog loading for the CLI

use crate::model::{FetchError, PageRequest, PageResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub mod file;
pub mod memory;
pub mod worker;

pub use file::load_catalog;
pub use memory::MemoryDirectory;
pub use worker::{FetchCompletion, FetchWorker};

/// Fetches one page of results for a query.
///
/// Implementations run on the worker thread and may block. Long-running
/// implementations should poll `cancel` and bail out early once it fires; the
/// result of a canceled fetch is discarded either way.
pub trait PageFetcher<T>: Send + Sync {
    /// Fetch `request.limit` items starting at `request.offset`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` for transport failures, `FetchError::Auth` when
    /// credentials are rejected and `FetchError::Validation` for malformed requests.
    fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancelToken,
    ) -> Result<PageResult<T>, FetchError>;
}

/// Cooperative cancellation flag for one fetch.
///
/// Fires once a newer query generation has been published to the worker.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl CancelToken {
    pub(crate) fn new(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self { generation, latest }
    }

    /// A token that never fires. Useful when calling a fetcher directly.
    pub fn never() -> Self {
        Self {
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether a newer generation has been published.
    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::Acquire) > self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_fires_when_newer_generation_is_published() {
        let latest = Arc::new(AtomicU64::new(3));
        let token = CancelToken::new(3, Arc::clone(&latest));
        assert!(!token.is_cancelled());

        latest.store(4, Ordering::Release);
        assert!(token.is_cancelled());
    }

    #[test]
    fn never_token_does_not_fire() {
        assert!(!CancelToken::never().is_cancelled());
    }
}
