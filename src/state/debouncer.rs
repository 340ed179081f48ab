//! Query debouncer (pure).
//!
//! Turns a stream of raw text edits into committed queries. Time is supplied by the
//! caller as an [`Instant`], so every transition is testable without sleeping.

use crate::model::Query;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default quiet period before an edit is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Event emitted by the debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceEvent {
    /// Input has been stable for the quiet period; search for this query.
    Commit(Query),
    /// Input became empty; clear results immediately.
    Clear,
}

#[derive(Debug, Clone)]
struct PendingCommit {
    query: Query,
    deadline: Instant,
}

/// Delays committing a query until input has been stable for `delay`.
///
/// The last committed query starts out empty, so clearing an untouched search box
/// emits nothing.
#[derive(Debug, Clone)]
pub struct QueryDebouncer {
    delay: Duration,
    pending: Option<PendingCommit>,
    last_committed: Option<Query>,
}

impl QueryDebouncer {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_committed: None,
        }
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a raw edit made at `now`.
    ///
    /// Returns `Some(Clear)` immediately when the edit empties the query and the
    /// last committed query was non-empty. Non-empty edits never emit here; they
    /// schedule a commit that [`poll`](Self::poll) releases after the quiet period.
    pub fn on_edit(&mut self, raw: &str, now: Instant) -> Option<DebounceEvent> {
        // Any edit supersedes whatever was pending.
        self.pending = None;

        let Some(query) = Query::new(raw) else {
            return self.last_committed.take().map(|_| DebounceEvent::Clear);
        };

        if self.last_committed.as_ref() == Some(&query) {
            trace!(query = %query, "edit matches committed query; nothing pending");
            return None;
        }

        self.pending = Some(PendingCommit {
            query,
            deadline: now + self.delay,
        });
        None
    }

    /// Release the pending commit if its quiet period has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<DebounceEvent> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if !due {
            return None;
        }

        let pending = self.pending.take()?;
        self.last_committed = Some(pending.query.clone());
        Some(DebounceEvent::Commit(pending.query))
    }

    /// When the pending commit becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    /// Whether an edit is waiting for its quiet period.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending commit without emitting it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Overwrite the committed query, e.g. when a search is started directly
    /// rather than through an edit. Any pending commit is dropped.
    pub fn set_committed(&mut self, query: Option<Query>) {
        self.pending = None;
        self.last_committed = query;
    }

    /// The most recently committed query.
    pub fn last_committed(&self) -> Option<&Query> {
        self.last_committed.as_ref()
    }
}

impl Default for QueryDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
