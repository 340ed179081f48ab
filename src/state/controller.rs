//! Incremental search/list controller (pure).
//!
//! Coordinates the debouncer, pagination cursor and merger for one screen.
//! The controller never performs I/O: commands return a [`FetchTicket`] describing
//! the page to fetch, and the host hands the outcome back via
//! [`SearchController::complete`]. A ticket is honoured only while it is the one in
//! flight; anything else is a stale result and is dropped.

use crate::model::{FetchError, Identified, PageRequest, PageResult, Query};
use crate::state::cursor::PaginationCursor;
use crate::state::debouncer::{DebounceEvent, QueryDebouncer, DEFAULT_DEBOUNCE};
use crate::state::merge::{merge, MergeMode};
use crate::state::observer::{Observers, SubscriptionId};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(n) => n,
    None => unreachable!(),
};

// ===== Settings =====

/// Tunables for one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Quiet period before an edit is committed.
    pub debounce: Duration,
    /// Items requested per page.
    pub page_size: NonZeroUsize,
    /// `load_more_if_needed` fires when the visible item is at most this many
    /// items from the end. 0 means "the last item".
    pub prefetch_distance: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_distance: 0,
        }
    }
}

// ===== LoadingStatus =====

/// Loading state machine.
///
/// `Idle → LoadingInitial → Idle` and `Idle → LoadingMore → Idle`. Initial and
/// load-more fetches are never in flight together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Fetching the first page of the current query.
    LoadingInitial,
    /// Fetching a further page.
    LoadingMore,
}

/// Which operation issued a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// First page after `start_search`.
    Initial,
    /// Subsequent page from `load_more`.
    More,
}

// ===== FetchTicket =====

/// Identifies one issued fetch. The host passes it back with the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    generation: u64,
    sequence: u64,
    kind: FetchKind,
    request: PageRequest,
}

impl FetchTicket {
    /// Query generation this fetch belongs to. Bumped by every `start_search`
    /// and by `teardown`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this is an initial or a load-more fetch.
    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    /// The page to fetch.
    pub fn request(&self) -> &PageRequest {
        &self.request
    }
}

// ===== Errors as presented =====

/// How the host screen should present `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPresentation {
    /// Initial fetch failed: nothing to show, replace the list with an error view.
    FullScreen,
    /// Load-more failed: keep the list, show a non-blocking indicator.
    Inline,
}

/// The most recent failure and the operation it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    /// The failure reported by the fetcher.
    pub error: FetchError,
    /// The operation that failed.
    pub kind: FetchKind,
}

impl LastError {
    /// Full-screen for a failed initial fetch, inline for a failed load-more.
    pub fn presentation(&self) -> ErrorPresentation {
        match self.kind {
            FetchKind::Initial => ErrorPresentation::FullScreen,
            FetchKind::More => ErrorPresentation::Inline,
        }
    }
}

// ===== ListState =====

/// Observable controller state.
#[derive(Debug, Clone)]
pub struct ListState<T> {
    current_query: Option<Query>,
    items: Vec<T>,
    cursor: PaginationCursor,
    loading: LoadingStatus,
    last_error: Option<LastError>,
}

impl<T> ListState<T> {
    fn new() -> Self {
        Self {
            current_query: None,
            items: Vec::new(),
            cursor: PaginationCursor::new(),
            loading: LoadingStatus::Idle,
            last_error: None,
        }
    }

    /// The committed query, or `None` when the box is empty.
    pub fn current_query(&self) -> Option<&Query> {
        self.current_query.as_ref()
    }

    /// Items currently shown, in display order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items received so far for the current query.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    /// Whether the backend reported more items after the last page.
    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    /// Current loading status.
    pub fn loading(&self) -> LoadingStatus {
        self.loading
    }

    /// Whether the first page of the query is being fetched.
    pub fn is_loading_initial(&self) -> bool {
        self.loading == LoadingStatus::LoadingInitial
    }

    /// Whether a further page is being fetched.
    pub fn is_loading_more(&self) -> bool {
        self.loading == LoadingStatus::LoadingMore
    }

    /// The most recent unresolved failure.
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }
}

// ===== Completion =====

/// What [`SearchController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Page merged into the list.
    Applied,
    /// Failure recorded in `last_error`.
    Failed,
    /// Ticket no longer current; outcome dropped without touching state.
    Stale,
}

// ===== SearchController =====

/// Debounced, paginated, cancelable list controller for one screen.
#[derive(Debug)]
pub struct SearchController<T> {
    settings: ControllerSettings,
    debouncer: QueryDebouncer,
    state: ListState<T>,
    generation: u64,
    issued: u64,
    in_flight: Option<FetchTicket>,
    torn_down: bool,
    observers: Observers<ListState<T>>,
}

impl<T: Identified> SearchController<T> {
    /// Create an idle controller with an empty query.
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            debouncer: QueryDebouncer::new(settings.debounce),
            state: ListState::new(),
            generation: 0,
            issued: 0,
            in_flight: None,
            torn_down: false,
            observers: Observers::new(),
        }
    }

    // ----- Observation -----

    /// Current observable state.
    pub fn state(&self) -> &ListState<T> {
        &self.state
    }

    /// Settings the controller was created with.
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Items currently shown, in display order.
    pub fn items(&self) -> &[T] {
        self.state.items()
    }

    /// The fetch whose outcome will be applied, if any.
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    /// Current query generation. Tickets from older generations are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the host should next call [`tick`](Self::tick), if an edit is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Whether [`teardown`](Self::teardown) has been called.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Register a callback invoked after every state change.
    pub fn subscribe(&mut self, callback: impl FnMut(&ListState<T>) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    /// Remove a callback. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ----- Commands -----

    /// Feed a raw text edit made at `now`.
    ///
    /// Clearing the box resets the list immediately. Non-empty edits are committed
    /// later by [`tick`](Self::tick), which issues the fetch.
    pub fn on_query_changed(&mut self, text: &str, now: Instant) {
        if self.torn_down {
            return;
        }
        if let Some(DebounceEvent::Clear) = self.debouncer.on_edit(text, now) {
            debug!("query cleared");
            self.begin_search(None);
        }
    }

    /// Release a debounced commit whose quiet period has elapsed.
    ///
    /// Returns the ticket of the initial fetch, if one was issued.
    pub fn tick(&mut self, now: Instant) -> Option<FetchTicket> {
        if self.torn_down {
            return None;
        }
        match self.debouncer.poll(now)? {
            DebounceEvent::Commit(query) => {
                debug!(query = %query, "query committed");
                self.begin_search(Some(query))
            }
            DebounceEvent::Clear => self.begin_search(None),
        }
    }

    /// Start a new search immediately, bypassing the debouncer.
    ///
    /// Cancels whatever is in flight, resets pagination and clears the list. An
    /// empty (or whitespace-only) query leaves the list empty and issues nothing.
    pub fn start_search(&mut self, raw: &str) -> Option<FetchTicket> {
        if self.torn_down {
            return None;
        }
        self.begin_search(Query::new(raw))
    }

    /// Request the next page of the current query.
    ///
    /// No-op while any fetch is in flight, when there is no query, or when the
    /// backend reported no more items.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.torn_down || self.state.loading != LoadingStatus::Idle {
            return None;
        }
        let query = self.state.current_query.clone()?;
        let window = self.state.cursor.advance(self.settings.page_size.get())?;

        let ticket = self.issue(FetchKind::More, PageRequest::new(query, window.offset, window.limit));
        self.state.loading = LoadingStatus::LoadingMore;
        self.notify();
        Some(ticket)
    }

    /// Load more when the item with `visible_key` is close enough to the end.
    ///
    /// Keys not in the list are ignored.
    pub fn load_more_if_needed(&mut self, visible_key: &T::Key) -> Option<FetchTicket> {
        let items = self.state.items();
        let position = items
            .iter()
            .position(|item| &item.identity_key() == visible_key)?;
        let remaining = items.len() - 1 - position;
        if remaining > self.settings.prefetch_distance {
            return None;
        }
        self.load_more()
    }

    /// Re-issue the operation that produced `last_error`.
    ///
    /// A failed initial fetch restarts the current query; a failed load-more asks
    /// for the same page again. Validation errors are not retried.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.torn_down || self.state.loading != LoadingStatus::Idle {
            return None;
        }
        let last = self.state.last_error.as_ref()?;
        if !last.error.is_retryable() {
            debug!(error = %last.error, "not retrying non-retryable error");
            return None;
        }
        match last.kind {
            FetchKind::Initial => {
                let query = self.state.current_query.clone();
                self.begin_search(query)
            }
            FetchKind::More => self.load_more(),
        }
    }

    /// Apply the outcome of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<PageResult<T>, FetchError>,
    ) -> Completion {
        if self.torn_down || self.in_flight.as_ref() != Some(ticket) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                offset = ticket.request.offset,
                "dropping stale result"
            );
            return Completion::Stale;
        }
        self.in_flight = None;
        self.state.loading = LoadingStatus::Idle;

        let completion = match outcome {
            Ok(page) => {
                let returned = page.items.len();
                let mode = match ticket.kind {
                    FetchKind::Initial => MergeMode::Replace,
                    FetchKind::More => MergeMode::Append,
                };
                let existing = std::mem::take(&mut self.state.items);
                self.state.items = merge(existing, page.items, mode);
                self.state.cursor.record_page(returned, page.has_more);
                self.state.last_error = None;
                info!(
                    query = %ticket.request.query,
                    offset = ticket.request.offset,
                    returned,
                    has_more = page.has_more,
                    "page applied"
                );
                Completion::Applied
            }
            Err(err) => {
                self.state.cursor.release();
                match &err {
                    FetchError::Validation { .. } => error!(
                        error = %err,
                        query = %ticket.request.query,
                        offset = ticket.request.offset,
                        "fetch rejected as invalid"
                    ),
                    _ => warn!(
                        error = %err,
                        query = %ticket.request.query,
                        offset = ticket.request.offset,
                        "fetch failed"
                    ),
                }
                self.state.last_error = Some(LastError {
                    error: err,
                    kind: ticket.kind,
                });
                Completion::Failed
            }
        };
        self.notify();
        completion
    }

    /// Detach from the screen. Every later command and completion is a no-op.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.generation += 1;
        self.debouncer.cancel();
        if let Some(ticket) = self.in_flight.take() {
            debug!(generation = ticket.generation, "canceling in-flight fetch on teardown");
        }
        self.observers.clear();
    }

    // ----- Internals -----

    fn begin_search(&mut self, query: Option<Query>) -> Option<FetchTicket> {
        self.generation += 1;
        if let Some(previous) = self.in_flight.take() {
            debug!(
                generation = previous.generation,
                "canceling in-flight fetch for superseded query"
            );
        }
        self.debouncer.set_committed(query.clone());

        self.state.cursor.reset();
        self.state.items.clear();
        self.state.last_error = None;
        self.state.loading = LoadingStatus::Idle;
        self.state.current_query = query.clone();

        let page_size = self.settings.page_size.get();
        let ticket = query.and_then(|query| {
            let window = self.state.cursor.advance(page_size)?;
            Some(self.issue(
                FetchKind::Initial,
                PageRequest::new(query, window.offset, window.limit),
            ))
        });
        if ticket.is_some() {
            self.state.loading = LoadingStatus::LoadingInitial;
        }
        self.notify();
        ticket
    }

    fn issue(&mut self, kind: FetchKind, request: PageRequest) -> FetchTicket {
        self.issued += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            sequence: self.issued,
            kind,
            request,
        };
        debug!(
            generation = ticket.generation,
            ?kind,
            query = %ticket.request.query,
            offset = ticket.request.offset,
            limit = ticket.request.limit,
            "issuing fetch"
        );
        self.in_flight = Some(ticket.clone());
        ticket
    }

    fn notify(&mut self) {
        self.observers.notify(&self.state);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
