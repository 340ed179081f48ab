//! Impure shell around the pure controller.
//!
//! [`SearchSession`] owns one [`SearchController`] and one [`FetchWorker`]. Commands
//! go to the controller; any ticket it issues is handed to the worker; completions
//! come back over the worker's channel and are applied in [`SearchSession::pump`] on
//! the thread that owns the session. Controller state is never touched anywhere
//! else.

use crate::model::{FetchError, Identified};
use crate::source::{FetchCompletion, FetchWorker, PageFetcher};
use crate::state::{
    Completion, ControllerSettings, FetchTicket, ListState, SearchController, SubscriptionId,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One screen's search session: controller plus background fetch worker.
pub struct SearchSession<T> {
    controller: SearchController<T>,
    worker: FetchWorker<T>,
}

impl<T: Identified + Send + 'static> SearchSession<T> {
    /// Create a session that fetches through `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the worker thread cannot be spawned.
    pub fn new(
        settings: ControllerSettings,
        fetcher: Arc<dyn PageFetcher<T>>,
    ) -> std::io::Result<Self> {
        Ok(Self {
            controller: SearchController::new(settings),
            worker: FetchWorker::spawn(fetcher)?,
        })
    }

    /// The wrapped controller, for read-only inspection.
    pub fn controller(&self) -> &SearchController<T> {
        &self.controller
    }

    /// Current observable state.
    pub fn state(&self) -> &ListState<T> {
        self.controller.state()
    }

    /// Register a callback invoked after every applied state change.
    pub fn subscribe(&mut self, callback: impl FnMut(&ListState<T>) + 'static) -> SubscriptionId {
        self.controller.subscribe(callback)
    }

    /// Remove a callback. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.controller.unsubscribe(id)
    }

    // ----- Commands -----

    /// Feed a raw text edit. Clearing the box cancels any in-flight fetch.
    pub fn on_query_changed(&mut self, text: &str) {
        self.controller.on_query_changed(text, Instant::now());
        self.worker.cancel_before(self.controller.generation());
    }

    /// Commit a debounced edit if its quiet period has elapsed.
    ///
    /// Returns true if a fetch was issued.
    pub fn tick(&mut self) -> bool {
        let ticket = self.controller.tick(Instant::now());
        self.dispatch(ticket)
    }

    /// Start a search immediately, bypassing the debouncer.
    pub fn start_search(&mut self, raw: &str) -> bool {
        let ticket = self.controller.start_search(raw);
        self.dispatch(ticket)
    }

    /// Request the next page. Returns true if a fetch was issued.
    pub fn load_more(&mut self) -> bool {
        let ticket = self.controller.load_more();
        self.dispatch(ticket)
    }

    /// Request the next page if `visible_key` is near the end of the list.
    pub fn load_more_if_needed(&mut self, visible_key: &T::Key) -> bool {
        let ticket = self.controller.load_more_if_needed(visible_key);
        self.dispatch(ticket)
    }

    /// Re-issue the operation behind `last_error`, if it may be retried.
    pub fn retry(&mut self) -> bool {
        let ticket = self.controller.retry();
        self.dispatch(ticket)
    }

    /// Apply every completion that has arrived. Returns how many were not stale.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.worker.try_recv() {
            if self.apply(completion) != Completion::Stale {
                applied += 1;
            }
        }
        applied
    }

    /// Block until nothing is pending or in flight, or `timeout` elapses.
    ///
    /// Drives the debouncer and applies completions as they arrive. Returns true
    /// if the session went idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            self.tick();

            let pending_commit = self.controller.next_deadline();
            if self.controller.in_flight().is_none() && pending_commit.is_none() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let wake = pending_commit.map_or(deadline, |at| at.min(deadline));
            let wait = wake.saturating_duration_since(now);
            if let Some(completion) = self.worker.recv_timeout(wait) {
                self.apply(completion);
            }
        }
    }

    /// Detach the session: cancel in-flight work, stop the worker, and make every
    /// later command a no-op. Returns without waiting for a running fetch.
    pub fn teardown(&mut self) {
        self.controller.teardown();
        self.worker.cancel_before(self.controller.generation());
        self.worker.shutdown();
        debug!("search session torn down");
    }

    // ----- Internals -----

    fn dispatch(&mut self, ticket: Option<FetchTicket>) -> bool {
        self.worker.cancel_before(self.controller.generation());
        let Some(ticket) = ticket else {
            return false;
        };
        if !self.worker.submit(ticket.clone()) {
            warn!("fetch worker is not running");
            self.controller.complete(
                &ticket,
                Err(FetchError::network("fetch worker is not running")),
            );
            return false;
        }
        true
    }

    fn apply(&mut self, completion: FetchCompletion<T>) -> Completion {
        self.controller.complete(&completion.ticket, completion.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageRequest, PageResult, UserSummary};
    use crate::source::CancelToken;
    use crate::state::LoadingStatus;

    struct OneUser;

    impl PageFetcher<UserSummary> for OneUser {
        fn fetch_page(
            &self,
            _request: &PageRequest,
            _cancel: &CancelToken,
        ) -> Result<PageResult<UserSummary>, FetchError> {
            Ok(PageResult::new(vec![UserSummary::new("1", "amy", "Amy")], false))
        }
    }

    #[test]
    fn command_reports_no_fetch_when_worker_is_gone() {
        let mut session =
            SearchSession::<UserSummary>::new(ControllerSettings::default(), Arc::new(OneUser))
                .unwrap();
        session.worker.shutdown();

        assert!(!session.start_search("amy"));

        let state = session.state();
        assert_eq!(state.loading(), LoadingStatus::Idle);
        assert!(session.controller().in_flight().is_none());
        assert!(matches!(
            state.last_error().map(|last| &last.error),
            Some(FetchError::Network { .. })
        ));
    }

    #[test]
    fn command_reports_fetch_when_worker_accepts_it() {
        let mut session =
            SearchSession::<UserSummary>::new(ControllerSettings::default(), Arc::new(OneUser))
                .unwrap();

        assert!(session.start_search("amy"));
        assert!(session.wait_idle(Duration::from_secs(5)));
        assert_eq!(session.state().items().len(), 1);
    }
}
