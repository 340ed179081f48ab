//! Integration tests: SearchSession driving a real fetch worker thread.
//!
//! A scripted fetcher serves canned pages keyed by `(query, offset)`. Queries marked
//! slow block until their cancel token fires, which makes supersession observable.

use rockout_search::model::{FetchError, PageRequest, PageResult, TrendingHashtag, UserSummary};
use rockout_search::source::{CancelToken, MemoryDirectory, PageFetcher};
use rockout_search::state::{ControllerSettings, ErrorPresentation, LoadingStatus};
use rockout_search::SearchSession;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const SETTLE: Duration = Duration::from_secs(5);

type Outcome = Result<PageResult<UserSummary>, FetchError>;

#[derive(Default)]
struct ScriptedFetcher {
    script: Mutex<HashMap<(String, usize), VecDeque<Outcome>>>,
    slow: HashSet<String>,
    calls: Mutex<Vec<PageRequest>>,
    canceled: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn respond(self, query: &str, offset: usize, outcome: Outcome) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry((query.to_string(), offset))
            .or_default()
            .push_back(outcome);
        self
    }

    fn slow(mut self, query: &str) -> Self {
        self.slow.insert(query.to_string());
        self
    }

    fn queries_fetched(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.query.as_str().to_string())
            .collect()
    }
}

impl PageFetcher<UserSummary> for ScriptedFetcher {
    fn fetch_page(&self, request: &PageRequest, cancel: &CancelToken) -> Outcome {
        self.calls.lock().unwrap().push(request.clone());
        let query = request.query.as_str().to_string();

        if self.slow.contains(&query) {
            for _ in 0..400 {
                if cancel.is_cancelled() {
                    self.canceled.lock().unwrap().push(query);
                    return Err(FetchError::network("request canceled"));
                }
                thread::sleep(Duration::from_millis(5));
            }
        }

        self.script
            .lock()
            .unwrap()
            .get_mut(&(query, request.offset))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(PageResult::empty()))
    }
}

fn settings(page_size: usize) -> ControllerSettings {
    ControllerSettings {
        debounce: Duration::from_millis(20),
        page_size: NonZeroUsize::new(page_size).unwrap(),
        prefetch_distance: 0,
    }
}

fn user(id: &str, name: &str) -> UserSummary {
    UserSummary::new(id, name.to_lowercase().replace(' ', "_"), name)
}

fn page(users: Vec<UserSummary>, has_more: bool) -> Outcome {
    Ok(PageResult::new(users, has_more))
}

fn session(
    fetcher: &Arc<ScriptedFetcher>,
    page_size: usize,
) -> SearchSession<UserSummary> {
    let fetcher: Arc<dyn PageFetcher<UserSummary>> = fetcher.clone();
    SearchSession::new(settings(page_size), fetcher).expect("spawn worker")
}

fn ids(session: &SearchSession<UserSummary>) -> Vec<String> {
    session
        .state()
        .items()
        .iter()
        .map(|u| u.id.as_str().to_string())
        .collect()
}

#[test]
fn typed_query_is_debounced_then_paged() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .respond("amy", 0, page(vec![user("1", "Amy A")], true))
            .respond("amy", 1, page(vec![user("2", "Amy B")], false)),
    );
    let mut s = session(&fetcher, 1);

    s.on_query_changed("a");
    s.on_query_changed("am");
    s.on_query_changed("amy");
    assert!(s.wait_idle(SETTLE));

    assert_eq!(ids(&s), vec!["1"]);
    assert!(s.state().has_more());
    assert_eq!(fetcher.queries_fetched(), vec!["amy"]);

    assert!(s.load_more());
    assert_eq!(s.state().loading(), LoadingStatus::LoadingMore);
    assert!(s.wait_idle(SETTLE));

    assert_eq!(ids(&s), vec!["1", "2"]);
    assert!(!s.state().has_more());
    assert!(!s.load_more(), "exhausted list must not fetch");
}

#[test]
fn superseded_query_is_canceled_and_never_applied() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .slow("slow")
            .respond("slow", 0, page(vec![user("9", "Slow")], false))
            .respond("fast", 0, page(vec![user("1", "Fast")], false)),
    );
    let mut s = session(&fetcher, 20);

    assert!(s.start_search("slow"));
    thread::sleep(Duration::from_millis(20));
    assert!(s.start_search("fast"));
    assert!(s.wait_idle(SETTLE));

    assert_eq!(ids(&s), vec!["1"]);
    assert_eq!(s.state().current_query().unwrap().as_str(), "fast");
    assert!(s.state().last_error().is_none());

    // The superseded fetch notices its token on its own thread.
    let deadline = Instant::now() + SETTLE;
    while fetcher.canceled.lock().unwrap().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(*fetcher.canceled.lock().unwrap(), vec!["slow".to_string()]);
}

#[test]
fn clearing_the_box_cancels_in_flight_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::default().slow("amy"));
    let mut s = session(&fetcher, 20);

    assert!(s.start_search("amy"));
    s.on_query_changed("");

    assert!(s.state().items().is_empty());
    assert_eq!(s.state().current_query(), None);
    assert_eq!(s.state().loading(), LoadingStatus::Idle);
    assert!(s.wait_idle(SETTLE));
    assert!(s.state().items().is_empty());
}

#[test]
fn failed_load_more_keeps_list_and_retries_same_page() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .respond("amy", 0, page(vec![user("1", "Amy A")], true))
            .respond("amy", 1, Err(FetchError::network("connection reset")))
            .respond("amy", 1, page(vec![user("2", "Amy B")], false)),
    );
    let mut s = session(&fetcher, 1);

    assert!(s.start_search("amy"));
    assert!(s.wait_idle(SETTLE));
    assert!(s.load_more());
    assert!(s.wait_idle(SETTLE));

    let last = s.state().last_error().expect("load-more failure recorded");
    assert_eq!(last.presentation(), ErrorPresentation::Inline);
    assert_eq!(ids(&s), vec!["1"]);
    assert_eq!(s.state().offset(), 1);

    assert!(s.retry());
    assert!(s.wait_idle(SETTLE));

    assert_eq!(ids(&s), vec!["1", "2"]);
    assert!(s.state().last_error().is_none());
    let offsets: Vec<usize> = fetcher.calls.lock().unwrap().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 1, 1]);
}

#[test]
fn initial_failure_is_full_screen_and_validation_is_not_retried() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .respond("amy", 0, Err(FetchError::auth("token expired")))
            .respond("amy", 0, Err(FetchError::validation("bad query")))
            .respond("amy", 0, page(vec![user("1", "Amy A")], false)),
    );
    let mut s = session(&fetcher, 20);

    assert!(s.start_search("amy"));
    assert!(s.wait_idle(SETTLE));
    let last = s.state().last_error().unwrap();
    assert_eq!(last.presentation(), ErrorPresentation::FullScreen);
    assert!(last.error.requires_reauthentication());

    assert!(s.retry(), "auth failures may be retried");
    assert!(s.wait_idle(SETTLE));
    assert!(matches!(
        s.state().last_error().unwrap().error,
        FetchError::Validation { .. }
    ));

    assert!(!s.retry(), "validation failures are not retried");
    assert_eq!(fetcher.calls.lock().unwrap().len(), 2);
}

#[test]
fn teardown_discards_in_flight_work_and_ignores_commands() {
    let fetcher = Arc::new(ScriptedFetcher::default().slow("amy"));
    let mut s = session(&fetcher, 20);
    let notifications = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&notifications);
    s.subscribe(move |_| *seen.borrow_mut() += 1);

    assert!(s.start_search("amy"));
    let before = *notifications.borrow();
    s.teardown();

    assert!(s.controller().is_torn_down());
    assert!(s.wait_idle(SETTLE));
    assert!(!s.start_search("bob"));
    assert!(!s.load_more());
    assert_eq!(*notifications.borrow(), before);
}

#[test]
fn observers_see_loading_then_results() {
    let fetcher = Arc::new(
        ScriptedFetcher::default().respond("amy", 0, page(vec![user("1", "Amy A")], false)),
    );
    let mut s = session(&fetcher, 20);
    let history = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&history);
    s.subscribe(move |state| sink.borrow_mut().push((state.loading(), state.items().len())));

    assert!(s.start_search("amy"));
    assert!(s.wait_idle(SETTLE));

    assert_eq!(
        *history.borrow(),
        vec![(LoadingStatus::LoadingInitial, 0), (LoadingStatus::Idle, 1)]
    );
}

#[test]
fn hashtag_directory_pages_by_popularity() {
    use chrono::{TimeZone, Utc};

    let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let directory = MemoryDirectory::hashtags(vec![
        TrendingHashtag::new("#lofi", 40, at),
        TrendingHashtag::new("#rock", 90, at),
        TrendingHashtag::new("#lounge", 70, at),
        TrendingHashtag::new("#jazz", 500, at),
    ]);
    let fetcher: Arc<dyn PageFetcher<TrendingHashtag>> = Arc::new(directory);
    let mut s = SearchSession::new(settings(1), fetcher).unwrap();

    s.on_query_changed("#LO");
    assert!(s.wait_idle(SETTLE));
    assert!(s.load_more());
    assert!(s.wait_idle(SETTLE));

    let tags: Vec<&str> = s.state().items().iter().map(|h| h.tag.as_str()).collect();
    assert_eq!(tags, vec!["#lounge", "#lofi"]);
    assert!(!s.state().has_more());
}

/// Sleeps on "stuck" without ever looking at its cancel token.
struct StubbornFetcher;

impl PageFetcher<UserSummary> for StubbornFetcher {
    fn fetch_page(&self, request: &PageRequest, _cancel: &CancelToken) -> Outcome {
        if request.query.as_str() == "stuck" {
            thread::sleep(Duration::from_secs(3));
        }
        page(vec![user("1", request.query.as_str())], false)
    }
}

fn stubborn_session() -> SearchSession<UserSummary> {
    let fetcher: Arc<dyn PageFetcher<UserSummary>> = Arc::new(StubbornFetcher);
    SearchSession::new(settings(20), fetcher).expect("spawn worker")
}

#[test]
fn teardown_returns_promptly_while_fetch_ignores_cancellation() {
    let mut s = stubborn_session();
    assert!(s.start_search("stuck"));
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    s.teardown();
    drop(s);

    assert!(
        started.elapsed() < Duration::from_secs(1),
        "teardown took {:?}",
        started.elapsed()
    );
}

#[test]
fn new_search_is_not_held_up_by_superseded_fetch() {
    let mut s = stubborn_session();
    assert!(s.start_search("stuck"));
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    assert!(s.start_search("fresh"));
    assert!(s.wait_idle(SETTLE));

    assert!(
        started.elapsed() < Duration::from_secs(1),
        "second search settled after {:?}",
        started.elapsed()
    );
    assert_eq!(ids(&s), vec!["1"]);
    assert_eq!(s.state().current_query().unwrap().as_str(), "fresh");
}
