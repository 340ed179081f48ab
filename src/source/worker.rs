//! Background fetch worker.
//!
//! A dispatcher thread receives fetch commands and runs each [`PageFetcher`] call on
//! its own detached thread, so a fetch that ignores its cancel token never holds up
//! a newer one. Completions come back over a channel; the owning thread drains it
//! and applies them to its controller, so controller state is only ever touched by
//! its owner.

use super::{CancelToken, PageFetcher};
use crate::model::{FetchError, PageResult};
use crate::state::FetchTicket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Outcome of one fetch, tagged with the ticket that requested it.
#[derive(Debug)]
pub struct FetchCompletion<T> {
    /// The ticket the controller issued for this fetch.
    pub ticket: FetchTicket,
    /// Page or failure reported by the fetcher.
    pub outcome: Result<PageResult<T>, FetchError>,
}

enum WorkerCommand {
    Fetch(FetchTicket),
    Shutdown,
}

/// Handle to the background fetch threads.
///
/// Shutting down (or dropping the handle) never waits for a running fetch: the
/// dispatcher is told to stop and detached, and any late completion is discarded.
pub struct FetchWorker<T> {
    tx: Sender<WorkerCommand>,
    rx: Receiver<FetchCompletion<T>>,
    latest_generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> FetchWorker<T> {
    /// Launch the dispatcher thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(fetcher: Arc<dyn PageFetcher<T>>) -> std::io::Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let latest_generation = Arc::new(AtomicU64::new(0));
        let thread_latest = Arc::clone(&latest_generation);

        let handle = thread::Builder::new()
            .name("rockout-dispatch".to_string())
            .spawn(move || worker_loop(fetcher, command_rx, result_tx, thread_latest))?;

        Ok(Self {
            tx: command_tx,
            rx: result_rx,
            latest_generation,
            handle: Some(handle),
        })
    }

    /// Queue a fetch. Publishing its generation cancels every older fetch.
    ///
    /// Returns false if the worker has stopped.
    pub fn submit(&self, ticket: FetchTicket) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cancel_before(ticket.generation());
        self.tx.send(WorkerCommand::Fetch(ticket)).is_ok()
    }

    /// Cancel every queued or running fetch older than `generation`.
    pub fn cancel_before(&self, generation: u64) {
        self.latest_generation.fetch_max(generation, Ordering::AcqRel);
    }

    /// Next completion if one is ready.
    pub fn try_recv(&self) -> Option<FetchCompletion<T>> {
        match self.rx.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FetchCompletion<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop accepting fetches and detach the dispatcher without waiting for it.
    ///
    /// A fetch that is already running is left to finish on its own thread.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(WorkerCommand::Shutdown);
        if self.handle.take().is_some() {
            debug!("fetch worker detached");
        }
    }

    /// Whether [`submit`](Self::submit) still accepts fetches.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl<T> Drop for FetchWorker<T> {
    fn drop(&mut self) {
        // The JoinHandle is dropped with the struct, which detaches the dispatcher.
        let _ = self.tx.send(WorkerCommand::Shutdown);
    }
}

fn worker_loop<T: Send + 'static>(
    fetcher: Arc<dyn PageFetcher<T>>,
    command_rx: Receiver<WorkerCommand>,
    result_tx: Sender<FetchCompletion<T>>,
    latest_generation: Arc<AtomicU64>,
) {
    while let Ok(command) = command_rx.recv() {
        match command {
            WorkerCommand::Fetch(ticket) => {
                start_fetch(&fetcher, &result_tx, &latest_generation, ticket);
            }
            WorkerCommand::Shutdown => break,
        }
    }
    trace!("fetch dispatcher stopped");
}

fn start_fetch<T: Send + 'static>(
    fetcher: &Arc<dyn PageFetcher<T>>,
    result_tx: &Sender<FetchCompletion<T>>,
    latest_generation: &Arc<AtomicU64>,
    ticket: FetchTicket,
) {
    let token = CancelToken::new(ticket.generation(), Arc::clone(latest_generation));
    if token.is_cancelled() {
        debug!(generation = ticket.generation(), "skipping superseded fetch");
        return;
    }

    let fetcher = Arc::clone(fetcher);
    let thread_tx = result_tx.clone();
    let thread_ticket = ticket.clone();
    let spawned = thread::Builder::new()
        .name("rockout-fetch".to_string())
        .spawn(move || run_fetch(fetcher.as_ref(), &thread_tx, &token, thread_ticket));

    if let Err(err) = spawned {
        warn!(error = %err, "could not start fetch thread");
        let outcome = Err(FetchError::network(format!("could not start fetch: {}", err)));
        let _ = result_tx.send(FetchCompletion { ticket, outcome });
    }
}

/// Runs on its own thread. A send error means the session is gone; the result is
/// simply dropped.
fn run_fetch<T>(
    fetcher: &dyn PageFetcher<T>,
    result_tx: &Sender<FetchCompletion<T>>,
    token: &CancelToken,
    ticket: FetchTicket,
) {
    let outcome = fetcher.fetch_page(ticket.request(), token);
    if token.is_cancelled() {
        trace!(generation = ticket.generation(), "fetch finished after cancellation");
    }
    let _ = result_tx.send(FetchCompletion { ticket, outcome });
}
