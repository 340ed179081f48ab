//! Search/list state machine (pure).
//!
//! All state transitions are pure functions of their inputs (including the
//! caller-supplied clock), testable without threads or a backend.

pub mod controller;
pub mod cursor;
pub mod debouncer;
pub mod merge;
pub mod observer;

// Re-export for convenience
pub use controller::{
    Completion, ControllerSettings, ErrorPresentation, FetchKind, FetchTicket, LastError,
    ListState, LoadingStatus, SearchController, DEFAULT_PAGE_SIZE,
};
pub use cursor::{PageWindow, PaginationCursor};
pub use debouncer::{DebounceEvent, QueryDebouncer, DEFAULT_DEBOUNCE};
pub use merge::{merge, MergeMode};
pub use observer::{Observers, SubscriptionId};
