//! rockout-search
//!
//! Debounced, paginated, cancelable search and list loading for the Rockout
//! screens that browse users and trending hashtags.
//!
//! Pure Core / Impure Shell: [`state`] holds the controller, a deterministic
//! state machine driven by explicit commands and completions; [`integration`]
//! wires it to a background [`source::FetchWorker`] thread.

pub mod config;
pub mod integration;
pub mod logging;
pub mod model;
pub mod source;
pub mod state;

pub use integration::SearchSession;
