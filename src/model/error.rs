//! Error types for rockout-search.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via `?`
//! and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error returned from the CLI entry point
//!   - [`SourceError`] - Catalog loading failures (missing file, malformed JSONL)
//!   - [`ConfigError`](crate::config::ConfigError) - Config file read/parse failures
//!   - [`LoggingError`](crate::logging::LoggingError) - Tracing initialization failures
//! - [`FetchError`] - Failures reported by a [`PageFetcher`](crate::source::PageFetcher)
//!
//! # Error Recovery Strategy
//!
//! Fetch errors are **non-fatal**: the controller records them in `last_error` and the
//! host screen decides how to present them. Source, config and logging errors are fatal
//! for the CLI and propagate to `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all CLI failure modes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to load the search catalog.
    #[error("Failed to load catalog: {0}")]
    Source(#[from] SourceError),

    /// Failed to load configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// The background fetch thread could not be started.
    #[error("Failed to start fetch worker: {0}")]
    Worker(#[source] std::io::Error),

    /// Results could not be written to stdout.
    #[error("Failed to write results: {0}")]
    Output(#[source] std::io::Error),

    /// The search ended with an unrecovered fetch failure.
    #[error("Search failed: {0}")]
    Fetch(#[from] FetchError),

    /// The search did not settle before the deadline.
    #[error("Search did not finish within {0:?}")]
    Timeout(std::time::Duration),
}

/// Errors reported by a page fetcher.
///
/// Each variant maps to a distinct presentation and retry policy on the host screen.
///
/// # Recovery Patterns
///
/// - **Network**: transient. Eligible for manual retry via `retry()`, never retried
///   automatically.
/// - **Auth**: the session is no longer authorized. The host should prompt the user
///   to reconnect, then call `retry()`.
/// - **Validation**: the request itself was malformed (bad query, negative offset).
///   Treated as a programmer error: logged at error level and not retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (unreachable host, dropped connection, 5xx).
    ///
    /// # Examples
    ///
    /// ```
    /// use rockout_search::model::FetchError;
    ///
    /// let err = FetchError::Network { message: "connection reset".to_string() };
    /// assert!(err.is_retryable());
    /// assert!(err.to_string().contains("connection reset"));
    /// ```
    #[error("Network error: {message}")]
    Network {
        /// Human-readable description from the transport.
        message: String,
    },

    /// The backend rejected the caller's credentials.
    #[error("Authorization error: {message}")]
    Auth {
        /// Human-readable description from the backend.
        message: String,
    },

    /// The backend rejected the request as malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockout_search::model::FetchError;
    ///
    /// let err = FetchError::Validation { message: "offset out of range".to_string() };
    /// assert!(!err.is_retryable());
    /// ```
    #[error("Invalid request: {message}")]
    Validation {
        /// Which part of the request was rejected.
        message: String,
    },
}

impl FetchError {
    /// Shorthand for a [`FetchError::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Shorthand for a [`FetchError::Auth`].
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Shorthand for a [`FetchError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether `retry()` may re-issue the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Auth { .. })
    }

    /// Whether the host should prompt the user to reconnect their account.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Errors encountered when loading a JSONL catalog from disk.
///
/// Unlike fetch errors these are fatal: the CLI has nothing to search without a
/// catalog.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The catalog file does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use rockout_search::model::SourceError;
    ///
    /// let err = SourceError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing.jsonl"),
    /// };
    /// assert!(err.to_string().contains("/tmp/missing.jsonl"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// A line could not be decoded into a catalog record.
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord {
        /// 1-based line number in the JSONL file.
        line: usize,
        /// Decoder error message.
        message: String,
    },

    /// Two records share the same identity key.
    #[error("Duplicate identity key {key:?} at line {line}")]
    DuplicateKey {
        /// 1-based line number of the second occurrence.
        line: usize,
        /// The repeated key, formatted for display.
        key: String,
    },

    /// Generic I/O error while reading the catalog.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
