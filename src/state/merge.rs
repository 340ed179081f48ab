//! Result merger (pure).
//!
//! Applies a fetched page to the displayed list.

use crate::model::Identified;
use std::collections::HashSet;
use tracing::warn;

/// How a page is combined with the items already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// First page of a query: the page becomes the list.
    Replace,
    /// Subsequent page: appended after existing items.
    Append,
}

/// Merge `incoming` into `existing` according to `mode`.
///
/// Replace returns `incoming` unchanged. Keys must already be unique within a
/// page; a page that violates this is logged and kept as delivered.
///
/// Append keeps `existing` in place and adds each incoming item in received order,
/// skipping any whose identity key is already present. Re-delivering an
/// overlapping page is therefore a no-op for the overlap.
pub fn merge<T: Identified>(existing: Vec<T>, incoming: Vec<T>, mode: MergeMode) -> Vec<T> {
    match mode {
        MergeMode::Replace => {
            if let Some(key) = first_duplicate_key(&incoming) {
                warn!(?key, "page contains a duplicate identity key");
            }
            incoming
        }
        MergeMode::Append => {
            let mut seen: HashSet<T::Key> = existing.iter().map(Identified::identity_key).collect();
            let mut merged = existing;
            merged.reserve(incoming.len());
            for item in incoming {
                if seen.insert(item.identity_key()) {
                    merged.push(item);
                }
            }
            merged
        }
    }
}

fn first_duplicate_key<T: Identified>(items: &[T]) -> Option<T::Key> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(Identified::identity_key)
        .find(|key| !seen.insert(key.clone()))
}
