//! Trending hashtag record.

use super::{Identified, Query};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hashtag row in the trending list.
///
/// The backend computes `post_count` over its trending window; this crate only
/// displays and paginates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingHashtag {
    /// Tag as displayed, usually with a leading `#`.
    pub tag: String,
    /// Number of posts using the tag.
    pub post_count: u64,
    /// When the count was last refreshed.
    pub updated_at: DateTime<Utc>,
}

impl TrendingHashtag {
    /// Create a hashtag entry.
    pub fn new(tag: impl Into<String>, post_count: u64, updated_at: DateTime<Utc>) -> Self {
        Self {
            tag: tag.into(),
            post_count,
            updated_at,
        }
    }

    /// Tag without the leading `#`, lower-cased.
    pub fn normalized_tag(&self) -> String {
        normalize_tag(&self.tag)
    }

    /// Case-insensitive prefix match. A leading `#` on either side is ignored.
    pub fn matches(&self, query: &Query) -> bool {
        let needle = normalize_tag(query.as_str());
        !needle.is_empty() && self.normalized_tag().starts_with(&needle)
    }
}

fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}

impl Identified for TrendingHashtag {
    type Key = String;

    fn identity_key(&self) -> String {
        self.normalized_tag()
    }
}
