//! User search result record.

use super::{Identified, Query};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a backend user id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user row as shown in the search list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Backend id, unique per user.
    pub id: UserId,
    /// Handle without the leading `@`.
    pub username: String,
    /// Name shown in result rows.
    pub display_name: String,
    /// Avatar image, if the user has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Create a user summary without an avatar.
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(id),
            username: username.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Case-insensitive substring match on username or display name.
    pub fn matches(&self, query: &Query) -> bool {
        let needle = query.as_str().to_lowercase();
        self.username.to_lowercase().contains(&needle)
            || self.display_name.to_lowercase().contains(&needle)
    }
}

impl Identified for UserSummary {
    type Key = UserId;

    fn identity_key(&self) -> UserId {
        self.id.clone()
    }
}
