//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod hashtag;
pub mod identity;
pub mod page;
pub mod query;
pub mod user;

// Re-export for convenience
pub use error::{AppError, FetchError, SourceError};
pub use hashtag::TrendingHashtag;
pub use identity::Identified;
pub use page::{PageRequest, PageResult};
pub use query::Query;
pub use user::{UserId, UserSummary};
