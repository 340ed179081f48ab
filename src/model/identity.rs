//! Identity keys for result items.

use std::fmt::Debug;
use std::hash::Hash;

/// An item that carries a stable identity key, unique within one result set.
///
/// The merger uses the key to drop duplicate deliveries on append.
pub trait Identified {
    /// The key type. Cheap to clone, hashable.
    type Key: Clone + Eq + Hash + Debug;

    /// Return this item's identity key.
    fn identity_key(&self) -> Self::Key;
}
