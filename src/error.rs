//! Error types for the AVL tree engine.
//!
//! Every variant is a usage error: the caller handed the tree something it
//! cannot act on. None of them leave the tree modified. Absence of a key is
//! not an error and is reported as `None` by the lookup methods.

use thiserror::Error;

/// Precondition failures reported by tree operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A tree was built without a comparison function.
    #[error("avl: no comparison function")]
    MissingComparator,

    /// The node is detached, i.e. not currently linked into the tree.
    #[error("avl: element not in tree")]
    NotInTree,

    /// The node is already linked into the tree and cannot be inserted again.
    #[error("avl: element already in tree")]
    AlreadyLinked,

    /// The node is still linked and must be removed before it can be released.
    #[error("avl: element still linked into tree")]
    StillLinked,

    /// The handle refers to a node that has been released, or was never
    /// allocated by this tree.
    #[error("avl: stale node handle")]
    StaleHandle,

    /// An iteration direction outside of the supported in-order directions.
    #[error("avl: invalid direction {0}")]
    InvalidDirection(i32),
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
