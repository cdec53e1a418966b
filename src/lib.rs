//! An ordered container implemented with an AVL tree.
//!
//! [`AvlTree`] keeps its nodes height balanced, so insertion, removal and
//! lookup take `O(log n)` time in the worst case. Nodes are addressed by
//! [`NodeId`] handles that survive rebalancing, and a [`Cursor`] can walk
//! the tree in either direction while removing the node it stands on.
//!
//! ```
//! use avl_engine::{AvlTree, Direction};
//!
//! let mut tree = AvlTree::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert(key, ());
//! }
//! assert_eq!(tree.len(), 7);
//! assert_eq!(tree.first().and_then(|id| tree.key(id).ok()), Some(&1));
//! assert_eq!(tree.last().and_then(|id| tree.key(id).ok()), Some(&9));
//!
//! let mut cursor = tree.cursor(Direction::Backward);
//! let mut keys = Vec::new();
//! let mut current = cursor.get(&tree);
//! while let Some(id) = current {
//!     keys.push(*tree.key(id).unwrap());
//!     current = cursor.next(&tree);
//! }
//! assert_eq!(keys, [9, 8, 7, 5, 4, 3, 1]);
//! ```
//!
//! The tree is not synchronized. Share it across threads behind a lock.

mod arena;
mod builder;
mod compare;
mod cursor;
mod error;
mod node;
mod tree;

pub use builder::Builder;
pub use compare::{Comparator, NaturalOrder};
pub use cursor::{Cursor, Direction, Iter};
pub use error::{Error, Result};
pub use node::NodeId;
pub use tree::AvlTree;
