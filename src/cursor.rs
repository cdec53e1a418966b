use std::iter::FusedIterator;

use crate::error::Error;
use crate::node::{NodeId, Side};
use crate::tree::AvlTree;

/// In-order traversal direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// Ascending key order.
    Forward,
    /// Descending key order.
    Backward,
}

impl Direction {
    pub(crate) const fn side(self) -> Side {
        match self {
            Direction::Forward => Side::Right,
            Direction::Backward => Side::Left,
        }
    }
}

/// Converts a signed direction, `1` for forward and `-1` for backward.
impl TryFrom<i32> for Direction {
    type Error = Error;

    fn try_from(sign: i32) -> Result<Self, Error> {
        match sign {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            _ => Err(Error::InvalidDirection(sign)),
        }
    }
}

/// A position in an in-order walk of an [`AvlTree`].
///
/// A cursor holds handles only and is driven by passing the tree to each
/// call, so the tree may be mutated between steps. The next node is looked
/// up as soon as a node becomes current, which makes it safe to remove the
/// current node and keep walking:
///
/// ```
/// use avl_engine::{AvlTree, Direction};
/// let mut tree: AvlTree<_, _> = (0..100).map(|k| (k, ())).collect();
/// let mut cursor = tree.cursor(Direction::Forward);
/// let mut current = cursor.get(&tree);
/// while let Some(id) = current {
///     tree.remove(id).unwrap();
///     current = cursor.next(&tree);
/// }
/// assert!(tree.is_empty());
/// ```
///
/// A cursor must only be used with the tree it was obtained from. Positions
/// taken from another tree are not detected.
#[derive(Clone, Debug)]
pub struct Cursor {
    direction: Direction,
    current: Option<NodeId>,
    lookahead: Option<NodeId>,
    initialized: bool,
}

impl Cursor {
    pub(crate) const fn new(direction: Direction) -> Self {
        Self {
            direction,
            current: None,
            lookahead: None,
            initialized: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Moves to the first node in the cursor's direction and returns it,
    /// or `None` if the tree is empty.
    pub fn first<K, V, C>(&mut self, tree: &AvlTree<K, V, C>) -> Option<NodeId> {
        self.current = tree.outermost_in(self.direction);
        self.lookahead = self.successor(tree);
        self.initialized = true;
        self.current
    }

    /// Returns the current node. An unpositioned cursor moves to the first node.
    ///
    /// The returned node may have been removed since the cursor reached it.
    pub fn get<K, V, C>(&mut self, tree: &AvlTree<K, V, C>) -> Option<NodeId> {
        if !self.initialized {
            return self.first(tree);
        }
        self.current
    }

    /// Advances the cursor and returns the new current node, or `None` at
    /// the end of the walk. An unpositioned cursor is moved to the first
    /// node and then advanced, so it returns the second node.
    pub fn next<K, V, C>(&mut self, tree: &AvlTree<K, V, C>) -> Option<NodeId> {
        if !self.initialized {
            self.first(tree);
        }
        // A removed lookahead means the tree was mutated beyond what the
        // cursor supports; end the walk rather than follow detached links.
        self.current = self.lookahead.filter(|&id| tree.is_linked(id));
        self.lookahead = self.successor(tree);
        self.current
    }

    fn successor<K, V, C>(&self, tree: &AvlTree<K, V, C>) -> Option<NodeId> {
        self.current
            .and_then(|id| tree.next_in_order(id, self.direction.side()))
    }
}

/// An iterator over the entries of an [`AvlTree`], sorted by key.
pub struct Iter<'a, K, V, C> {
    tree: &'a AvlTree<K, V, C>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V, C> Iter<'a, K, V, C> {
    pub(crate) fn new(
        tree: &'a AvlTree<K, V, C>,
        front: Option<NodeId>,
        back: Option<NodeId>,
        remaining: usize,
    ) -> Self {
        Self {
            tree,
            front,
            back,
            remaining,
        }
    }

    fn entry(&self, id: NodeId) -> (&'a K, &'a V) {
        let node = self.tree.node(id);
        (&node.key, &node.value)
    }
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.tree.next_in_order(id, Side::Right);
        Some(self.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, C> DoubleEndedIterator for Iter<'a, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.tree.next_in_order(id, Side::Left);
        Some(self.entry(id))
    }
}

impl<'a, K, V, C> ExactSizeIterator for Iter<'a, K, V, C> {}

impl<'a, K, V, C> FusedIterator for Iter<'a, K, V, C> {}

impl<'a, K, V, C> Clone for Iter<'a, K, V, C> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}
