use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::ControlFlow;

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::compare::{Comparator, NaturalOrder};
use crate::cursor::{Cursor, Direction, Iter};
use crate::error::{Error, Result};
use crate::node::{Node, NodeId, Side};

/// An ordered container implemented with an AVL tree.
///
/// Every stored element lives in its own node, addressed by a [`NodeId`]
/// handle. Handles stay stable across rebalancing, so they can be kept by
/// the caller and handed back to [`remove`](AvlTree::remove).
///
/// ```
/// use avl_engine::AvlTree;
/// let mut tree = AvlTree::new();
/// for key in [5, 3, 8, 1, 4, 7, 9] {
///     tree.insert(key, key * 10);
/// }
/// let five = tree.find(&5).unwrap();
/// tree.remove(five).unwrap();
/// let keys: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, [1, 3, 4, 7, 8, 9]);
/// ```
pub struct AvlTree<K, V, C = NaturalOrder> {
    nodes: Arena<Node<K, V>>,
    root: Option<NodeId>,
    // Memoized minimum, cleared whenever a mutation may change it.
    first: Cell<Option<NodeId>>,
    num_nodes: usize,
    comparator: C,
}

enum InsertPos {
    Occupied(NodeId),
    Vacant { parent: Option<NodeId>, side: Side },
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Creates an empty tree ordered by `K`'s [`Ord`] implementation.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> AvlTree<K, V, C> {
    pub(crate) fn from_parts(comparator: C, nodes: Arena<Node<K, V>>) -> Self {
        Self {
            nodes,
            root: None,
            first: Cell::new(None),
            num_nodes: 0,
            comparator,
        }
    }

    /// Returns true if the tree contains no linked nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of levels of the tree, `0` for an empty tree.
    pub fn height(&self) -> usize {
        // The balance factor points at the taller subtree.
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            height += 1;
            current = if node.balance < 0 { node.left } else { node.right };
        }
        height
    }

    /// Drops every node, linked or detached. All handles go stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.first.set(None);
        self.num_nodes = 0;
    }

    /// Returns the node with the smallest key, or `None` if the tree is empty.
    pub fn first(&self) -> Option<NodeId> {
        if self.first.get().is_none() {
            self.first.set(self.outermost(Side::Left));
        }
        self.first.get()
    }

    /// Returns the node with the largest key, or `None` if the tree is empty.
    pub fn last(&self) -> Option<NodeId> {
        self.outermost(Side::Right)
    }

    /// Returns true if `id` refers to a node currently linked into the tree.
    pub fn is_linked(&self, id: NodeId) -> bool {
        self.nodes.get(id).map_or(false, |node| !node.is_detached(id))
    }

    /// Returns the key of a linked or detached node.
    pub fn key(&self, id: NodeId) -> Result<&K> {
        self.entry(id).map(|(key, _)| key)
    }

    /// Returns the value of a linked or detached node.
    pub fn value(&self, id: NodeId) -> Result<&V> {
        self.entry(id).map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value of a linked or detached node.
    /// The key is not reachable mutably, it determines the node's position.
    pub fn value_mut(&mut self, id: NodeId) -> Result<&mut V> {
        self.nodes
            .get_mut(id)
            .map(|node| &mut node.value)
            .ok_or(Error::StaleHandle)
    }

    /// Returns the key-value pair of a linked or detached node.
    pub fn entry(&self, id: NodeId) -> Result<(&K, &V)> {
        self.nodes
            .get(id)
            .map(|node| (&node.key, &node.value))
            .ok_or(Error::StaleHandle)
    }

    /// Frees a detached node and hands back its key and value.
    pub fn release(&mut self, id: NodeId) -> Result<(K, V)> {
        match self.nodes.get(id) {
            None => Err(Error::StaleHandle),
            Some(node) if !node.is_detached(id) => {
                debug!(?id, "refusing to release a linked node");
                Err(Error::StillLinked)
            }
            Some(_) => {
                let node = self.nodes.take(id).ok_or(Error::StaleHandle)?;
                Ok((node.key, node.value))
            }
        }
    }

    /// Returns a cursor walking the tree in order in the given direction.
    ///
    /// The cursor does not borrow the tree. Removing the node the cursor
    /// currently points at is allowed between steps; any other mutation
    /// while the cursor is in use leaves its position unspecified.
    pub fn cursor(&self, direction: Direction) -> Cursor {
        Cursor::new(direction)
    }

    /// Visits the linked nodes in order until `visitor` breaks.
    ///
    /// The visitor may remove the node it has been handed.
    ///
    /// ```
    /// use std::ops::ControlFlow;
    /// use avl_engine::{AvlTree, Direction};
    /// let mut tree: AvlTree<_, _> = (0..10).map(|k| (k, ())).collect();
    /// tree.for_each(Direction::Forward, |tree, id| {
    ///     if tree.key(id).map_or(false, |k| k % 2 == 0) {
    ///         tree.remove(id).unwrap();
    ///     }
    ///     ControlFlow::Continue(())
    /// });
    /// assert_eq!(tree.len(), 5);
    /// ```
    pub fn for_each<F>(&mut self, direction: Direction, mut visitor: F)
    where
        F: FnMut(&mut Self, NodeId) -> ControlFlow<()>,
    {
        let mut cursor = self.cursor(direction);
        let mut current = cursor.get(self);
        while let Some(id) = current {
            if visitor(self, id).is_break() {
                return;
            }
            current = cursor.next(self);
        }
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter::new(self, self.first(), self.last(), self.num_nodes)
    }

    pub(crate) fn outermost_in(&self, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::Forward => self.first(),
            Direction::Backward => self.last(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id]
    }

    /// Returns the in-order neighbour of a linked node, towards `forward`.
    pub(crate) fn next_in_order(&self, id: NodeId, forward: Side) -> Option<NodeId> {
        if let Some(mut next) = self.nodes[id].child(forward) {
            while let Some(child) = self.nodes[next].child(forward.opposite()) {
                next = child;
            }
            Some(next)
        } else {
            // Climb until we arrive from the backward side.
            let mut current = id;
            let mut next = self.nodes[id].parent;
            while let Some(parent_id) = next {
                if self.nodes[parent_id].child(forward) != Some(current) {
                    break;
                }
                current = parent_id;
                next = self.nodes[parent_id].parent;
            }
            next
        }
    }

    fn outermost(&self, side: Side) -> Option<NodeId> {
        let mut current = self.root?;
        while let Some(child) = self.nodes[current].child(side) {
            current = child;
        }
        Some(current)
    }

    fn side_of(&self, child: NodeId, parent: NodeId) -> Side {
        if self.nodes[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent_id) => {
                let side = self.side_of(old, parent_id);
                self.nodes[parent_id].set_child(side, new);
            }
        }
    }

    // Moves `a` down towards `dir`, lifting its child on the other side.
    // Balance factors are left to the caller.
    fn rotate(&mut self, a: NodeId, dir: Side) {
        let b = self.nodes[a]
            .child(dir.opposite())
            .expect("rotation requires a child on the lifted side");
        let e = self.nodes[b].child(dir);
        let p = self.nodes[a].parent;

        self.nodes[a].set_child(dir.opposite(), e);
        self.nodes[a].parent = Some(b);

        self.nodes[b].set_child(dir, Some(a));
        self.nodes[b].parent = p;

        if let Some(e) = e {
            self.nodes[e].parent = Some(a);
        }

        self.replace_child(p, a, Some(b));
        trace!(pivot = ?a, lifted = ?b, ?dir, "single rotation");
    }

    // Lifts the grandchild `e` (child of `b` towards `dir`) above both `b`
    // and `a`, where `b` is the child of `a` away from `dir`. Recomputes all
    // three balance factors and returns `e`, the new subtree root.
    fn double_rotate(&mut self, b: NodeId, a: NodeId, dir: Side) -> NodeId {
        let e = self.nodes[b]
            .child(dir)
            .expect("double rotation requires an inner grandchild");
        let f = self.nodes[e].child(dir.opposite());
        let g = self.nodes[e].child(dir);
        let p = self.nodes[a].parent;
        let e_balance = self.nodes[e].balance;
        let sign = dir.sign();

        let a_node = &mut self.nodes[a];
        a_node.set_child(dir.opposite(), g);
        a_node.parent = Some(e);
        a_node.balance = if sign * e_balance >= 0 { 0 } else { -e_balance };

        let b_node = &mut self.nodes[b];
        b_node.set_child(dir, f);
        b_node.parent = Some(e);
        b_node.balance = if sign * e_balance <= 0 { 0 } else { -e_balance };

        let e_node = &mut self.nodes[e];
        e_node.set_child(dir, Some(a));
        e_node.set_child(dir.opposite(), Some(b));
        e_node.parent = p;
        e_node.balance = 0;

        if let Some(g) = g {
            self.nodes[g].parent = Some(a);
        }
        if let Some(f) = f {
            self.nodes[f].parent = Some(b);
        }

        self.replace_child(p, a, Some(e));
        trace!(pivot = ?a, lifted = ?e, ?dir, "double rotation");
        e
    }

    // `node` is the child of `parent` on `side`, and that subtree just grew
    // by one level. Returns whether the height of `parent`'s subtree is
    // settled, i.e. propagation can stop.
    fn handle_subtree_growth(&mut self, node: NodeId, parent: NodeId, side: Side) -> bool {
        let sign = side.sign();
        let old_balance = self.nodes[parent].balance;
        if old_balance == 0 {
            self.nodes[parent].balance = sign;
            return false;
        }

        if old_balance + sign == 0 {
            self.nodes[parent].balance = 0;
            return true;
        }

        // `parent` is now two levels heavier on `side`.
        if sign * self.nodes[node].balance > 0 {
            self.rotate(parent, side.opposite());
            self.nodes[parent].balance -= sign;
            self.nodes[node].balance -= sign;
        } else {
            self.double_rotate(node, parent, side.opposite());
        }
        true
    }

    fn rebalance_after_insert(&mut self, inserted: NodeId) {
        let Some(mut parent) = self.nodes[inserted].parent else {
            return;
        };
        let side = self.side_of(inserted, parent);
        self.nodes[parent].balance += side.sign();
        if self.nodes[parent].balance == 0 {
            return;
        }

        loop {
            let node = parent;
            parent = match self.nodes[node].parent {
                None => return,
                Some(parent) => parent,
            };
            let side = self.side_of(node, parent);
            if self.handle_subtree_growth(node, parent, side) {
                return;
            }
        }
    }

    // The subtree of `parent` on `shrunk` just lost one level. Returns the
    // next ancestor whose subtree shrank as well, with the side it shrank on.
    fn handle_subtree_shrink(&mut self, parent: NodeId, shrunk: Side) -> Option<(NodeId, Side)> {
        let heavy = shrunk.opposite();
        let sign = heavy.sign();
        let old_balance = self.nodes[parent].balance;
        if old_balance == 0 {
            self.nodes[parent].balance = sign;
            return None;
        }

        let node = if old_balance + sign == 0 {
            self.nodes[parent].balance = 0;
            parent
        } else {
            let node = self.nodes[parent]
                .child(heavy)
                .expect("heavy side of an unbalanced node cannot be empty");
            if sign * self.nodes[node].balance >= 0 {
                self.rotate(parent, shrunk);
                if self.nodes[node].balance == 0 {
                    // Height is unchanged by the rotation.
                    self.nodes[node].balance -= sign;
                    return None;
                }
                self.nodes[parent].balance -= sign;
                self.nodes[node].balance -= sign;
                node
            } else {
                self.double_rotate(node, parent, shrunk)
            }
        };

        let parent = self.nodes[node].parent?;
        Some((parent, self.side_of(node, parent)))
    }

    // Moves the in-order successor of `x` into `x`'s position. Returns the
    // node where rebalancing starts and the side of it that shrank.
    fn swap_with_successor(&mut self, x: NodeId) -> (NodeId, Side) {
        let x_left = self.nodes[x].left.expect("successor swap requires a left child");
        let x_right = self.nodes[x].right.expect("successor swap requires a right child");

        let mut y = x_right;
        let rebalance_from = if self.nodes[y].left.is_none() {
            (y, Side::Right)
        } else {
            let mut q = y;
            while let Some(left) = self.nodes[y].left {
                q = y;
                y = left;
            }

            // Successor has no left child, splice it out of its subtree.
            let y_right = self.nodes[y].right;
            self.nodes[q].left = y_right;
            if let Some(y_right) = y_right {
                self.nodes[y_right].parent = Some(q);
            }
            self.nodes[y].right = Some(x_right);
            self.nodes[x_right].parent = Some(y);
            (q, Side::Left)
        };

        self.nodes[y].left = Some(x_left);
        self.nodes[x_left].parent = Some(y);

        let x_parent = self.nodes[x].parent;
        let x_balance = self.nodes[x].balance;
        self.nodes[y].parent = x_parent;
        self.nodes[y].balance = x_balance;
        self.replace_child(x_parent, x, Some(y));

        rebalance_from
    }

    // Removes a linked node from the tree structure and detaches it.
    fn unlink_node(&mut self, id: NodeId) {
        debug_assert!(self.num_nodes >= 1);
        if self.first.get() == Some(id) {
            self.first.set(None);
        }
        self.num_nodes -= 1;

        let node = &self.nodes[id];
        let (left, right, parent) = (node.left, node.right, node.parent);
        let (mut parent, mut shrunk) = if left.is_some() && right.is_some() {
            self.swap_with_successor(id)
        } else {
            let child = left.or(right);
            match parent {
                None => {
                    if let Some(child) = child {
                        self.nodes[child].parent = None;
                    }
                    self.root = child;
                    self.nodes[id].reset(id);
                    return;
                }
                Some(parent) => {
                    let side = self.side_of(id, parent);
                    self.nodes[parent].set_child(side, child);
                    if let Some(child) = child {
                        self.nodes[child].parent = Some(parent);
                    }
                    (parent, side)
                }
            }
        };

        while let Some((next, side)) = self.handle_subtree_shrink(parent, shrunk) {
            parent = next;
            shrunk = side;
        }
        self.nodes[id].reset(id);
    }

    fn link_node(&mut self, id: NodeId, parent: Option<NodeId>, side: Side) {
        {
            let node = &mut self.nodes[id];
            node.parent = parent;
            node.left = None;
            node.right = None;
            node.balance = 0;
        }
        match parent {
            None => self.root = Some(id),
            Some(parent_id) => {
                // Only a left child of the minimum can become the new minimum.
                if side == Side::Left && self.first.get() == Some(parent_id) {
                    self.first.set(None);
                }
                self.nodes[parent_id].set_child(side, Some(id));
            }
        }
        self.rebalance_after_insert(id);
        self.num_nodes += 1;
    }
}

impl<K, V, C: Comparator<K>> AvlTree<K, V, C> {
    /// Creates an empty tree ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::from_parts(comparator, Arena::new())
    }

    /// Returns the node holding `key`, or `None` if the key is absent.
    pub fn find(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match self.comparator.compare(key, &node.key) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        current
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|id| &self.nodes[id].value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find(key)?;
        Some(&mut self.nodes[id].value)
    }

    /// Returns true if the tree holds a node for the key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair unless the key is already present.
    ///
    /// Returns the new node, or the existing node for an equal key. In the
    /// latter case the existing entry is left untouched and `key` and
    /// `value` are dropped.
    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        match self.find_insert_pos(&key) {
            InsertPos::Occupied(existing) => existing,
            InsertPos::Vacant { parent, side } => {
                let id = self.nodes.alloc(Node::new(key, value));
                self.link_node(id, parent, side);
                trace!(?id, len = self.num_nodes, "inserted node");
                id
            }
        }
    }

    /// Allocates a detached node owned by this tree without linking it.
    /// Link it with [`insert_node`](Self::insert_node).
    pub fn alloc_node(&mut self, key: K, value: V) -> NodeId {
        let id = self.nodes.alloc(Node::new(key, value));
        self.nodes[id].reset(id);
        id
    }

    /// Links a detached node into the tree.
    ///
    /// Returns `id` once linked, or the existing node if its key is already
    /// present, in which case the supplied node stays detached and unused.
    pub fn insert_node(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.nodes.get(id).ok_or(Error::StaleHandle)?;
        if !node.is_detached(id) {
            debug!(?id, "refusing to insert a linked node");
            return Err(Error::AlreadyLinked);
        }
        match self.find_insert_pos(&node.key) {
            InsertPos::Occupied(existing) => Ok(existing),
            InsertPos::Vacant { parent, side } => {
                self.link_node(id, parent, side);
                trace!(?id, len = self.num_nodes, "linked node");
                Ok(id)
            }
        }
    }

    /// Removes a node from the tree.
    ///
    /// The node is detached, not freed: its key and value stay readable
    /// through `id` until it is [released](Self::release) or linked again.
    ///
    /// # Errors
    ///
    /// [`Error::NotInTree`] if the node is detached, [`Error::StaleHandle`]
    /// if it has been released. The tree is unchanged in both cases.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(Error::StaleHandle)?;
        if node.is_detached(id) {
            debug!(?id, "refusing to remove a detached node");
            return Err(Error::NotInTree);
        }
        self.unlink_node(id);
        trace!(?id, len = self.num_nodes, "removed node");
        Ok(())
    }

    /// Removes a key from the tree.
    /// Returns the key-value pair if the key was previously in the tree.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.find(key)?;
        self.unlink_node(id);
        trace!(?id, len = self.num_nodes, "removed node");
        self.nodes.take(id).map(|node| (node.key, node.value))
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check root link
        if let Some(root) = self.root {
            assert!(self.nodes[root].parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        self.check_subtree(self.root, None, &mut num_nodes);

        // Check number of nodes
        assert_eq!(num_nodes, self.num_nodes);
        assert!(self.nodes.len() >= self.num_nodes);

        // Check memoized minimum
        if let Some(first) = self.first.get() {
            assert_eq!(Some(first), self.outermost(Side::Left));
        }
    }

    // Returns the number of levels of the subtree.
    #[cfg(any(test, feature = "consistency_check"))]
    fn check_subtree(&self, link: Option<NodeId>, parent: Option<NodeId>, num_nodes: &mut usize) -> i64 {
        let Some(id) = link else {
            return 0;
        };
        let node = &self.nodes[id];
        assert_eq!(node.parent, parent);

        if let Some(left) = node.left {
            assert_eq!(self.comparator.compare(&self.nodes[left].key, &node.key), Ordering::Less);
        }
        if let Some(right) = node.right {
            assert_eq!(self.comparator.compare(&self.nodes[right].key, &node.key), Ordering::Greater);
        }

        let left_height = self.check_subtree(node.left, Some(id), num_nodes);
        let right_height = self.check_subtree(node.right, Some(id), num_nodes);

        // Check AVL condition and the stored balance factor
        assert!((-1..=1).contains(&node.balance));
        assert_eq!(i64::from(node.balance), right_height - left_height);

        *num_nodes += 1;
        1 + left_height.max(right_height)
    }

    fn find_insert_pos(&self, key: &K) -> InsertPos {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            side = match self.comparator.compare(key, &node.key) {
                Ordering::Equal => return InsertPos::Occupied(id),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            parent = Some(id);
            current = node.child(side);
        }
        InsertPos::Vacant { parent, side }
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for AvlTree<K, V, C> {
    /// Inserts every pair whose key is not yet present.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AvlTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
