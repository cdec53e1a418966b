/// A stable handle to a node of an [`AvlTree`](crate::AvlTree).
///
/// Handles stay valid while the node is linked into the tree and after it
/// has been removed (detached). Once a detached node is released the handle
/// goes stale and every accessor reports [`Error::StaleHandle`](crate::Error::StaleHandle).
///
/// A handle belongs to the tree that issued it. Handing it to another tree
/// reports `StaleHandle` if its slot does not exist there, but may resolve
/// to an unrelated node if it does.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Balance factor change caused by this side growing by one level.
    #[inline]
    pub(crate) const fn sign(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }
}

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // `Some(own id)` while detached, `None` for the root.
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    // Height of right subtree minus height of left subtree.
    pub(crate) balance: i8,
}

impl<K, V> Node<K, V> {
    /// Creates an unlinked node. Its links are placeholders until
    /// `link_node` or `reset` sets them.
    pub(crate) fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            parent: None,
            left: None,
            right: None,
            balance: 0,
        }
    }

    #[inline]
    pub(crate) fn is_detached(&self, id: NodeId) -> bool {
        self.parent == Some(id)
    }

    /// Puts the node into the detached state. Key and value are left intact.
    pub(crate) fn reset(&mut self, id: NodeId) {
        self.parent = Some(id);
        self.left = None;
        self.right = None;
        self.balance = 0;
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}
