use crate::arena::Arena;
use crate::compare::Comparator;
use crate::error::{Error, Result};
use crate::tree::AvlTree;

/// Configures and builds an [`AvlTree`].
///
/// ```
/// use avl_engine::Builder;
/// let mut tree = Builder::new()
///     .comparator(|a: &&str, b: &&str| a.len().cmp(&b.len()))
///     .capacity(16)
///     .build::<&str, u32>()
///     .unwrap();
/// tree.insert("three", 3);
/// tree.insert("one", 1);
/// assert_eq!(tree.get(&"two"), Some(&1));
/// ```
#[derive(Clone, Debug)]
pub struct Builder<C> {
    comparator: Option<C>,
    capacity: usize,
}

impl<C> Builder<C> {
    pub fn new() -> Self {
        Self {
            comparator: None,
            capacity: 0,
        }
    }

    /// Sets the order of the tree's keys. Required.
    pub fn comparator(mut self, comparator: C) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Reserves node storage for `capacity` elements up front.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds an empty tree.
    ///
    /// # Errors
    ///
    /// [`Error::MissingComparator`] if no comparator has been set.
    pub fn build<K, V>(self) -> Result<AvlTree<K, V, C>>
    where
        C: Comparator<K>,
    {
        let comparator = self.comparator.ok_or(Error::MissingComparator)?;
        Ok(AvlTree::from_parts(comparator, Arena::with_capacity(self.capacity)))
    }
}

impl<C> Default for Builder<C> {
    fn default() -> Self {
        Self::new()
    }
}
