use std::cmp::Ordering;

/// Total order over the keys of a tree.
///
/// The tree always passes the caller supplied key as `query` and the key
/// stored in the tree as `stored`. The order must stay the same for as long
/// as the tree holds keys; changing it afterwards leaves the tree corrupt.
///
/// Any `Fn(&K, &K) -> Ordering` closure is a comparator:
///
/// ```
/// use avl_engine::AvlTree;
/// let mut tree = AvlTree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// tree.insert(1, ());
/// tree.insert(2, ());
/// let first = tree.first().unwrap();
/// assert_eq!(tree.key(first), Ok(&2));
/// ```
pub trait Comparator<K: ?Sized> {
    fn compare(&self, query: &K, stored: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, query: &K, stored: &K) -> Ordering {
        query.cmp(stored)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, query: &K, stored: &K) -> Ordering {
        self(query, stored)
    }
}
