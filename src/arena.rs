use std::ops::{Index, IndexMut};

use crate::node::NodeId;

struct Slot<T> {
    generation: u32,
    element: Option<T>,
}

/// Slot storage for tree nodes.
///
/// Freed slots are recycled, and every free bumps the slot generation so
/// that handles to the previous occupant no longer resolve.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> NodeId {
        if let Some(index) = self.free.pop() {
            // Reuse a free slot, its generation was bumped when it was freed.
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.element.is_none());
            slot.element = Some(element);
            NodeId::new(index, slot.generation)
        } else {
            assert!(
                self.slots.len() < u32::MAX as usize,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                u32::MAX
            );
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            NodeId::new(index, 0)
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index()) {
            Some(slot) if slot.generation == id.generation() => slot.element.as_ref(),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.generation == id.generation() => slot.element.as_mut(),
            _ => None,
        }
    }

    pub(crate) fn take(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let element = slot.element.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        Some(element)
    }

    /// Drops every element. Slots are kept for reuse under a new generation.
    pub(crate) fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.element.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: NodeId) -> &T {
        self.get(id).expect("`Arena::index()` - `id` is invalid!")
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id).expect("`Arena::index_mut()` - `id` is invalid!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_get() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena[b], "b");
        *arena.get_mut(a).unwrap() = "c";
        assert_eq!(arena[a], "c");
    }

    #[test]
    fn test_take_invalidates_handle() {
        let mut arena = Arena::with_capacity(4);
        let a = arena.alloc(1);
        assert_eq!(arena.take(a), Some(1));
        assert_eq!(arena.take(a), None);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.len(), 0);

        // The slot is reused, but the old handle must not see the new element.
        let b = arena.alloc(2);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn test_clear() {
        let mut arena = Arena::new();
        let handles: Vec<_> = (0..16).map(|i| arena.alloc(i)).collect();
        arena.clear();
        assert_eq!(arena.len(), 0);
        for &handle in &handles {
            assert!(arena.get(handle).is_none());
        }
        let fresh = arena.alloc(42);
        assert_eq!(arena.len(), 1);
        assert!(!handles.contains(&fresh));
        assert_eq!(arena[fresh], 42);
    }
}
