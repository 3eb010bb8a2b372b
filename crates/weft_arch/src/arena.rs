//! Generic arena for dense, ID-indexed storage of architecture entities.
//!
//! The [`Arena`] provides O(1) insertion and lookup by opaque [`ArenaId`] keys.
//! Entities are never removed, so handles stay valid for the lifetime of the
//! context and survive a snapshot round trip unchanged.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
///
/// Implementors must provide a bijection between `u32` indices and the ID type.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// A dense, ID-indexed container.
///
/// Items are always appended (never reordered or removed), making IDs stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Allocates a new item in the arena and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns the ID the next [`alloc`](Self::alloc) will hand out.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Returns a reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns a reference to the item, or `None` if the ID is out of bounds.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.items.get(id.as_raw() as usize)
    }

    /// Returns a mutable reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Returns `true` if `id` refers to an allocated item.
    pub fn contains(&self, id: I) -> bool {
        (id.as_raw() as usize) < self.items.len()
    }

    /// Returns the number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over `(ID, &mut T)` pairs in allocation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over all IDs in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len() as u32).map(I::from_raw)
    }

    /// Iterates over references to items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Returns the items as a slice, indexed by raw ID.
    ///
    /// Used by passes that fan work out with rayon.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SegmentId;

    #[test]
    fn alloc_and_get() {
        let mut arena: Arena<SegmentId, &str> = Arena::new();
        let a = arena.alloc("L1");
        let b = arena.alloc("L2");
        assert_eq!(*arena.get(a), "L1");
        assert_eq!(arena[b], "L2");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn next_id_matches_alloc() {
        let mut arena: Arena<SegmentId, u32> = Arena::new();
        let predicted = arena.next_id();
        assert_eq!(arena.alloc(7), predicted);
    }

    #[test]
    fn try_get_out_of_bounds() {
        let mut arena: Arena<SegmentId, u32> = Arena::new();
        let id = arena.alloc(1);
        assert_eq!(arena.try_get(id), Some(&1));
        assert!(arena.try_get(SegmentId::from_raw(5)).is_none());
        assert!(!arena.contains(SegmentId::from_raw(5)));
    }

    #[test]
    fn iteration_in_allocation_order() {
        let mut arena: Arena<SegmentId, u32> = Arena::new();
        arena.alloc(10);
        arena.alloc(20);
        let ids: Vec<u32> = arena.ids().map(|id| id.as_raw()).collect();
        assert_eq!(ids, vec![0, 1]);
        let values: Vec<u32> = arena.values().copied().collect();
        assert_eq!(values, vec![10, 20]);
    }

    #[test]
    fn index_mut_updates() {
        let mut arena: Arena<SegmentId, u32> = Arena::new();
        let id = arena.alloc(1);
        arena[id] = 4;
        assert_eq!(arena.as_slice(), &[4]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut arena: Arena<SegmentId, String> = Arena::new();
        arena.alloc("a".to_string());
        arena.alloc("b".to_string());
        let json = serde_json::to_string(&arena).unwrap();
        let back: Arena<SegmentId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(arena, back);
    }
}
