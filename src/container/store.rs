//! Backing stores a container materializes into.
//!
//! A container only needs a handful of capabilities from its store: empty
//! construction is the caller's job, and everything else is described by
//! [`BackingStore`]. The ordered facade additionally needs positional access
//! through [`OrderedStore`]; the unique facade requires the
//! [`UniqueStore`] marker.

use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hash};

/// The capabilities a container needs from its concrete store.
pub trait BackingStore<T> {
    /// `true` if inserting an element already present is a no-op.
    const DEDUPLICATES: bool;

    /// Returns `true` if the store holds no element.
    fn is_empty(&self) -> bool;

    /// Returns the number of stored elements.
    fn len(&self) -> usize;

    /// Inserts `element`, returning `true` if the store changed.
    fn insert(&mut self, element: T) -> bool;

    /// Returns `true` if inserting `element` would change the store.
    fn admits(&self, element: &T) -> bool;

    /// Returns `true` if an equal element is stored.
    fn contains(&self, element: &T) -> bool;

    /// Removes one element equal to `element`, returning `true` if found.
    fn remove(&mut self, element: &T) -> bool;

    /// Keeps only the elements accepted by `predicate`.
    fn retain<F: FnMut(&T) -> bool>(&mut self, predicate: F);

    /// Removes every element.
    fn clear(&mut self);

    /// Iterates the stored elements in store order.
    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a;

    /// Inserts every element, returning how many changed the store.
    fn insert_all<I: IntoIterator<Item = T>>(&mut self, elements: I) -> usize {
        elements
            .into_iter()
            .map(|element| self.insert(element))
            .filter(|changed| *changed)
            .count()
    }
}

/// A store that keeps elements in a caller-visible order and allows
/// positional access.
pub trait OrderedStore<T>: BackingStore<T> {
    /// The stored elements in order.
    fn as_slice(&self) -> &[T];

    /// The stored elements in order, mutably.
    fn as_mut_slice(&mut self) -> &mut [T];

    /// Inserts `element` at `index`, shifting later elements.
    ///
    /// Callers guarantee `index <= len`.
    fn insert_at(&mut self, index: usize, element: T);

    /// Removes and returns the element at `index`.
    ///
    /// Callers guarantee `index < len`.
    fn remove_at(&mut self, index: usize) -> T;

    /// Inserts `elements` starting at `index`, in order.
    ///
    /// Callers guarantee `index <= len`.
    fn insert_all_at(&mut self, index: usize, elements: Vec<T>) {
        for (offset, element) in elements.into_iter().enumerate() {
            self.insert_at(index + offset, element);
        }
    }
}

/// Marker for stores that reject duplicates.
pub trait UniqueStore<T>: BackingStore<T> {}

// =============================================================================
// Vec
// =============================================================================

impl<T: PartialEq> BackingStore<T> for Vec<T> {
    const DEDUPLICATES: bool = false;

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn insert(&mut self, element: T) -> bool {
        self.push(element);
        true
    }

    fn admits(&self, _element: &T) -> bool {
        true
    }

    fn contains(&self, element: &T) -> bool {
        self.as_slice().contains(element)
    }

    fn remove(&mut self, element: &T) -> bool {
        match self.as_slice().iter().position(|candidate| candidate == element) {
            Some(index) => {
                Self::remove(self, index);
                true
            }
            None => false,
        }
    }

    fn retain<F: FnMut(&T) -> bool>(&mut self, predicate: F) {
        Self::retain(self, predicate);
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        self.as_slice().iter()
    }
}

impl<T: PartialEq> OrderedStore<T> for Vec<T> {
    fn as_slice(&self) -> &[T] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    fn insert_at(&mut self, index: usize, element: T) {
        Self::insert(self, index, element);
    }

    fn remove_at(&mut self, index: usize) -> T {
        Self::remove(self, index)
    }

    fn insert_all_at(&mut self, index: usize, elements: Vec<T>) {
        drop(self.splice(index..index, elements));
    }
}

// =============================================================================
// SmallVec
// =============================================================================

#[cfg(feature = "smallvec")]
impl<A> BackingStore<A::Item> for smallvec::SmallVec<A>
where
    A: smallvec::Array,
    A::Item: PartialEq,
{
    const DEDUPLICATES: bool = false;

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn insert(&mut self, element: A::Item) -> bool {
        self.push(element);
        true
    }

    fn admits(&self, _element: &A::Item) -> bool {
        true
    }

    fn contains(&self, element: &A::Item) -> bool {
        self.as_slice().contains(element)
    }

    fn remove(&mut self, element: &A::Item) -> bool {
        match self.as_slice().iter().position(|candidate| candidate == element) {
            Some(index) => {
                Self::remove(self, index);
                true
            }
            None => false,
        }
    }

    fn retain<F: FnMut(&A::Item) -> bool>(&mut self, mut predicate: F) {
        Self::retain(self, |element| predicate(&*element));
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a A::Item>
    where
        A::Item: 'a,
    {
        self.as_slice().iter()
    }
}

#[cfg(feature = "smallvec")]
impl<A> OrderedStore<A::Item> for smallvec::SmallVec<A>
where
    A: smallvec::Array,
    A::Item: PartialEq,
{
    fn as_slice(&self) -> &[A::Item] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [A::Item] {
        self
    }

    fn insert_at(&mut self, index: usize, element: A::Item) {
        Self::insert(self, index, element);
    }

    fn remove_at(&mut self, index: usize) -> A::Item {
        Self::remove(self, index)
    }
}

// =============================================================================
// HashSet
// =============================================================================

impl<T, S> BackingStore<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    const DEDUPLICATES: bool = true;

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn insert(&mut self, element: T) -> bool {
        Self::insert(self, element)
    }

    fn admits(&self, element: &T) -> bool {
        !Self::contains(self, element)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn remove(&mut self, element: &T) -> bool {
        Self::remove(self, element)
    }

    fn retain<F: FnMut(&T) -> bool>(&mut self, predicate: F) {
        Self::retain(self, predicate);
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        Self::iter(self)
    }
}

impl<T, S> UniqueStore<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
}

// =============================================================================
// BTreeSet
// =============================================================================

impl<T: Ord> BackingStore<T> for BTreeSet<T> {
    const DEDUPLICATES: bool = true;

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn insert(&mut self, element: T) -> bool {
        Self::insert(self, element)
    }

    fn admits(&self, element: &T) -> bool {
        !Self::contains(self, element)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn remove(&mut self, element: &T) -> bool {
        Self::remove(self, element)
    }

    fn retain<F: FnMut(&T) -> bool>(&mut self, predicate: F) {
        Self::retain(self, predicate);
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        Self::iter(self)
    }
}

impl<T: Ord> UniqueStore<T> for BTreeSet<T> {}
