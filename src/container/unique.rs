//! The unique-elements facade.
//!
//! [`UniqueContainer`] drops duplicates when it materializes and rejects
//! them afterwards. It is backed by a `HashSet` unless another
//! [`UniqueStore`] is supplied; `BTreeSet` gives sorted iteration.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::vec;

use super::membership::MembershipMode;
use super::source::LazySource;
use super::store::UniqueStore;
use super::validatable::{IntoIter, Validatable};
use super::{ContainerError, Element};
use crate::sequence::Sequence;

/// A lazily materialized, thread-safe set.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::container::UniqueContainer;
/// use std::collections::BTreeSet;
///
/// let set = UniqueContainer::with_backing(vec![3, 1, 3, 2], BTreeSet::new()).unwrap();
/// set.add(1);
/// assert!(!set.is_validated());
///
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.to_vec(), vec![1, 2, 3]);
///
/// // Once materialized, a duplicate is reported as a no-op.
/// assert!(!set.add(2));
/// ```
pub struct UniqueContainer<T, B = HashSet<T>> {
    core: Validatable<T, B>,
}

impl<T: Element + Eq + Hash> UniqueContainer<T> {
    /// Creates an empty set backed by a `HashSet`.
    pub fn new() -> Self {
        Self::from_source(LazySource::empty())
    }

    /// Creates a set over `source`, backed by a `HashSet`.
    pub fn from_source(source: impl Into<LazySource<T>>) -> Self {
        Self {
            core: Validatable::from_empty(source.into(), HashSet::new()),
        }
    }
}

impl<T: Element + Eq + Hash, B: UniqueStore<T>> UniqueContainer<T, B> {
    /// Creates a set over `source` that materializes into `backing`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NonEmptyBacking`] if `backing` holds elements.
    pub fn with_backing(source: impl Into<LazySource<T>>, backing: B) -> Result<Self, ContainerError> {
        Self::with_options(source, backing, MembershipMode::Direct)
    }

    /// Creates a set with an explicit membership mode.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NonEmptyBacking`] if `backing` holds elements.
    pub fn with_options(
        source: impl Into<LazySource<T>>,
        backing: B,
        mode: MembershipMode,
    ) -> Result<Self, ContainerError> {
        Ok(Self {
            core: Validatable::with_options(source.into(), backing, mode)?,
        })
    }

    /// Enables the membership cache.
    #[must_use]
    pub fn with_membership_cache(self) -> Self {
        self.core.set_membership_mode(MembershipMode::Cached);
        self
    }

    /// Returns `true` once the source has been drained or discarded.
    pub fn is_validated(&self) -> bool {
        self.core.is_validated()
    }

    /// Returns `true` if draining the source panicked.
    pub fn is_poisoned(&self) -> bool {
        self.core.is_poisoned()
    }

    /// Forces materialization, dropping duplicates.
    pub fn validate(&self) {
        self.core.validate();
    }

    /// Returns the membership mode.
    pub fn membership_mode(&self) -> MembershipMode {
        self.core.membership_mode()
    }

    /// Runs `reader` against the materialized backing store.
    pub fn read<R>(&self, reader: impl FnOnce(&B) -> R) -> R {
        self.core.read("read", reader)
    }

    /// Returns `true` if the set is empty, without materializing it.
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// Returns the number of distinct elements.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if `element` is present.
    ///
    /// With the membership cache enabled and a replayable source, this does
    /// not materialize the set.
    pub fn contains(&self, element: &T) -> bool {
        self.core.contains(element)
    }

    /// Returns `true` if every element of `elements` is present.
    pub fn contains_all<'a, I>(&self, elements: I) -> bool
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.core.contains_all(elements)
    }

    /// Visits every distinct element once.
    pub fn for_each<F: FnMut(&T)>(&self, action: F) {
        self.core.for_each(action);
    }

    /// Returns an iterator over a snapshot of the elements.
    pub fn iter(&self) -> vec::IntoIter<T> {
        self.core.iter()
    }

    /// Copies the elements into a `Vec`, in store order.
    pub fn to_vec(&self) -> Vec<T> {
        self.core.to_vec()
    }

    /// Adds `element`.
    ///
    /// Returns `false` only when the set is materialized and already holds
    /// an equal element.
    pub fn add(&self, element: T) -> bool {
        self.core.add(element)
    }

    /// Adds every element of `elements`.
    pub fn add_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
        self.core.add_all(elements)
    }

    /// Appends a sequence without draining it.
    pub fn chain(&self, source: impl Into<LazySource<T>>) {
        self.core.chain(source.into());
    }

    /// Removes `element`. While lazy, every occurrence in the pending source
    /// is filtered out.
    pub fn remove(&self, element: &T) -> bool {
        self.core.remove(element)
    }

    /// Removes every element equal to one of `elements`.
    pub fn remove_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
        self.core.remove_all(elements)
    }

    /// Removes every element accepted by `predicate`.
    pub fn remove_if<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.core.remove_if(predicate)
    }

    /// Keeps only the elements accepted by `predicate`.
    pub fn retain<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.core.retain(predicate)
    }

    /// Keeps only the elements equal to one of `elements`.
    pub fn retain_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
        self.core.retain_all(elements)
    }

    /// Removes every element. A lazy set drops its source undrained.
    pub fn clear(&self) {
        self.core.clear();
    }

    /// Materializes the set and returns its backing store.
    pub fn into_backing(self) -> B {
        self.core.into_backing()
    }
}

impl<T: Element + Eq + Hash> Default for UniqueContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element + Eq + Hash> FromIterator<T> for UniqueContainer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        Self::from_source(LazySource::from_vec(iterable.into_iter().collect()))
    }
}

impl<T: Element + Eq + Hash> From<Sequence<T>> for UniqueContainer<T> {
    fn from(sequence: Sequence<T>) -> Self {
        Self::from_source(sequence)
    }
}

impl<T: Element + Eq + Hash, B: UniqueStore<T>> Extend<T> for UniqueContainer<T, B> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iterable: I) {
        self.add_all(iterable);
    }
}

impl<T, B> IntoIterator for UniqueContainer<T, B>
where
    T: Element + Eq + Hash,
    B: UniqueStore<T> + IntoIterator<Item = T>,
    B::IntoIter: Send + 'static,
{
    type Item = T;
    type IntoIter = IntoIter<T>;

    /// Consumes the set. Duplicates are dropped by materializing first.
    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(Box::new(self.core.into_backing().into_iter()))
    }
}

impl<T, B: fmt::Debug> fmt::Debug for UniqueContainer<T, B> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("UniqueContainer")
            .field(&self.core)
            .finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T, B> serde::Serialize for UniqueContainer<T, B>
where
    T: Element + Eq + Hash + serde::Serialize,
    B: UniqueStore<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.core
            .read("serialize", |backing| serializer.collect_seq(backing.iter()))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for UniqueContainer<T>
where
    T: Element + Eq + Hash + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements = <Vec<T> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::from_source(elements))
    }
}
