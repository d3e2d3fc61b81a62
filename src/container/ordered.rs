//! The ordered-sequence facade.
//!
//! [`OrderedContainer`] keeps source order, allows duplicates and offers
//! positional access. It is backed by a `Vec` unless another
//! [`OrderedStore`] is supplied.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::Hash;
use std::iter::Zip;
use std::ops::{Bound, RangeBounds, RangeFrom};
use std::vec;

use super::membership::MembershipMode;
use super::source::LazySource;
use super::store::OrderedStore;
use super::validatable::{IntoIter, Validatable};
use super::{ContainerError, Element};
use crate::sequence::Sequence;

/// A lazily materialized, thread-safe list.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::container::OrderedContainer;
///
/// let list = OrderedContainer::from_source(vec![1, 2, 3]);
/// list.add(4);
/// list.remove(&2);
/// assert!(!list.is_validated());
///
/// assert_eq!(list.get(1), Some(3));
/// assert!(list.is_validated());
/// assert_eq!(list.to_vec(), vec![1, 3, 4]);
/// ```
pub struct OrderedContainer<T, B = Vec<T>> {
    core: Validatable<T, B>,
}

impl<T: Element + PartialEq> OrderedContainer<T> {
    /// Creates an empty list backed by a `Vec`.
    pub fn new() -> Self {
        Self::from_source(LazySource::empty())
    }

    /// Creates a list over `source`, backed by a `Vec`.
    pub fn from_source(source: impl Into<LazySource<T>>) -> Self {
        Self {
            core: Validatable::from_empty(source.into(), Vec::new()),
        }
    }
}

impl<T: Element + PartialEq, B: OrderedStore<T>> OrderedContainer<T, B> {
    /// Creates a list over `source` that materializes into `backing`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NonEmptyBacking`] if `backing` holds elements.
    pub fn with_backing(source: impl Into<LazySource<T>>, backing: B) -> Result<Self, ContainerError> {
        Ok(Self {
            core: Validatable::new(source.into(), backing)?,
        })
    }

    /// Creates a list with an explicit membership mode.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NonEmptyBacking`] if `backing` holds elements.
    pub fn with_options(
        source: impl Into<LazySource<T>>,
        backing: B,
        mode: MembershipMode,
    ) -> Result<Self, ContainerError>
    where
        T: Eq + Hash,
    {
        Ok(Self {
            core: Validatable::with_options(source.into(), backing, mode)?,
        })
    }

    /// Enables the membership cache.
    #[must_use]
    pub fn with_membership_cache(self) -> Self
    where
        T: Eq + Hash,
    {
        self.core.set_membership_mode(MembershipMode::Cached);
        self
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Returns `true` once the source has been drained or discarded.
    pub fn is_validated(&self) -> bool {
        self.core.is_validated()
    }

    /// Returns `true` if draining the source panicked.
    pub fn is_poisoned(&self) -> bool {
        self.core.is_poisoned()
    }

    /// Forces materialization.
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

    // =========================================================================
    // Size and Membership
    // =========================================================================

    /// Returns `true` if the list is empty, without materializing it.
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if an equal element is present.
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

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Visits every element in order, materializing during the same pass if
    /// the list is still lazy.
    pub fn for_each<F: FnMut(&T)>(&self, action: F) {
        self.core.for_each(action);
    }

    /// Returns an iterator over a snapshot of the elements.
    pub fn iter(&self) -> vec::IntoIter<T> {
        self.core.iter()
    }

    /// Copies the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.core.to_vec()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Appends `element`. Always returns `true`.
    pub fn add(&self, element: T) -> bool {
        self.core.add(element)
    }

    /// Appends every element of `elements`.
    pub fn add_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
        self.core.add_all(elements)
    }

    /// Appends a sequence without draining it.
    pub fn chain(&self, source: impl Into<LazySource<T>>) {
        self.core.chain(source.into());
    }

    /// Removes the first element equal to `element`.
    ///
    /// While lazy the removal is recorded and `true` is returned.
    pub fn remove(&self, element: &T) -> bool {
        self.core.remove(element)
    }

    /// Removes every element equal to one of `elements`.
    pub fn remove_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool
    where
        T: Eq + Hash,
    {
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
    pub fn retain_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool
    where
        T: Eq + Hash,
    {
        self.core.retain_all(elements)
    }

    /// Removes every element. A lazy list drops its source undrained.
    pub fn clear(&self) {
        self.core.clear();
    }

    // =========================================================================
    // Positional Access
    // =========================================================================

    /// Returns a copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.core
            .read("get", |backing| backing.as_slice().get(index).cloned())
    }

    /// Returns a copy of the first element.
    pub fn first(&self) -> Option<T> {
        self.core
            .read("first", |backing| backing.as_slice().first().cloned())
    }

    /// Returns a copy of the last element.
    pub fn last(&self) -> Option<T> {
        self.core
            .read("last", |backing| backing.as_slice().last().cloned())
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::IndexOutOfBounds`] if `index >= len`.
    pub fn set(&self, index: usize, element: T) -> Result<T, ContainerError> {
        self.core.modify("set", |backing| {
            let len = backing.len();
            backing
                .as_mut_slice()
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, element))
                .ok_or(ContainerError::IndexOutOfBounds { index, len })
        })
    }

    /// Inserts `element` at `index`, shifting later elements.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::IndexOutOfBounds`] if `index > len`.
    pub fn insert_at(&self, index: usize, element: T) -> Result<(), ContainerError> {
        self.core.modify("insert_at", |backing| {
            let len = backing.len();
            if index > len {
                return Err(ContainerError::IndexOutOfBounds { index, len });
            }
            backing.insert_at(index, element);
            Ok(())
        })
    }

    /// Inserts `elements` at `index`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::IndexOutOfBounds`] if `index > len`.
    pub fn insert_all_at<I>(&self, index: usize, elements: I) -> Result<(), ContainerError>
    where
        I: IntoIterator<Item = T>,
    {
        let elements: Vec<T> = elements.into_iter().collect();
        self.core.modify("insert_all_at", |backing| {
            let len = backing.len();
            if index > len {
                return Err(ContainerError::IndexOutOfBounds { index, len });
            }
            backing.insert_all_at(index, elements);
            Ok(())
        })
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::IndexOutOfBounds`] if `index >= len`.
    pub fn remove_at(&self, index: usize) -> Result<T, ContainerError> {
        self.core.modify("remove_at", |backing| {
            let len = backing.len();
            if index >= len {
                return Err(ContainerError::IndexOutOfBounds { index, len });
            }
            Ok(backing.remove_at(index))
        })
    }

    /// Returns the position of the first element equal to `element`.
    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.core.read("index_of", |backing| {
            backing.as_slice().iter().position(|candidate| candidate == element)
        })
    }

    /// Returns the position of the last element equal to `element`.
    pub fn last_index_of(&self, element: &T) -> Option<usize> {
        self.core.read("last_index_of", |backing| {
            backing.as_slice().iter().rposition(|candidate| candidate == element)
        })
    }

    /// Copies the elements in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidRange`] if the range is reversed or
    /// extends past the end.
    pub fn sub_list<R: RangeBounds<usize>>(&self, range: R) -> Result<Vec<T>, ContainerError> {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = range.end_bound().cloned();
        self.core.read("sub_list", |backing| {
            let slice = backing.as_slice();
            let len = slice.len();
            let end = match end {
                Bound::Included(end) => end.saturating_add(1),
                Bound::Excluded(end) => end,
                Bound::Unbounded => len,
            };
            slice
                .get(start..end)
                .map(<[T]>::to_vec)
                .ok_or(ContainerError::InvalidRange { start, end, len })
        })
    }

    /// Iterates a snapshot of the elements from `index` on, paired with
    /// their positions.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::IndexOutOfBounds`] if `index > len`.
    pub fn enumerate_from(
        &self,
        index: usize,
    ) -> Result<Zip<RangeFrom<usize>, vec::IntoIter<T>>, ContainerError> {
        self.core.read("enumerate_from", |backing| {
            let slice = backing.as_slice();
            slice
                .get(index..)
                .map(|tail| (index..).zip(tail.to_vec()))
                .ok_or(ContainerError::IndexOutOfBounds {
                    index,
                    len: slice.len(),
                })
        })
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    /// Sorts the elements. The sort is stable.
    pub fn sort(&self)
    where
        T: Ord,
    {
        self.core
            .reorder("sort", |backing| backing.as_mut_slice().sort());
    }

    /// Sorts the elements with `compare`.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&T, &T) -> CmpOrdering,
    {
        self.core
            .reorder("sort_by", |backing| backing.as_mut_slice().sort_by(compare));
    }

    /// Sorts the elements by the key `extract` returns.
    pub fn sort_by_key<K, F>(&self, extract: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.core.reorder("sort_by_key", |backing| {
            backing.as_mut_slice().sort_by_key(extract);
        });
    }

    /// Replaces every element with `transform` applied to it.
    pub fn replace_all<F>(&self, mut transform: F)
    where
        F: FnMut(&T) -> T,
    {
        self.core.modify("replace_all", |backing| {
            for slot in backing.as_mut_slice() {
                *slot = transform(slot);
            }
        });
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Materializes the list and returns its backing store.
    pub fn into_backing(self) -> B {
        self.core.into_backing()
    }
}

impl<T: Element + PartialEq> Default for OrderedContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element + PartialEq> FromIterator<T> for OrderedContainer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        Self::from_source(LazySource::from_vec(iterable.into_iter().collect()))
    }
}

impl<T: Element + PartialEq> From<Sequence<T>> for OrderedContainer<T> {
    fn from(sequence: Sequence<T>) -> Self {
        Self::from_source(sequence)
    }
}

impl<T: Element + PartialEq, B: OrderedStore<T>> Extend<T> for OrderedContainer<T, B> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iterable: I) {
        self.add_all(iterable);
    }
}

impl<T, B> IntoIterator for OrderedContainer<T, B>
where
    T: Element + PartialEq,
    B: OrderedStore<T> + IntoIterator<Item = T>,
    B::IntoIter: Send + 'static,
{
    type Item = T;
    type IntoIter = IntoIter<T>;

    /// Consumes the list. A lazy list yields straight from its source.
    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self.core.into_drain())
    }
}

impl<T, B: fmt::Debug> fmt::Debug for OrderedContainer<T, B> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("OrderedContainer")
            .field(&self.core)
            .finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T, B> serde::Serialize for OrderedContainer<T, B>
where
    T: Element + PartialEq + serde::Serialize,
    B: OrderedStore<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.core
            .read("serialize", |backing| serializer.collect_seq(backing.as_slice()))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for OrderedContainer<T>
where
    T: Element + PartialEq + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements = <Vec<T> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::from_source(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_lazy_remove_drops_first_occurrence_only() {
        let list = OrderedContainer::from_source(vec![1, 2, 1, 2]);
        assert!(list.remove(&2));
        assert!(!list.is_validated());
        assert_eq!(list.to_vec(), vec![1, 1, 2]);
    }

    #[rstest]
    #[case(0..2, Ok(vec![10, 20]))]
    #[case(1..3, Ok(vec![20, 30]))]
    #[case(2..5, Err(ContainerError::InvalidRange { start: 2, end: 5, len: 3 }))]
    fn test_sub_list(
        #[case] range: std::ops::Range<usize>,
        #[case] expected: Result<Vec<i32>, ContainerError>,
    ) {
        let list = OrderedContainer::from_source(vec![10, 20, 30]);
        assert_eq!(list.sub_list(range), expected);
    }

    #[rstest]
    fn test_sub_list_inclusive_and_unbounded() {
        let list = OrderedContainer::from_source(vec![10, 20, 30]);
        assert_eq!(list.sub_list(..=1), Ok(vec![10, 20]));
        assert_eq!(list.sub_list(1..), Ok(vec![20, 30]));
    }

    #[rstest]
    fn test_enumerate_from_pairs_positions() {
        let list = OrderedContainer::from_source(vec!['a', 'b', 'c']);
        let pairs: Vec<_> = list.enumerate_from(1).unwrap().collect();
        assert_eq!(pairs, vec![(1, 'b'), (2, 'c')]);
        assert_eq!(
            list.enumerate_from(4).unwrap_err(),
            ContainerError::IndexOutOfBounds { index: 4, len: 3 }
        );
    }

    #[rstest]
    fn test_into_iter_of_lazy_list_skips_backing() {
        let list = OrderedContainer::from_source(vec![1, 2]);
        list.add(3);
        assert_eq!(list.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[rstest]
    fn test_debug_wraps_core() {
        let list = OrderedContainer::from_source(vec![5]);
        list.validate();
        assert_eq!(
            format!("{list:?}"),
            "OrderedContainer(Validatable { backing: [5], membership: Direct })"
        );
    }
}
