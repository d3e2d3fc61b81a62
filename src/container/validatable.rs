//! The validatable container core.
//!
//! [`Validatable`] holds either a pending [`LazySource`] or a materialized
//! backing store, and moves from the first to the second exactly once.
//!
//! # State Machine
//!
//! - `LAZY`: the source is present and the backing store is empty
//! - `MATERIALIZING`: one thread is draining the source under the lock
//! - `MATERIALIZED`: the source is gone, the backing store owns the data
//! - `POISONED`: the source panicked mid-drain; the container is unusable
//!
//! The state is an atomic read without the lock on the fast path and
//! re-read under the lock before draining (double-checked locking). It is
//! only ever written while the lock is held.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::membership::{CacheHasher, MembershipCache, MembershipMode};
use super::source::{Drain, LazySource};
use super::store::BackingStore;
use super::sync::{AtomicU8, Mutex, MutexGuard, Ordering};
use super::{ContainerError, Element};

/// State: source pending, backing store empty
const STATE_LAZY: u8 = 0;
/// State: source being drained by the lock holder
const STATE_MATERIALIZING: u8 = 1;
/// State: backing store is the single source of truth
const STATE_MATERIALIZED: u8 = 2;
/// State: draining panicked
const STATE_POISONED: u8 = 3;

struct Inner<T, B> {
    source: Option<LazySource<T>>,
    backing: B,
    cache: MembershipCache<T>,
}

enum Target<'a, T, B> {
    Lazy(&'a mut LazySource<T>),
    Store(&'a mut B),
}

impl<T, B> Inner<T, B> {
    fn target(&mut self) -> Target<'_, T, B> {
        match self.source.as_mut() {
            Some(source) => Target::Lazy(source),
            None => Target::Store(&mut self.backing),
        }
    }
}

/// A thread-safe container that drains its lazy source into a backing store
/// on first need.
///
/// `Validatable` is the engine behind
/// [`OrderedContainer`](super::OrderedContainer) and
/// [`UniqueContainer`](super::UniqueContainer); it can also be used directly
/// with any [`BackingStore`].
///
/// # Thread Safety
///
/// Every operation takes the internal lock, except the lock-free check that
/// skips materialization once it has happened. The action passed to
/// [`for_each`](Self::for_each) runs under the lock and must not call back
/// into the same container. Predicates folded into a lazy source run later,
/// during materialization, also under the lock.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::container::{LazySource, Validatable};
///
/// let container = Validatable::new(LazySource::new(vec![3, 1, 2]), Vec::new()).unwrap();
/// container.add(4);
/// assert!(!container.is_validated());
///
/// assert_eq!(container.len(), 4);
/// assert!(container.is_validated());
/// assert_eq!(container.to_vec(), vec![3, 1, 2, 4]);
/// ```
pub struct Validatable<T, B> {
    state: AtomicU8,
    inner: Mutex<Inner<T, B>>,
}

impl<T: Element, B: BackingStore<T>> Validatable<T, B> {
    /// Creates a lazy container over `source` with direct membership queries.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NonEmptyBacking`] if `backing` holds elements.
    pub fn new(source: LazySource<T>, backing: B) -> Result<Self, ContainerError> {
        if !backing.is_empty() {
            return Err(ContainerError::NonEmptyBacking { len: backing.len() });
        }
        Ok(Self::from_empty(source, backing))
    }

    /// Creates a lazy container over `source` with the given membership mode.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NonEmptyBacking`] if `backing` holds elements.
    pub fn with_options(
        source: LazySource<T>,
        backing: B,
        mode: MembershipMode,
    ) -> Result<Self, ContainerError>
    where
        T: Eq + Hash,
    {
        let container = Self::new(source, backing)?;
        container.set_membership_mode(mode);
        Ok(container)
    }

    /// Builds a container with direct membership over a backing store known
    /// to be empty.
    pub(crate) fn from_empty(source: LazySource<T>, backing: B) -> Self {
        Self {
            state: AtomicU8::new(STATE_LAZY),
            inner: Mutex::new(Inner {
                source: Some(source),
                backing,
                cache: MembershipCache::disabled(),
            }),
        }
    }

    /// Switches the membership mode, dropping any cached snapshot.
    pub(crate) fn set_membership_mode(&self, mode: MembershipMode)
    where
        T: Eq + Hash,
    {
        self.inner.lock().cache = MembershipCache::new(mode);
    }

    /// Returns the membership mode chosen at construction.
    pub fn membership_mode(&self) -> MembershipMode {
        self.inner.lock().cache.mode()
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Returns `true` once the lazy source has been drained or discarded.
    #[inline]
    pub fn is_validated(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_MATERIALIZED
    }

    /// Returns `true` if draining the source panicked.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_POISONED
    }

    /// Forces materialization. Does nothing if it already happened.
    ///
    /// # Panics
    ///
    /// Panics if the source panics while being drained, or if the container
    /// was poisoned by an earlier drain.
    pub fn validate(&self) {
        drop(self.materialized("validate"));
    }

    /// Locks the container, materializing it first if needed.
    fn materialized(&self, trigger: &'static str) -> MutexGuard<'_, Inner<T, B>> {
        if self.state.load(Ordering::Acquire) == STATE_MATERIALIZED {
            return self.inner.lock();
        }
        let mut guard = self.inner.lock();
        self.materialize_locked(&mut guard, trigger);
        guard
    }

    fn materialize_locked(&self, inner: &mut Inner<T, B>, trigger: &'static str) {
        self.drain_locked(inner, trigger, |_| {});
    }

    /// Drains the source into the backing store, showing every stored
    /// element to `visit`. Must be called with the lock held.
    fn drain_locked<F>(&self, inner: &mut Inner<T, B>, trigger: &'static str, mut visit: F)
    where
        F: FnMut(&T),
    {
        match self.state.load(Ordering::Acquire) {
            STATE_MATERIALIZED => return,
            STATE_POISONED => panic!("container has been poisoned"),
            _ => {}
        }
        assert!(
            self.state
                .compare_exchange(
                    STATE_LAZY,
                    STATE_MATERIALIZING,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok(),
            "container materialization re-entered"
        );

        let source = inner
            .source
            .take()
            .expect("lazy source consulted after it was discarded");
        assert!(
            inner.backing.is_empty(),
            "backing store must be empty before materialization"
        );

        let backing = &mut inner.backing;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut drained = 0_usize;
            for element in source.into_drain() {
                drained += 1;
                if backing.admits(&element) {
                    visit(&element);
                    backing.insert(element);
                }
            }
            drained
        }));

        match result {
            Ok(drained) => {
                self.state.store(STATE_MATERIALIZED, Ordering::Release);
                tracing::debug!(
                    trigger,
                    drained,
                    stored = inner.backing.len(),
                    "materialized lazy container"
                );
            }
            Err(_) => {
                self.state.store(STATE_POISONED, Ordering::Release);
                panic!("container source panicked during materialization");
            }
        }
    }

    /// Locks the container for a structural mutation.
    fn mutating(&self) -> MutexGuard<'_, Inner<T, B>> {
        let mut guard = self.inner.lock();
        assert!(!self.is_poisoned(), "container has been poisoned");
        guard.cache.invalidate();
        guard
    }

    /// Runs `operation` on the materialized backing store.
    pub(crate) fn read<R>(&self, trigger: &'static str, operation: impl FnOnce(&B) -> R) -> R {
        let guard = self.materialized(trigger);
        operation(&guard.backing)
    }

    /// Runs a structural `operation` on the materialized backing store and
    /// drops the membership snapshot.
    pub(crate) fn modify<R>(
        &self,
        trigger: &'static str,
        operation: impl FnOnce(&mut B) -> R,
    ) -> R {
        let mut guard = self.materialized(trigger);
        guard.cache.invalidate();
        operation(&mut guard.backing)
    }

    /// Runs an `operation` that only reorders the backing store; the
    /// membership snapshot stays valid.
    pub(crate) fn reorder<R>(
        &self,
        trigger: &'static str,
        operation: impl FnOnce(&mut B) -> R,
    ) -> R {
        let mut guard = self.materialized(trigger);
        operation(&mut guard.backing)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` if the container holds no element.
    ///
    /// While lazy, this peeks at the source without materializing it.
    pub fn is_empty(&self) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.source.as_mut() {
            Some(source) => source.probe_empty(),
            None => {
                assert!(!self.is_poisoned(), "container has been poisoned");
                inner.backing.is_empty()
            }
        }
    }

    /// Returns the number of elements, materializing unless the source is
    /// known to be empty.
    pub fn len(&self) -> usize {
        let mut guard = self.inner.lock();
        if let Some(source) = guard.source.as_mut()
            && source.probe_empty()
        {
            return 0;
        }
        self.materialize_locked(&mut guard, "len");
        guard.backing.len()
    }

    /// Returns `true` if an equal element is present.
    ///
    /// In [`MembershipMode::Cached`] the answer comes from the snapshot,
    /// which is built from a replayable source without materializing.
    pub fn contains(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(cache) = self.warm_cache(inner) {
            return cache.lookup(element).unwrap_or(false);
        }
        self.materialize_locked(inner, "contains");
        inner.backing.contains(element)
    }

    /// Returns `true` if every element of `elements` is present.
    pub fn contains_all<'a, I>(&self, elements: I) -> bool
    where
        T: PartialEq + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(cache) = self.warm_cache(inner) {
            return elements
                .into_iter()
                .all(|element| cache.lookup(element).unwrap_or(false));
        }
        self.materialize_locked(inner, "contains_all");
        elements
            .into_iter()
            .all(|element| inner.backing.contains(element))
    }

    /// Returns the membership cache once it holds a snapshot, building it if
    /// the cache is enabled and cold. `None` in direct mode.
    fn warm_cache<'a>(&self, inner: &'a mut Inner<T, B>) -> Option<&'a MembershipCache<T>> {
        match inner.cache.mode() {
            MembershipMode::Direct => return None,
            MembershipMode::Cached if inner.cache.is_warm() => {}
            MembershipMode::Cached => {
                if let Some(replay) = inner.source.as_ref().and_then(LazySource::replay) {
                    inner.cache.fill(replay);
                } else {
                    self.materialize_locked(inner, "membership cache");
                    inner.cache.fill(inner.backing.iter().cloned());
                }
            }
        }
        Some(&inner.cache)
    }

    /// Visits every element once.
    ///
    /// While lazy, the source is drained straight into the backing store as
    /// `action` runs, so traversal and materialization share one pass.
    /// Elements rejected by a deduplicating store are not visited.
    pub fn for_each<F: FnMut(&T)>(&self, mut action: F) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.source.is_some() {
            self.drain_locked(inner, "for_each", action);
            return;
        }
        assert!(!self.is_poisoned(), "container has been poisoned");
        inner.backing.iter().for_each(&mut action);
    }

    /// Returns a copy of every element in store order.
    pub fn to_vec(&self) -> Vec<T> {
        self.read("to_vec", |backing| backing.iter().cloned().collect())
    }

    /// Returns an iterator over a snapshot of the elements.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `element`.
    ///
    /// While lazy the element is appended to the pending source and `true`
    /// is returned; a deduplicating store may still drop it at
    /// materialization. Once materialized, returns whether the store changed.
    pub fn add(&self, element: T) -> bool {
        let mut guard = self.mutating();
        match guard.target() {
            Target::Lazy(source) => {
                source.append(LazySource::from_vec(vec![element]));
                tracing::trace!("folded add into lazy source");
                true
            }
            Target::Store(backing) => backing.insert(element),
        }
    }

    /// Adds every element of `elements`, in order.
    ///
    /// Returns `true` if anything was (or, while lazy, will be) added.
    pub fn add_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
        let elements: Vec<T> = elements.into_iter().collect();
        if elements.is_empty() {
            return false;
        }
        let mut guard = self.mutating();
        match guard.target() {
            Target::Lazy(source) => {
                source.append(LazySource::from_vec(elements));
                tracing::trace!("folded add_all into lazy source");
                true
            }
            Target::Store(backing) => backing.insert_all(elements) > 0,
        }
    }

    /// Appends another lazy source without draining it.
    ///
    /// Once materialized, `source` is drained into the store immediately.
    pub fn chain(&self, source: LazySource<T>) {
        let mut guard = self.mutating();
        match guard.target() {
            Target::Lazy(pending) => {
                pending.append(source);
                tracing::trace!("folded chain into lazy source");
            }
            Target::Store(backing) => {
                backing.insert_all(source.into_drain());
            }
        }
    }

    /// Removes an element equal to `element`.
    ///
    /// Ordered stores remove the first occurrence, deduplicating stores the
    /// only one. While lazy the removal is folded into the source and `true`
    /// is returned.
    pub fn remove(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        let mut guard = self.mutating();
        match guard.target() {
            Target::Lazy(source) => {
                let target = element.clone();
                if B::DEDUPLICATES {
                    source.retain(Arc::new(move |candidate: &T| *candidate != target));
                } else {
                    source.remove_first(Arc::new(move |candidate: &T| *candidate == target));
                }
                tracing::trace!("folded remove into lazy source");
                true
            }
            Target::Store(backing) => backing.remove(element),
        }
    }

    /// Removes every element equal to one of `elements`.
    ///
    /// The elements are hashed once, so each candidate is checked in
    /// constant time during the drain.
    pub fn remove_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool
    where
        T: Eq + Hash,
    {
        let excluded = hashed(elements);
        if excluded.is_empty() {
            return false;
        }
        self.remove_matching(move |candidate| excluded.contains(candidate))
    }

    /// Removes every element accepted by `predicate`.
    pub fn remove_if<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.remove_matching(predicate)
    }

    /// Keeps only the elements accepted by `predicate`.
    pub fn retain<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.remove_matching(move |candidate| !predicate(candidate))
    }

    fn remove_matching<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let mut guard = self.mutating();
        match guard.target() {
            Target::Lazy(source) => {
                source.retain(Arc::new(move |candidate: &T| !predicate(candidate)));
                tracing::trace!("folded filter into lazy source");
                true
            }
            Target::Store(backing) => {
                let before = backing.len();
                backing.retain(|candidate| !predicate(candidate));
                backing.len() != before
            }
        }
    }

    /// Keeps only the elements equal to one of `elements`.
    pub fn retain_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool
    where
        T: Eq + Hash,
    {
        let kept = hashed(elements);
        self.remove_matching(move |candidate| !kept.contains(candidate))
    }

    /// Removes every element.
    ///
    /// A lazy container discards its source without draining it.
    pub fn clear(&self) {
        let mut guard = self.mutating();
        if guard.source.take().is_some() {
            self.state.store(STATE_MATERIALIZED, Ordering::Release);
            tracing::debug!("cleared lazy container without materializing");
        } else {
            guard.backing.clear();
        }
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    fn into_parts(self) -> (Option<LazySource<T>>, B) {
        assert!(!self.is_poisoned(), "container has been poisoned");
        let inner = self.inner.into_inner();
        (inner.source, inner.backing)
    }

    /// Materializes the container and returns its backing store.
    pub fn into_backing(self) -> B {
        self.validate();
        self.into_parts().1
    }

    /// Consumes the container, yielding its elements.
    ///
    /// A lazy container yields its source directly, without filling the
    /// backing store first.
    pub(crate) fn into_drain(self) -> Drain<T>
    where
        B: IntoIterator<Item = T>,
        B::IntoIter: Send + 'static,
    {
        match self.into_parts() {
            (Some(source), _) => source.into_drain(),
            (None, backing) => Box::new(backing.into_iter()),
        }
    }
}

/// An owning iterator over the elements of a consumed container.
///
/// Yields straight from the lazy source when the container was never
/// materialized.
pub struct IntoIter<T> {
    drain: Drain<T>,
}

fn hashed<T: Eq + Hash, I: IntoIterator<Item = T>>(elements: I) -> HashSet<T, CacheHasher> {
    let mut set = HashSet::with_hasher(CacheHasher::default());
    set.extend(elements);
    set
}

impl<T> IntoIter<T> {
    pub(crate) fn new(drain: Drain<T>) -> Self {
        Self { drain }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.drain.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.drain.size_hint()
    }
}

impl<T> fmt::Debug for IntoIter<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("IntoIter").finish_non_exhaustive()
    }
}

impl<T, B: fmt::Debug> fmt::Debug for Validatable<T, B> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        let mut debug = formatter.debug_struct("Validatable");
        match self.state.load(Ordering::Acquire) {
            STATE_MATERIALIZED => debug.field("backing", &inner.backing),
            STATE_POISONED => debug.field("state", &"poisoned"),
            _ => debug.field("source", &inner.source),
        };
        debug.field("membership", &inner.cache.mode()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn lazy_vec(elements: Vec<i32>) -> Validatable<i32, Vec<i32>> {
        Validatable::new(LazySource::new(elements), Vec::new()).unwrap()
    }

    #[rstest]
    fn test_materializes_once_and_discards_source() {
        let container = lazy_vec(vec![1, 2, 3]);
        container.validate();
        container.validate();
        assert!(container.is_validated());
        assert!(container.inner.lock().source.is_none());
        assert_eq!(container.to_vec(), vec![1, 2, 3]);
    }

    #[rstest]
    fn test_len_of_empty_source_stays_lazy() {
        let container = lazy_vec(Vec::new());
        assert_eq!(container.len(), 0);
        assert!(!container.is_validated());
    }

    #[rstest]
    fn test_clear_while_lazy_skips_drain() {
        let container = lazy_vec(vec![1, 2]);
        container.clear();
        assert!(container.is_validated());
        assert!(container.is_empty());
        assert_eq!(container.len(), 0);
    }

    #[rstest]
    fn test_for_each_dedupes_with_unique_store() {
        let container =
            Validatable::new(LazySource::new(vec![2, 1, 2, 3, 1]), BTreeSet::new()).unwrap();
        let mut visited = Vec::new();
        container.for_each(|element| visited.push(*element));
        assert_eq!(visited, vec![2, 1, 3]);
        assert!(container.is_validated());
    }

    #[rstest]
    fn test_debug_reports_state() {
        let container = lazy_vec(vec![1]);
        assert!(format!("{container:?}").contains("source"));
        container.validate();
        assert_eq!(
            format!("{container:?}"),
            "Validatable { backing: [1], membership: Direct }"
        );
    }

    #[rstest]
    fn test_panicking_source_poisons_container() {
        let container: Validatable<i32, Vec<i32>> = Validatable::new(
            LazySource::new((0..3).map(|value| {
                assert!(value < 2, "source failure");
                value
            })),
            Vec::new(),
        )
        .unwrap();

        let outcome = catch_unwind(AssertUnwindSafe(|| container.validate()));
        assert!(outcome.is_err());
        assert!(container.is_poisoned());
        assert!(catch_unwind(AssertUnwindSafe(|| container.len())).is_err());
    }
}
