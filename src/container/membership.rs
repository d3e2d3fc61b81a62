//! Fast-membership cache.
//!
//! When a container is built with [`MembershipMode::Cached`], the first
//! membership query builds a hash set snapshot that later queries consult.
//! Every structural mutation drops the snapshot; the next query rebuilds it.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Hasher used by the membership cache.
#[cfg(feature = "fxhash")]
pub(crate) type CacheHasher = rustc_hash::FxBuildHasher;

/// Hasher used by the membership cache.
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub(crate) type CacheHasher = ahash::RandomState;

/// Hasher used by the membership cache.
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub(crate) type CacheHasher = std::hash::RandomState;

/// How a container answers `contains` and `contains_all`.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::container::{LazySource, MembershipMode, UniqueContainer};
/// use std::collections::HashSet;
///
/// let container = UniqueContainer::with_options(
///     LazySource::repeatable(|| 0..1_000),
///     HashSet::new(),
///     MembershipMode::Cached,
/// )
/// .unwrap();
///
/// // A replayable source is indexed without materializing the container.
/// assert!(container.contains(&999));
/// assert!(!container.is_validated());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MembershipMode {
    /// Query the backing store, materializing the container first.
    #[default]
    Direct,
    /// Query a hash set snapshot built on first use.
    Cached,
}

/// Hash-based operations on the snapshot, captured where `T: Eq + Hash`
/// holds so that queries on a cached container only need `PartialEq`.
pub(crate) struct Hashing<T> {
    fill: fn(&mut HashSet<T, CacheHasher>, &mut dyn Iterator<Item = T>),
    lookup: fn(&HashSet<T, CacheHasher>, &T) -> bool,
}

impl<T> Clone for Hashing<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Hashing<T> {}

impl<T: Eq + Hash> Hashing<T> {
    fn new() -> Self {
        Self {
            fill: |snapshot, elements| snapshot.extend(elements),
            lookup: |snapshot, element| snapshot.contains(element),
        }
    }
}

pub(crate) enum MembershipCache<T> {
    Disabled,
    Cold(Hashing<T>),
    Warm(Hashing<T>, HashSet<T, CacheHasher>),
}

impl<T> MembershipCache<T> {
    pub(crate) const fn disabled() -> Self {
        Self::Disabled
    }

    pub(crate) const fn mode(&self) -> MembershipMode {
        match self {
            Self::Disabled => MembershipMode::Direct,
            Self::Cold(_) | Self::Warm(..) => MembershipMode::Cached,
        }
    }

    pub(crate) const fn is_warm(&self) -> bool {
        matches!(self, Self::Warm(..))
    }

    /// Drops the snapshot, keeping the cache enabled.
    pub(crate) fn invalidate(&mut self) {
        if let Self::Warm(hashing, _) = self {
            *self = Self::Cold(*hashing);
        }
    }

    /// Replaces the snapshot with `elements`. A disabled cache ignores them.
    pub(crate) fn fill<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        let hashing = match self {
            Self::Disabled => return,
            Self::Cold(hashing) | Self::Warm(hashing, _) => *hashing,
        };
        let mut snapshot = HashSet::with_hasher(CacheHasher::default());
        (hashing.fill)(&mut snapshot, &mut elements.into_iter());
        tracing::trace!(elements = snapshot.len(), "built membership cache");
        *self = Self::Warm(hashing, snapshot);
    }

    /// Looks `element` up in the snapshot; `None` while the cache is cold
    /// or disabled.
    pub(crate) fn lookup(&self, element: &T) -> Option<bool> {
        match self {
            Self::Warm(hashing, snapshot) => Some((hashing.lookup)(snapshot, element)),
            Self::Disabled | Self::Cold(_) => None,
        }
    }

    /// Number of distinct elements in the snapshot.
    #[cfg(test)]
    pub(crate) fn snapshot_len(&self) -> Option<usize> {
        match self {
            Self::Warm(_, snapshot) => Some(snapshot.len()),
            Self::Disabled | Self::Cold(_) => None,
        }
    }
}

impl<T: Eq + Hash> MembershipCache<T> {
    pub(crate) fn new(mode: MembershipMode) -> Self {
        match mode {
            MembershipMode::Direct => Self::Disabled,
            MembershipMode::Cached => Self::Cold(Hashing::new()),
        }
    }
}

impl<T> fmt::Debug for MembershipCache<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => formatter.write_str("Disabled"),
            Self::Cold(_) => formatter.write_str("Cold"),
            Self::Warm(_, snapshot) => write!(formatter, "Warm({})", snapshot.len()),
        }
    }
}
