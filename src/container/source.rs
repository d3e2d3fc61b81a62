//! The lazy source of a container.
//!
//! A [`LazySource`] is a small tagged pipeline describing where elements
//! come from and which pending mutations apply to them. Folding a mutation
//! rewrites the pipeline; nothing is pulled from the underlying sequences
//! until the pipeline is drained.

use std::fmt;
use std::iter;
use std::mem;
use std::sync::Arc;

use crate::sequence::{CloseableIterator, Concat, Filter, FilterPredicate, Sequence};

/// A boxed, sendable iterator produced by draining or replaying a pipeline.
pub(crate) type Drain<T> = Box<dyn Iterator<Item = T> + Send>;

/// A predicate shared between replays of the same pipeline.
pub(crate) type SharedPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

type Factory<T> = Arc<dyn Fn() -> Drain<T> + Send + Sync>;

enum Stage<T> {
    Empty,
    Elements(Vec<T>),
    Once(Sequence<T>),
    Repeatable(Factory<T>),
    Concat(Box<Stage<T>>, Box<Stage<T>>),
    /// Keeps elements accepted by every predicate.
    Filter(Box<Stage<T>>, Vec<SharedPredicate<T>>),
    /// Drops the first element matching the predicate.
    RemoveFirst(Box<Stage<T>>, SharedPredicate<T>),
}

/// The not-yet-drained source of a container, plus any folded mutations.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::container::{LazySource, OrderedContainer};
///
/// // Single-use: the iterator is consumed once, at materialization.
/// let once = LazySource::new((1..=3).map(|value| value * 10));
///
/// // Re-iterable: each call to the factory yields a fresh iterator.
/// let repeatable = LazySource::repeatable(|| 1..=3);
/// assert!(repeatable.is_replayable());
///
/// let container = OrderedContainer::from_source(once);
/// assert_eq!(container.to_vec(), vec![10, 20, 30]);
/// ```
pub struct LazySource<T> {
    stage: Stage<T>,
}

impl<T: Send + 'static> LazySource<T> {
    /// A source with no elements.
    pub const fn empty() -> Self {
        Self {
            stage: Stage::Empty,
        }
    }

    /// A single-use source backed by `iterable`.
    pub fn new<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_sequence(Sequence::new(iterable))
    }

    /// A source over already-collected elements.
    pub const fn from_vec(elements: Vec<T>) -> Self {
        Self {
            stage: Stage::Elements(elements),
        }
    }

    /// A re-iterable source; `factory` is called for every pass.
    pub fn repeatable<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let factory: Factory<T> = Arc::new(move || Box::new(factory().into_iter()));
        Self {
            stage: Stage::Repeatable(factory),
        }
    }

    /// A single-use source owning a resource released when it is closed.
    pub fn closeable<C>(iterator: C) -> Self
    where
        C: CloseableIterator<Item = T> + Send + 'static,
    {
        Self::from_sequence(Sequence::closeable(iterator))
    }

    /// A single-use source over an existing [`Sequence`].
    pub const fn from_sequence(sequence: Sequence<T>) -> Self {
        Self {
            stage: Stage::Once(sequence),
        }
    }

    /// Returns `true` if the pipeline can be iterated without consuming it.
    ///
    /// Single-use leaves (iterators, sequences) make a pipeline
    /// non-replayable.
    pub fn is_replayable(&self) -> bool {
        Self::stage_is_replayable(&self.stage)
    }

    fn stage_is_replayable(stage: &Stage<T>) -> bool {
        match stage {
            Stage::Empty | Stage::Elements(_) | Stage::Repeatable(_) => true,
            Stage::Once(_) => false,
            Stage::Concat(first, second) => {
                Self::stage_is_replayable(first) && Self::stage_is_replayable(second)
            }
            Stage::Filter(inner, _) | Stage::RemoveFirst(inner, _) => {
                Self::stage_is_replayable(inner)
            }
        }
    }

    /// Appends `other` after the current elements.
    pub(crate) fn append(&mut self, other: Self) {
        let current = mem::replace(&mut self.stage, Stage::Empty);
        self.stage = match (current, other.stage) {
            (Stage::Empty, appended) => appended,
            (current, Stage::Empty) => current,
            (Stage::Elements(mut elements), Stage::Elements(appended)) => {
                elements.extend(appended);
                Stage::Elements(elements)
            }
            (Stage::Concat(first, second), Stage::Elements(appended))
                if matches!(*second, Stage::Elements(_)) =>
            {
                let mut second = second;
                if let Stage::Elements(elements) = second.as_mut() {
                    elements.extend(appended);
                }
                Stage::Concat(first, second)
            }
            (current, appended) => Stage::Concat(Box::new(current), Box::new(appended)),
        };
    }

    /// Keeps only elements accepted by `predicate`, AND-ed with any filter
    /// already at the head of the pipeline.
    pub(crate) fn retain(&mut self, predicate: SharedPredicate<T>) {
        let current = mem::replace(&mut self.stage, Stage::Empty);
        self.stage = match current {
            Stage::Empty => Stage::Empty,
            Stage::Filter(inner, mut predicates) => {
                predicates.push(predicate);
                Stage::Filter(inner, predicates)
            }
            current => Stage::Filter(Box::new(current), vec![predicate]),
        };
    }

    /// Drops the first element matching `predicate`.
    pub(crate) fn remove_first(&mut self, predicate: SharedPredicate<T>) {
        let current = mem::replace(&mut self.stage, Stage::Empty);
        self.stage = match current {
            Stage::Empty => Stage::Empty,
            current => Stage::RemoveFirst(Box::new(current), predicate),
        };
    }

    fn known_empty(stage: &Stage<T>) -> Option<bool> {
        match stage {
            Stage::Empty => Some(true),
            Stage::Elements(elements) => Some(elements.is_empty()),
            Stage::Repeatable(factory) => Some(factory().next().is_none()),
            Stage::Once(sequence) if sequence.is_closed() => Some(true),
            Stage::Concat(first, second) => {
                if Self::known_empty(first)? {
                    Self::known_empty(second)
                } else {
                    Some(false)
                }
            }
            Stage::Once(_) | Stage::Filter(..) | Stage::RemoveFirst(..) => None,
        }
    }

    /// Compiles the pipeline into iterator adapters and consumes it.
    pub(crate) fn into_drain(self) -> Drain<T> {
        Self::compile(self.stage)
    }

    fn compile(stage: Stage<T>) -> Drain<T> {
        match stage {
            Stage::Empty => Box::new(iter::empty()),
            Stage::Elements(elements) => Box::new(elements.into_iter()),
            Stage::Once(sequence) => Box::new(sequence),
            Stage::Repeatable(factory) => factory(),
            Stage::Concat(first, second) => {
                Box::new(Concat::new(Self::compile(*first), Self::compile(*second)))
            }
            Stage::Filter(inner, predicates) => Self::filtered(Self::compile(*inner), predicates),
            Stage::RemoveFirst(inner, predicate) => {
                Self::without_first(Self::compile(*inner), predicate)
            }
        }
    }

    fn filtered(drain: Drain<T>, predicates: Vec<SharedPredicate<T>>) -> Drain<T> {
        let predicates = predicates
            .into_iter()
            .map(|predicate| -> FilterPredicate<T> { Box::new(move |element: &T| predicate(element)) })
            .collect();
        Box::new(Filter::with_predicates(drain, predicates))
    }

    fn without_first(drain: Drain<T>, predicate: SharedPredicate<T>) -> Drain<T> {
        let mut removed = false;
        Box::new(drain.filter(move |element| {
            if !removed && predicate(element) {
                removed = true;
                false
            } else {
                true
            }
        }))
    }
}

impl<T: Clone + Send + 'static> LazySource<T> {
    /// Iterates the pipeline without consuming it, if it is replayable.
    pub(crate) fn replay(&self) -> Option<Drain<T>> {
        Self::replay_stage(&self.stage)
    }

    /// Returns `true` if the pipeline yields no element.
    ///
    /// Shapes whose emptiness is known without pulling from a single-use
    /// source are answered directly, and replayable pipelines are answered
    /// from a replay. Otherwise the first element is pulled and pushed back
    /// in front of the rest, so no element is lost and later probes are
    /// answered structurally.
    pub(crate) fn probe_empty(&mut self) -> bool {
        if let Some(empty) = Self::known_empty(&self.stage) {
            return empty;
        }
        if let Some(mut replayed) = self.replay() {
            return replayed.next().is_none();
        }
        let stage = mem::replace(&mut self.stage, Stage::Empty);
        let mut rest = Self::compile(stage);
        match rest.next() {
            Some(first) => {
                self.stage = Stage::Concat(
                    Box::new(Stage::Elements(vec![first])),
                    Box::new(Stage::Once(Sequence::new(rest))),
                );
                false
            }
            None => true,
        }
    }

    fn replay_stage(stage: &Stage<T>) -> Option<Drain<T>> {
        match stage {
            Stage::Empty => Some(Box::new(iter::empty())),
            Stage::Elements(elements) => Some(Box::new(elements.clone().into_iter())),
            Stage::Once(_) => None,
            Stage::Repeatable(factory) => Some(factory()),
            Stage::Concat(first, second) => Some(Box::new(Concat::new(
                Self::replay_stage(first)?,
                Self::replay_stage(second)?,
            ))),
            Stage::Filter(inner, predicates) => Some(Self::filtered(
                Self::replay_stage(inner)?,
                predicates.clone(),
            )),
            Stage::RemoveFirst(inner, predicate) => Some(Self::without_first(
                Self::replay_stage(inner)?,
                Arc::clone(predicate),
            )),
        }
    }
}

impl<T: Send + 'static> Default for LazySource<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Send + 'static> From<Vec<T>> for LazySource<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::from_vec(elements)
    }
}

impl<T: Send + 'static> From<Sequence<T>> for LazySource<T> {
    fn from(sequence: Sequence<T>) -> Self {
        Self::from_sequence(sequence)
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("Empty"),
            Self::Elements(elements) => write!(formatter, "Elements({})", elements.len()),
            Self::Once(sequence) => write!(formatter, "{sequence:?}"),
            Self::Repeatable(_) => formatter.write_str("Repeatable"),
            Self::Concat(first, second) => formatter
                .debug_tuple("Concat")
                .field(first)
                .field(second)
                .finish(),
            Self::Filter(inner, predicates) => {
                write!(formatter, "Filter({inner:?}, {} predicate(s))", predicates.len())
            }
            Self::RemoveFirst(inner, _) => formatter.debug_tuple("RemoveFirst").field(inner).finish(),
        }
    }
}

impl<T> fmt::Debug for LazySource<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LazySource")
            .field("stage", &self.stage)
            .finish()
    }
}
