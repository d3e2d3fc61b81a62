//! Predicate filtering with conjunction.

use std::fmt;
use std::iter::FusedIterator;

use super::SequenceError;

/// A boxed predicate usable by [`Filter`].
pub type FilterPredicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Yields only the elements of the wrapped iterator accepted by its predicates.
///
/// Predicates may be added until the first element is requested; each
/// additional predicate is combined with the existing ones by logical AND.
/// Without any predicate the adapter forwards straight to the wrapped
/// iterator.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::sequence::{Filter, SequenceError};
///
/// let mut filter = Filter::new(1..=10);
/// filter.add_filter(|value| value % 2 == 0).unwrap();
/// filter.add_filter(|value| *value > 5).unwrap();
///
/// assert_eq!(filter.next(), Some(6));
/// assert_eq!(
///     filter.add_filter(|_| true),
///     Err(SequenceError::FilterAfterConsumption)
/// );
/// assert_eq!(filter.collect::<Vec<_>>(), vec![8, 10]);
/// ```
pub struct Filter<I: Iterator> {
    inner: I,
    predicate: Option<FilterPredicate<I::Item>>,
    lookahead: Option<I::Item>,
    started: bool,
}

impl<I: Iterator> Filter<I> {
    /// Wraps `inner` without any predicate.
    #[inline]
    pub const fn new(inner: I) -> Self {
        Self {
            inner,
            predicate: None,
            lookahead: None,
            started: false,
        }
    }

    /// Wraps `inner` with an already-combined list of predicates.
    ///
    /// An empty list behaves like [`Filter::new`].
    pub fn with_predicates(inner: I, predicates: Vec<FilterPredicate<I::Item>>) -> Self
    where
        I::Item: 'static,
    {
        let mut filter = Self::new(inner);
        for predicate in predicates {
            filter.conjoin(predicate);
        }
        filter
    }

    /// Adds a predicate, AND-ed with any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::FilterAfterConsumption`] once an element has
    /// been produced or buffered by [`Filter::has_next`].
    pub fn add_filter<F>(&mut self, predicate: F) -> Result<(), SequenceError>
    where
        F: Fn(&I::Item) -> bool + Send + Sync + 'static,
        I::Item: 'static,
    {
        if self.started {
            return Err(SequenceError::FilterAfterConsumption);
        }
        self.conjoin(Box::new(predicate));
        Ok(())
    }

    fn conjoin(&mut self, predicate: FilterPredicate<I::Item>)
    where
        I::Item: 'static,
    {
        self.predicate = Some(match self.predicate.take() {
            None => predicate,
            Some(existing) => {
                Box::new(move |element: &I::Item| existing(element) && predicate(element))
            }
        });
    }

    /// Returns `true` when no predicate has been added.
    #[inline]
    pub const fn is_unfiltered(&self) -> bool {
        self.predicate.is_none()
    }

    /// Returns `true` if another accepted element is available.
    ///
    /// Rejected elements are skipped, and the accepted one is buffered for
    /// the next call to `next`. This counts as starting iteration.
    pub fn has_next(&mut self) -> bool {
        if self.lookahead.is_none() {
            self.lookahead = self.advance();
        }
        self.lookahead.is_some()
    }

    fn advance(&mut self) -> Option<I::Item> {
        self.started = true;
        match &self.predicate {
            None => self.inner.next(),
            Some(predicate) => self.inner.by_ref().find(|element| predicate(element)),
        }
    }

    /// Consumes the adapter, returning the wrapped iterator.
    ///
    /// A buffered element is dropped.
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: Iterator> Iterator for Filter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(element) = self.lookahead.take() {
            return Some(element);
        }
        self.advance()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = usize::from(self.lookahead.is_some());
        let (lower, upper) = self.inner.size_hint();
        let upper = upper.and_then(|upper| upper.checked_add(buffered));
        if self.predicate.is_none() {
            (lower.saturating_add(buffered), upper)
        } else {
            (buffered, upper)
        }
    }
}

impl<I: FusedIterator> FusedIterator for Filter<I> {}

impl<I> fmt::Debug for Filter<I>
where
    I: Iterator + fmt::Debug,
    I::Item: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Filter")
            .field("inner", &self.inner)
            .field("filtered", &self.predicate.is_some())
            .field("lookahead", &self.lookahead)
            .field("started", &self.started)
            .finish()
    }
}
