//! Concatenation of two iterators.

use std::iter::FusedIterator;

/// Mutable access to whichever half of a [`Concat`] is currently producing.
#[derive(Debug)]
pub enum Active<'a, A, B> {
    /// The first iterator has not been exhausted yet.
    First(&'a mut A),
    /// The adapter has switched to the second iterator.
    Second(&'a mut B),
}

/// Yields every element of `first`, then every element of `second`.
///
/// The switch from `first` to `second` happens the first time `first`
/// returns `None` and is never undone, so a `first` that would resume after
/// returning `None` is not polled again.
///
/// This type does no synchronization; containers drive it under their lock.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::sequence::Concat;
///
/// let mut concat = Concat::new(vec![1, 2].into_iter(), vec![3].into_iter());
/// assert!(concat.is_using_first());
/// assert_eq!(concat.next(), Some(1));
/// assert_eq!(concat.next(), Some(2));
/// assert_eq!(concat.next(), Some(3));
/// assert!(!concat.is_using_first());
/// assert_eq!(concat.next(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Concat<A, B> {
    first: A,
    second: B,
    using_first: bool,
}

impl<A, B> Concat<A, B>
where
    A: Iterator,
    B: Iterator<Item = A::Item>,
{
    /// Creates an adapter over `first` followed by `second`.
    #[inline]
    pub const fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            using_first: true,
        }
    }

    /// Returns `true` while elements are still taken from the first iterator.
    #[inline]
    pub const fn is_using_first(&self) -> bool {
        self.using_first
    }

    /// Returns the half that produced (or will produce) the current element.
    ///
    /// Use this to route cursor-level operations such as removal to the
    /// right underlying iterator.
    pub fn active_mut(&mut self) -> Active<'_, A, B> {
        if self.using_first {
            Active::First(&mut self.first)
        } else {
            Active::Second(&mut self.second)
        }
    }

    /// Consumes the adapter and returns both halves.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A, B> Iterator for Concat<A, B>
where
    A: Iterator,
    B: Iterator<Item = A::Item>,
{
    type Item = A::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.using_first {
            if let Some(element) = self.first.next() {
                return Some(element);
            }
            self.using_first = false;
        }
        self.second.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (second_lower, second_upper) = self.second.size_hint();
        if !self.using_first {
            return (second_lower, second_upper);
        }
        let (first_lower, first_upper) = self.first.size_hint();
        let lower = first_lower.saturating_add(second_lower);
        let upper = match (first_upper, second_upper) {
            (Some(first), Some(second)) => first.checked_add(second),
            _ => None,
        };
        (lower, upper)
    }
}

impl<A, B> FusedIterator for Concat<A, B>
where
    A: Iterator,
    B: FusedIterator<Item = A::Item>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Returns `None` once, then resumes.
    struct Flaky {
        calls: usize,
    }

    impl Iterator for Flaky {
        type Item = i32;

        fn next(&mut self) -> Option<i32> {
            self.calls += 1;
            match self.calls {
                1 => Some(1),
                2 => None,
                _ => Some(99),
            }
        }
    }

    #[rstest]
    fn test_switch_is_one_way() {
        let mut concat = Concat::new(Flaky { calls: 0 }, vec![2, 3].into_iter());
        let collected: Vec<i32> = concat.by_ref().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert!(!concat.is_using_first());
        let (first, _) = concat.into_parts();
        assert_eq!(first.calls, 2);
    }

    #[rstest]
    fn test_active_mut_follows_switch() {
        let mut concat = Concat::new(vec![1].into_iter(), vec![2].into_iter());
        assert!(matches!(concat.active_mut(), Active::First(_)));
        concat.next();
        concat.next();
        assert!(matches!(concat.active_mut(), Active::Second(_)));
    }

    #[rstest]
    #[case(vec![], vec![], (0, Some(0)))]
    #[case(vec![1, 2], vec![3], (3, Some(3)))]
    #[case(vec![], vec![3, 4], (2, Some(2)))]
    fn test_size_hint(
        #[case] first: Vec<i32>,
        #[case] second: Vec<i32>,
        #[case] expected: (usize, Option<usize>),
    ) {
        let concat = Concat::new(first.into_iter(), second.into_iter());
        assert_eq!(concat.size_hint(), expected);
    }
}
