//! Composable sequence adapters.
//!
//! This module provides the building blocks used to describe a lazy source
//! without consuming it:
//!
//! - [`Concat`]: Exposes two iterators as one, draining the first before the second
//! - [`Filter`]: Skips elements failing a predicate, with predicate conjunction
//! - [`Sequence`]: An iterator that may also release external resources on close
//!
//! # Examples
//!
//! ## Concatenation and Filtering
//!
//! ```rust
//! use deferred_collections::sequence::SequenceExt;
//!
//! let mut evens_above_five = (1..=10).filterable();
//! evens_above_five.add_filter(|value| value % 2 == 0).unwrap();
//! evens_above_five.add_filter(|value| *value > 5).unwrap();
//!
//! let combined: Vec<i32> = evens_above_five.concat(vec![100, 200]).collect();
//! assert_eq!(combined, vec![6, 8, 10, 100, 200]);
//! ```
//!
//! ## Closeable Sequences
//!
//! ```rust
//! use deferred_collections::sequence::Sequence;
//!
//! let mut sequence = Sequence::new(vec![1, 2, 3]);
//! assert!(!sequence.is_closeable());
//!
//! // Closing a plain sequence is a no-op apart from ending iteration.
//! sequence.close();
//! assert_eq!(sequence.next(), None);
//! ```

mod closeable;
mod concat;
mod error;
mod filter;

pub use closeable::{CloseableIterator, Sequence, close_all};
pub use concat::{Active, Concat};
pub use error::{CloseError, SequenceError};
pub use filter::{Filter, FilterPredicate};

/// Extension methods for building adapters from any iterator.
pub trait SequenceExt: Iterator + Sized {
    /// Concatenates `other` after `self`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred_collections::sequence::SequenceExt;
    ///
    /// let joined: Vec<i32> = vec![1, 2].into_iter().concat(vec![3]).collect();
    /// assert_eq!(joined, vec![1, 2, 3]);
    /// ```
    fn concat<B>(self, other: B) -> Concat<Self, B::IntoIter>
    where
        B: IntoIterator<Item = Self::Item>,
    {
        Concat::new(self, other.into_iter())
    }

    /// Wraps `self` in a [`Filter`] with no predicate yet.
    fn filterable(self) -> Filter<Self> {
        Filter::new(self)
    }

    /// Wraps `self` in a plain (non-closeable) [`Sequence`].
    fn into_sequence(self) -> Sequence<Self::Item>
    where
        Self: Send + 'static,
    {
        Sequence::new(self)
    }
}

impl<I: Iterator> SequenceExt for I {}
