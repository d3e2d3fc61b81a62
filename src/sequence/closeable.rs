//! Iterators that may hold external resources.
//!
//! A [`Sequence`] is either a plain iterator or a [`CloseableIterator`];
//! which one is decided when the sequence is built. Closing is idempotent
//! and best-effort: a failing close is logged through `tracing` and never
//! reaches the caller.

use std::fmt;

use super::CloseError;

/// An iterator that owns a resource (file handle, cursor, connection)
/// which must be released when iteration ends or is abandoned.
pub trait CloseableIterator: Iterator {
    /// Releases the underlying resource.
    ///
    /// [`Sequence`] calls this at most once.
    ///
    /// # Errors
    ///
    /// Returns a [`CloseError`] if the resource could not be released.
    fn close(&mut self) -> Result<(), CloseError>;
}

enum SequenceKind<T> {
    Plain(Box<dyn Iterator<Item = T> + Send>),
    Closeable(Box<dyn CloseableIterator<Item = T> + Send>),
}

/// A single-use source of elements with an optional close capability.
///
/// The sequence closes itself when it is exhausted, when [`Sequence::close`]
/// is called, or when it is dropped, whichever happens first. Once closed it
/// yields no further elements.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::sequence::{CloseError, CloseableIterator, Sequence};
///
/// struct Cursor {
///     remaining: u32,
/// }
///
/// impl Iterator for Cursor {
///     type Item = u32;
///     fn next(&mut self) -> Option<u32> {
///         self.remaining = self.remaining.checked_sub(1)?;
///         Some(self.remaining)
///     }
/// }
///
/// impl CloseableIterator for Cursor {
///     fn close(&mut self) -> Result<(), CloseError> {
///         Err(CloseError::Failed("server went away".to_string()))
///     }
/// }
///
/// let mut sequence = Sequence::closeable(Cursor { remaining: 3 });
/// assert_eq!(sequence.next(), Some(2));
///
/// // The failure is logged, not returned.
/// sequence.close();
/// assert!(sequence.is_closed());
/// assert_eq!(sequence.next(), None);
/// ```
pub struct Sequence<T> {
    kind: SequenceKind<T>,
    closed: bool,
}

impl<T> Sequence<T> {
    /// Wraps a plain iterator. Closing it only ends iteration.
    pub fn new<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            kind: SequenceKind::Plain(Box::new(iterable.into_iter())),
            closed: false,
        }
    }

    /// Wraps an iterator whose resource is released on close.
    pub fn closeable<C>(iterator: C) -> Self
    where
        C: CloseableIterator<Item = T> + Send + 'static,
    {
        Self {
            kind: SequenceKind::Closeable(Box::new(iterator)),
            closed: false,
        }
    }

    /// Returns `true` if this sequence owns a closeable resource.
    pub const fn is_closeable(&self) -> bool {
        matches!(self.kind, SequenceKind::Closeable(_))
    }

    /// Returns `true` once the sequence has been closed.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the sequence. Later calls do nothing.
    ///
    /// A close failure is logged at `warn` level and otherwise ignored.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let SequenceKind::Closeable(iterator) = &mut self.kind {
            if let Err(error) = iterator.close() {
                tracing::warn!(%error, "error while closing sequence");
            }
        }
    }
}

impl<T> Iterator for Sequence<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        let next = match &mut self.kind {
            SequenceKind::Plain(iterator) => iterator.next(),
            SequenceKind::Closeable(iterator) => iterator.next(),
        };
        if next.is_none() {
            self.close();
        }
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.closed {
            return (0, Some(0));
        }
        match &self.kind {
            SequenceKind::Plain(iterator) => iterator.size_hint(),
            SequenceKind::Closeable(iterator) => iterator.size_hint(),
        }
    }
}

impl<T> Drop for Sequence<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> fmt::Debug for Sequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Sequence")
            .field("closeable", &self.is_closeable())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Closes every sequence, independently of the others.
///
/// Each failure is logged; a failing sequence does not stop the rest from
/// being closed.
pub fn close_all<'a, T, I>(sequences: I)
where
    T: 'a,
    I: IntoIterator<Item = &'a mut Sequence<T>>,
{
    for sequence in sequences {
        sequence.close();
    }
}
