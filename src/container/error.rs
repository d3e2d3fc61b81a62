//! Error types for lazy containers.

/// Errors returned by container construction and positional operations.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::container::{ContainerError, OrderedContainer};
///
/// let error = OrderedContainer::with_backing(vec![1], vec![0]).unwrap_err();
/// assert_eq!(error, ContainerError::NonEmptyBacking { len: 1 });
/// assert_eq!(
///     error.to_string(),
///     "backing store must be empty at construction, found 1 element(s)"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// The backing store handed to a constructor already held elements.
    #[error("backing store must be empty at construction, found {len} element(s)")]
    NonEmptyBacking {
        /// Number of elements found in the backing store.
        len: usize,
    },
    /// A positional operation addressed an index past the end.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The container length at the time of the call.
        len: usize,
    },
    /// A range was reversed or extended past the end.
    #[error("range {start}..{end} out of bounds for length {len}")]
    InvalidRange {
        /// Inclusive start of the range.
        start: usize,
        /// Exclusive end of the range.
        end: usize,
        /// The container length at the time of the call.
        len: usize,
    },
}
