//! Error types for sequence adapters.

/// Errors raised by the sequence adapters.
///
/// # Examples
///
/// ```rust
/// use deferred_collections::sequence::SequenceError;
///
/// let error = SequenceError::FilterAfterConsumption;
/// assert_eq!(
///     error.to_string(),
///     "filters must be added before iteration begins"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// A predicate was added to a [`Filter`](super::Filter) that has already
    /// produced (or buffered) an element.
    #[error("filters must be added before iteration begins")]
    FilterAfterConsumption,
}

/// Failure reported by [`CloseableIterator::close`](super::CloseableIterator::close).
///
/// The crate never propagates this error: it is logged and discarded.
#[derive(Debug, thiserror::Error)]
pub enum CloseError {
    /// Releasing an I/O resource failed.
    #[error("i/o error while closing sequence: {0}")]
    Io(#[from] std::io::Error),
    /// Any other release failure.
    #[error("failed to close sequence: {0}")]
    Failed(String),
}
