//! # deferred-collections
//!
//! Thread-safe list and set containers that defer draining their source
//! sequence until an operation actually needs the elements.
//!
//! ## Overview
//!
//! A container is built from an iterator, a re-iterable factory or a
//! closeable cursor, together with an empty backing store. Until something
//! requires size, position or repeated access:
//!
//! - emptiness checks peek at the source without losing elements
//! - `add`, `remove` and filters are folded into the source as a pipeline
//! - a single `for_each` pass drains and visits in one go
//!
//! The first operation that needs the elements drains the source into the
//! backing store exactly once, even when many threads race for it.
//!
//! ## Feature Flags
//!
//! - `sequence`: Concatenation, filter and closeable sequence adapters
//! - `container`: Lazy containers (`OrderedContainer`, `UniqueContainer`)
//! - `smallvec`: `SmallVec` as an ordered backing store
//! - `fxhash` / `ahash`: Faster hasher for the membership cache
//! - `serde`: Serialization of containers
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use deferred_collections::prelude::*;
//!
//! let list = OrderedContainer::from_source(LazySource::new(vec!["a", "b"]));
//! list.add("c");
//! assert!(!list.is_empty());
//! assert!(!list.is_validated());
//!
//! assert_eq!(list.len(), 3);
//! assert!(list.is_validated());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use deferred_collections::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "sequence")]
    pub use crate::sequence::*;

    #[cfg(feature = "container")]
    pub use crate::container::*;
}

#[cfg(feature = "sequence")]
pub mod sequence;

#[cfg(feature = "container")]
pub mod container;
