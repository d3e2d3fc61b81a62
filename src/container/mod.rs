//! Lazily materialized, thread-safe containers.
//!
//! A container is built from a [`LazySource`] and an empty backing store.
//! Cheap operations are answered from the source, and mutations are folded
//! into it. The first operation that needs size, position or repeated access
//! drains the source into the store, exactly once, under the container's
//! lock.
//!
//! - [`OrderedContainer`]: A list facade with positional access
//! - [`UniqueContainer`]: A set facade that drops duplicates
//! - [`Validatable`]: The state machine shared by both facades
//! - [`LazySource`]: The pending source, as a tagged pipeline
//!
//! # Examples
//!
//! ## Folding Mutations While Lazy
//!
//! ```rust
//! use deferred_collections::container::{LazySource, OrderedContainer};
//!
//! let list = OrderedContainer::from_source(LazySource::new(1..=10));
//! list.retain(|value| value % 2 == 0);
//! list.retain(|value| *value > 5);
//! assert!(!list.is_empty());
//! assert!(!list.is_validated());
//!
//! assert_eq!(list.to_vec(), vec![6, 8, 10]);
//! ```
//!
//! ## Sharing Across Threads
//!
//! ```rust
//! use deferred_collections::container::UniqueContainer;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let set = Arc::new(UniqueContainer::from_source(vec![1, 1, 2]));
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let set = Arc::clone(&set);
//!         thread::spawn(move || set.len())
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), 2);
//! }
//! ```

mod error;
mod membership;
mod ordered;
mod source;
mod store;
mod sync;
mod unique;
mod validatable;

pub use error::ContainerError;
pub use membership::MembershipMode;
pub use ordered::OrderedContainer;
pub use source::LazySource;
pub use store::{BackingStore, OrderedStore, UniqueStore};
pub use unique::UniqueContainer;
pub use validatable::{IntoIter, Validatable};

/// Bounds every container element satisfies.
///
/// Elements move between threads with the container and are cloned out of
/// it by snapshot reads.
pub trait Element: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Element for T {}

#[cfg(not(loom))]
static_assertions::assert_impl_all!(OrderedContainer<i32>: Send, Sync);
#[cfg(not(loom))]
static_assertions::assert_impl_all!(UniqueContainer<String>: Send, Sync);
#[cfg(not(loom))]
static_assertions::assert_impl_all!(LazySource<i32>: Send);
#[cfg(not(loom))]
static_assertions::assert_not_impl_any!(LazySource<i32>: Sync);
