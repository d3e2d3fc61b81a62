//! Model-checked tests for the materialization protocol.
//!
//! With `--cfg loom` the container's lock and state flag are replaced by
//! loom's instrumented types, so every interleaving of the scenarios below
//! is explored.
//!
//! # Running these tests
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test --release --test container_loom_tests
//! ```

#![cfg(loom)]

use std::sync::atomic::{AtomicUsize, Ordering};

use deferred_collections::container::{LazySource, OrderedContainer, UniqueContainer};
use loom::sync::Arc;
use loom::thread;

fn counting_source(drains: &std::sync::Arc<AtomicUsize>) -> LazySource<u8> {
    let drains = std::sync::Arc::clone(drains);
    LazySource::new((0..3).inspect(move |value| {
        if *value == 0 {
            drains.fetch_add(1, Ordering::SeqCst);
        }
    }))
}

#[test]
fn loom_materializes_exactly_once() {
    loom::model(|| {
        let drains = std::sync::Arc::new(AtomicUsize::new(0));
        let list = Arc::new(OrderedContainer::from_source(counting_source(&drains)));

        let other = Arc::clone(&list);
        let handle = thread::spawn(move || other.len());

        assert_eq!(list.len(), 3);
        assert_eq!(handle.join().unwrap(), 3);
        assert_eq!(drains.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn loom_fast_path_sees_published_store() {
    loom::model(|| {
        let list = Arc::new(OrderedContainer::from_source(LazySource::new(vec![1_u8, 2])));

        let other = Arc::clone(&list);
        let handle = thread::spawn(move || {
            other.validate();
            other.to_vec()
        });

        let observed = if list.is_validated() {
            list.to_vec()
        } else {
            list.validate();
            list.to_vec()
        };

        assert_eq!(observed, vec![1, 2]);
        assert_eq!(handle.join().unwrap(), vec![1, 2]);
    });
}

#[test]
fn loom_lazy_add_races_with_materialization() {
    loom::model(|| {
        let set = Arc::new(UniqueContainer::from_source(LazySource::new(vec![1_u8])));

        let other = Arc::clone(&set);
        let handle = thread::spawn(move || {
            other.add(2);
        });

        set.validate();
        handle.join().unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains(&2));
    });
}
