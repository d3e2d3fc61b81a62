//! Concurrency tests for lazy containers.
//!
//! These tests verify single-flight materialization and safe publication
//! through multi-threaded stress testing. Each scenario is repeated to give
//! racing threads a chance to interleave differently.
//!
//! # Running these tests
//!
//! ```bash
//! cargo test --test concurrent_container_tests
//! ```

#![cfg(feature = "container")]

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use deferred_collections::container::{
    LazySource, MembershipMode, OrderedContainer, UniqueContainer,
};

const THREADS: usize = 8;
const ROUNDS: usize = 100;

/// A source that counts how many times it has been drained.
fn counting_source(drains: &Arc<AtomicUsize>) -> LazySource<usize> {
    let drains = Arc::clone(drains);
    LazySource::new((0..64).inspect(move |value| {
        if *value == 0 {
            drains.fetch_add(1, Ordering::SeqCst);
        }
    }))
}

/// Test that concurrent store-dependent calls drain the source exactly once.
#[test]
fn test_concurrent_materialization_exactly_once() {
    for _ in 0..ROUNDS {
        let drains = Arc::new(AtomicUsize::new(0));
        let list = Arc::new(OrderedContainer::from_source(counting_source(&drains)));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let list = Arc::clone(&list);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    list.len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 64);
        }
        assert_eq!(drains.load(Ordering::SeqCst), 1);
    }
}

/// Test that every thread observes the fully materialized store.
///
/// Threads use different triggers so the fast path and the locked path race.
#[test]
fn test_all_threads_observe_complete_store() {
    for _ in 0..ROUNDS {
        let list = Arc::new(OrderedContainer::from_source(LazySource::new(0..32)));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|index| {
                let list = Arc::clone(&list);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let snapshot = match index % 4 {
                        0 => list.to_vec(),
                        1 => vec![list.get(31).unwrap_or_default()],
                        2 => {
                            let mut visited = Vec::new();
                            list.for_each(|value| visited.push(*value));
                            visited
                        }
                        _ => {
                            list.validate();
                            list.iter().collect()
                        }
                    };
                    (index, snapshot, list.is_validated())
                })
            })
            .collect();

        for handle in handles {
            let (index, snapshot, validated) = handle.join().unwrap();
            assert!(validated);
            if index % 4 == 1 {
                assert_eq!(snapshot, vec![31]);
            } else {
                assert_eq!(snapshot, (0..32).collect::<Vec<_>>());
            }
        }
    }
}

/// Test that lazy-phase mutations from many threads are all represented.
#[test]
fn test_concurrent_lazy_adds_are_not_lost() {
    for _ in 0..ROUNDS {
        let set = Arc::new(UniqueContainer::from_source(LazySource::new(0..4)));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|index| {
                let set = Arc::clone(&set);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    set.add(100 + index);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let expected: HashSet<usize> = (0..4).chain((0..THREADS).map(|index| 100 + index)).collect();
        assert_eq!(set.len(), expected.len());
        assert!(set.contains_all(&expected));
    }
}

/// Test that mutations racing with materialization are never lost.
#[test]
fn test_adds_racing_with_materialization() {
    for _ in 0..ROUNDS {
        let list = Arc::new(OrderedContainer::from_source(LazySource::new(0..16)));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|index| {
                let list = Arc::clone(&list);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if index % 2 == 0 {
                        list.add(1_000 + index);
                    } else {
                        list.validate();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let elements = list.to_vec();
        assert_eq!(elements.len(), 16 + THREADS / 2);
        assert_eq!(&elements[..16], (0..16).collect::<Vec<_>>().as_slice());
    }
}

/// Test that concurrent cached membership queries build a consistent cache.
#[test]
fn test_concurrent_cached_membership() {
    for _ in 0..ROUNDS {
        let set = Arc::new(
            UniqueContainer::with_options(
                LazySource::repeatable(|| 0..256_u32),
                HashSet::new(),
                MembershipMode::Cached,
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..THREADS)
            .map(|index| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    let probe = u32::try_from(index * 31).unwrap_or(u32::MAX);
                    set.contains(&probe)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert!(!set.is_validated());
    }
}

/// Test that a panicking source poisons the container for every thread.
#[test]
fn test_poisoning_is_visible_to_all_threads() {
    let list = Arc::new(OrderedContainer::from_source(LazySource::new((0..4).map(
        |value| {
            assert!(value != 2, "source exploded");
            value
        },
    ))));

    let first = catch_unwind(AssertUnwindSafe(|| list.len()));
    assert!(first.is_err());
    assert!(list.is_poisoned());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || list.to_vec())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_err());
    }
}
