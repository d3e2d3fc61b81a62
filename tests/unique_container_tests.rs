#![cfg(feature = "container")]

use deferred_collections::container::{
    ContainerError, LazySource, MembershipMode, UniqueContainer,
};
use rstest::rstest;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Uniqueness
// =============================================================================

#[rstest]
fn duplicates_collapse_on_materialization() {
    let set = UniqueContainer::from_source(vec![1, 1, 2]);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&1));
    assert!(set.contains(&2));
    assert_eq!(set.into_backing(), HashSet::from([1, 2]));
}

#[rstest]
fn lazy_duplicate_add_is_accepted_then_collapsed() {
    let set = UniqueContainer::from_source(vec![1, 2]);
    assert!(set.add(2));
    assert!(!set.is_validated());
    assert_eq!(set.len(), 2);
    assert!(!set.add(2));
}

#[rstest]
fn for_each_visits_each_distinct_element_once() {
    let set = UniqueContainer::with_backing(vec![3, 3, 1, 3], BTreeSet::new()).unwrap();
    let mut seen = Vec::new();
    set.for_each(|value| seen.push(*value));
    assert_eq!(seen, vec![3, 1]);
    assert_eq!(set.to_vec(), vec![1, 3]);
}

#[rstest]
#[case(HashSet::from([0]))]
#[case(HashSet::from([0, 1, 2]))]
fn non_empty_backing_is_rejected(#[case] backing: HashSet<i32>) {
    let len = backing.len();
    let result = UniqueContainer::with_backing(LazySource::empty(), backing);
    assert_eq!(
        result.map(|_| ()),
        Err(ContainerError::NonEmptyBacking { len })
    );
}

#[rstest]
fn non_empty_btree_backing_is_rejected() {
    let result = UniqueContainer::with_backing(vec!["a"], BTreeSet::from(["b"]));
    assert!(matches!(
        result,
        Err(ContainerError::NonEmptyBacking { len: 1 })
    ));
}

// =============================================================================
// Lazy Mutation Folding
// =============================================================================

#[rstest]
fn lazy_remove_drops_every_occurrence() {
    let set = UniqueContainer::from_source(vec![5, 6, 5]);
    assert!(set.remove(&5));
    assert!(!set.is_validated());
    assert_eq!(set.to_vec(), vec![6]);
}

#[rstest]
fn lazy_remove_then_add_keeps_added_element() {
    let set = UniqueContainer::with_backing(vec![1, 2], BTreeSet::new()).unwrap();
    set.remove(&1);
    set.add(1);
    assert_eq!(set.to_vec(), vec![1, 2]);
}

#[rstest]
fn clear_works_in_both_states() {
    let lazy = UniqueContainer::from_source(vec![1, 2]);
    lazy.clear();
    assert_eq!(lazy.len(), 0);

    let materialized = UniqueContainer::from_source(vec![1, 2]);
    materialized.validate();
    materialized.clear();
    assert_eq!(materialized.len(), 0);
    assert!(materialized.is_empty());
}

#[rstest]
fn retain_all_after_materialization() {
    let set = UniqueContainer::with_backing(vec![1, 2, 3, 4], BTreeSet::new()).unwrap();
    set.validate();
    assert!(set.retain_all(vec![2, 4, 8]));
    assert!(!set.retain_all(vec![2, 4]));
    assert_eq!(set.to_vec(), vec![2, 4]);
}

// =============================================================================
// Membership Cache
// =============================================================================

#[rstest]
fn cached_membership_from_repeatable_source_does_not_materialize() {
    let passes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&passes);
    let set = UniqueContainer::with_options(
        LazySource::repeatable(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            0..100
        }),
        HashSet::new(),
        MembershipMode::Cached,
    )
    .unwrap();

    assert!(set.contains(&42));
    assert!(set.contains_all(&[0, 99]));
    assert!(!set.contains(&100));
    assert!(!set.is_validated());
    assert_eq!(passes.load(Ordering::SeqCst), 1);
}

#[rstest]
fn peeking_a_filtered_repeatable_source_keeps_cache_lazy() {
    let set = UniqueContainer::with_options(
        LazySource::repeatable(|| 0..10),
        HashSet::new(),
        MembershipMode::Cached,
    )
    .unwrap();
    set.remove(&3);

    assert!(!set.is_empty());
    assert!(set.contains(&5));
    assert!(!set.contains(&3));
    assert!(!set.is_validated());
    assert_eq!(set.len(), 9);
}

#[rstest]
fn cache_is_rebuilt_after_mutation() {
    let set = UniqueContainer::from_source(LazySource::repeatable(|| vec!['a', 'b']))
        .with_membership_cache();
    assert!(!set.contains(&'c'));

    set.add('c');
    assert!(set.contains(&'c'));

    set.validate();
    set.remove(&'a');
    assert!(!set.contains(&'a'));
    assert!(set.contains_all(&['b', 'c']));
}

#[rstest]
fn direct_mode_is_the_default() {
    let set: UniqueContainer<u8> = UniqueContainer::new();
    assert_eq!(set.membership_mode(), MembershipMode::Direct);
}

// =============================================================================
// Conversion
// =============================================================================

#[rstest]
fn into_iter_yields_distinct_elements() {
    let set = UniqueContainer::with_backing(vec![2, 1, 2], BTreeSet::new()).unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);
}

#[rstest]
fn collect_and_extend() {
    let mut set: UniqueContainer<&str> = ["x", "y", "x"].into_iter().collect();
    set.extend(["z", "y"]);
    assert_eq!(set.len(), 3);
    assert!(set.contains_all(&["x", "y", "z"]));
}

#[rstest]
fn debug_shows_materialized_store() {
    let set = UniqueContainer::with_backing(vec![1], BTreeSet::new()).unwrap();
    set.validate();
    assert_eq!(
        format!("{set:?}"),
        "UniqueContainer(Validatable { backing: {1}, membership: Direct })"
    );
}
