#![cfg(feature = "serde")]

use deferred_collections::container::{LazySource, OrderedContainer, UniqueContainer};
use rstest::rstest;
use std::collections::BTreeSet;

#[rstest]
fn ordered_serializes_as_sequence() {
    let list = OrderedContainer::from_source(LazySource::new(vec![3, 1, 2]));
    list.add(4);

    let json = serde_json::to_string(&list).unwrap();
    assert_eq!(json, "[3,1,2,4]");
    assert!(list.is_validated());
}

#[rstest]
fn ordered_deserializes_lazily() {
    let list: OrderedContainer<String> = serde_json::from_str(r#"["a","b"]"#).unwrap();
    assert!(!list.is_validated());
    assert_eq!(list.to_vec(), vec!["a".to_string(), "b".to_string()]);
}

#[rstest]
fn unique_round_trip_drops_duplicates() {
    let set: UniqueContainer<i32> = serde_json::from_str("[1,2,2,3]").unwrap();
    assert_eq!(set.len(), 3);

    let json = serde_json::to_string(&set).unwrap();
    let decoded: BTreeSet<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, BTreeSet::from([1, 2, 3]));
}

#[rstest]
fn unique_with_btree_backing_serializes_sorted() {
    let set = UniqueContainer::with_backing(vec![9, 7, 8], BTreeSet::new()).unwrap();
    assert_eq!(serde_json::to_string(&set).unwrap(), "[7,8,9]");
}

#[rstest]
fn malformed_input_is_an_error() {
    let result: Result<OrderedContainer<i32>, _> = serde_json::from_str(r#"{"a":1}"#);
    assert!(result.is_err());
}
