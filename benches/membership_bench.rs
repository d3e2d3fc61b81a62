//! Membership query benchmark.
//!
//! Compares `contains` in direct mode (materialize, then query the store)
//! against the membership cache, for an ordered container whose store has
//! linear lookups and for a unique container backed by a hash set.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use deferred_collections::container::{
    LazySource, MembershipMode, OrderedContainer, UniqueContainer,
};
use std::collections::HashSet;
use std::hint::black_box;

const SIZES: [u32; 3] = [100, 1_000, 10_000];

fn benchmark_ordered_contains(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("membership_ordered");

    for size in SIZES {
        let direct = OrderedContainer::from_source(LazySource::new(0..size));
        direct.validate();
        group.bench_with_input(BenchmarkId::new("direct", size), &size, |bencher, &size| {
            bencher.iter(|| black_box(direct.contains(black_box(&(size - 1)))));
        });

        let cached = OrderedContainer::with_options(
            LazySource::new(0..size),
            Vec::new(),
            MembershipMode::Cached,
        )
        .expect("backing store is empty");
        group.bench_with_input(BenchmarkId::new("cached", size), &size, |bencher, &size| {
            bencher.iter(|| black_box(cached.contains(black_box(&(size - 1)))));
        });
    }

    group.finish();
}

fn benchmark_unique_contains_without_materializing(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("membership_unique_repeatable");

    for size in SIZES {
        group.bench_with_input(BenchmarkId::new("first_query", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let set = UniqueContainer::with_options(
                    LazySource::repeatable(move || 0..size),
                    HashSet::new(),
                    MembershipMode::Cached,
                )
                .expect("backing store is empty");
                black_box(set.contains(&(size / 2)))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_ordered_contains,
    benchmark_unique_contains_without_materializing
);

criterion_main!(benches);
