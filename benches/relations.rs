//! Relationship resolver benchmark suite.
//!
//! Benchmarks opener-graph queries on synthetic snapshots:
//! - Tab counts: 100, 1000, 10000
//! - Shapes: wide (every tab opened from one root), deep (a single chain)
//!
//! Run with: cargo bench --bench relations
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use webext_tabkit::{ConsideredSet, Depth, Resolver, Tab, TabId, TabSnapshot, WindowId};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const TAB_COUNTS: &[u32] = &[100, 1_000, 10_000];

// ============================================================================
// Snapshot Builders
// ============================================================================

fn tab_id(raw: u32) -> TabId {
    TabId::new(raw).expect("tab ids start at 1")
}

/// Tab 1 is the root; every other tab was opened from it or from a
/// previous tab, giving a bushy tree.
fn wide_snapshot(count: u32) -> TabSnapshot {
    let tabs = (1..=count)
        .map(|id| {
            let tab = Tab::new(tab_id(id), WindowId::new(1)).with_index(id - 1);
            if id == 1 { tab } else { tab.with_opener(tab_id(id / 2)) }
        })
        .collect();
    TabSnapshot::new(tabs)
}

/// Each tab was opened from the previous one.
fn deep_snapshot(count: u32) -> TabSnapshot {
    let tabs = (1..=count)
        .map(|id| {
            let tab = Tab::new(tab_id(id), WindowId::new(1)).with_index(id - 1);
            if id == 1 { tab } else { tab.with_opener(tab_id(id - 1)) }
        })
        .collect();
    TabSnapshot::new(tabs)
}

// ============================================================================
// Benchmark: Descendants
// ============================================================================

fn bench_descendants(c: &mut Criterion) {
    let mut group = c.benchmark_group("descendants");

    for &count in TAB_COUNTS {
        let snapshot = wide_snapshot(count);
        let considered = ConsideredSet::from_snapshot(&snapshot);

        group.bench_with_input(BenchmarkId::new("wide", count), &count, |b, _| {
            let resolver = Resolver::new(&snapshot, &considered);
            b.iter(|| resolver.descendants(black_box(tab_id(1)), Depth::Unbounded).len());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Ancestors
// ============================================================================

fn bench_ancestors(c: &mut Criterion) {
    let mut group = c.benchmark_group("ancestors");

    for &count in TAB_COUNTS {
        let snapshot = deep_snapshot(count);
        let considered = ConsideredSet::from_snapshot(&snapshot);

        group.bench_with_input(BenchmarkId::new("deep", count), &count, |b, &last| {
            let resolver = Resolver::new(&snapshot, &considered);
            b.iter(|| resolver.ancestors(black_box(tab_id(last)), Depth::Unbounded).len());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Siblings
// ============================================================================

fn bench_siblings(c: &mut Criterion) {
    let mut group = c.benchmark_group("siblings");

    for &count in TAB_COUNTS {
        let snapshot = wide_snapshot(count);
        let considered = ConsideredSet::from_snapshot(&snapshot);
        let focal = snapshot.get(tab_id(count)).cloned().expect("last tab");

        group.bench_with_input(BenchmarkId::new("wide", count), &count, |b, _| {
            let resolver = Resolver::new(&snapshot, &considered);
            b.iter(|| resolver.siblings(black_box(&focal)).len());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_descendants, bench_ancestors, bench_siblings);
criterion_main!(benches);
