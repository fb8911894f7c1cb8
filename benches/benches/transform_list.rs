// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use std::cmp::Ordering;
use understory_observable::ObservableVec;
use understory_transform_list::{IndexMapping, IndexedView};

fn scrambled(len: usize) -> Vec<u32> {
    // Deterministic, well-mixed values without pulling in an RNG.
    (0..len as u64)
        .map(|i| (i.wrapping_mul(2_654_435_761) % 1_000_003) as u32)
        .collect()
}

fn bench_build_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_list/build_mapping");

    // Hypothesis: filter-first is cheaper than sort-first when the filter is
    // selective, since fewer items reach the comparator.
    let keep = |v: &u32| v % 8 == 0;
    let ascending = |a: &u32, b: &u32| a.cmp(b);
    for len in [1_024usize, 16_384, 131_072] {
        let items = scrambled(len);
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("filter_only", len), &items, |b, items| {
            b.iter(|| black_box(IndexMapping::build(items, Some(&keep), None, false)));
        });

        group.bench_with_input(BenchmarkId::new("filter_first", len), &items, |b, items| {
            b.iter(|| {
                black_box(IndexMapping::build(
                    items,
                    Some(&keep),
                    Some(&ascending),
                    false,
                ))
            });
        });

        group.bench_with_input(BenchmarkId::new("sort_first", len), &items, |b, items| {
            b.iter(|| {
                black_box(IndexMapping::build(
                    items,
                    Some(&keep),
                    Some(&ascending),
                    true,
                ))
            });
        });
    }

    group.finish();
}

fn bench_source_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_list/source_edit");

    // Every edit triggers a full rebuild; this tracks what a single push costs.
    for len in [1_024usize, 16_384] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("push", len), &len, |b, &len| {
            b.iter_batched(
                || {
                    let source = ObservableVec::from(scrambled(len));
                    let view = IndexedView::builder(&source)
                        .filter(|v: &u32| v % 2 == 0)
                        .comparator(|a: &u32, b: &u32| b.cmp(a))
                        .build();
                    (source, view)
                },
                |(source, view)| {
                    source.push(42);
                    black_box(view.len());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_index_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_list/translate");

    let len = 65_536;
    let source = ObservableVec::from(scrambled(len));
    let view = IndexedView::builder(&source)
        .filter(|v: &u32| v % 3 != 0)
        .comparator(|a: &u32, b: &u32| -> Ordering { a.cmp(b) })
        .build();
    group.throughput(Throughput::Elements(view.len() as u64));

    group.bench_function("view_to_source", |b| {
        b.iter(|| {
            let mut acc = 0_usize;
            for i in 0..view.len() {
                acc ^= view.view_to_source(i).unwrap_or(0);
            }
            black_box(acc)
        });
    });

    group.bench_function("source_to_view", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for j in 0..len {
                if let Ok(Some(_)) = view.source_to_view(j) {
                    hits += 1;
                }
            }
            black_box(hits)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build_mapping,
    bench_source_edits,
    bench_index_translation
);
criterion_main!(benches);
