// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::cell::Cell;
use std::rc::Rc;
use understory_observable::{ObservableValue, ObservableVec, Subscription};

fn bench_list_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("observable/list_push");

    // Listener sets are inline up to two entries; measure across that boundary.
    for listeners in [0usize, 1, 2, 8] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, &listeners| {
                let list: ObservableVec<u32> = ObservableVec::new();
                let hits = Rc::new(Cell::new(0_u64));
                let _subs: Vec<Subscription> = (0..listeners)
                    .map(|_| {
                        let hits = hits.clone();
                        list.subscribe(move |_| hits.set(hits.get() + 1))
                    })
                    .collect();
                b.iter(|| {
                    list.push(black_box(1));
                    if list.len() > 4_096 {
                        list.clear();
                    }
                });
                black_box(hits.get());
            },
        );
    }

    group.finish();
}

fn bench_value_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("observable/value_set");

    let value = ObservableValue::new(0_u64);
    let sum = Rc::new(Cell::new(0_u64));
    let sink = sum.clone();
    let _sub = value.subscribe(move |_, new| sink.set(sink.get().wrapping_add(*new)));

    group.bench_function("changed", |b| {
        let mut next = 0_u64;
        b.iter(|| {
            next = next.wrapping_add(1);
            black_box(value.set(next))
        });
    });

    group.bench_function("unchanged", |b| {
        b.iter(|| black_box(value.set(value.get())));
    });

    group.finish();
}

criterion_group!(benches, bench_list_notify, bench_value_set);
criterion_main!(benches);
