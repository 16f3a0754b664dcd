//! Flat traversal benchmarks using criterion for historical comparison.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flatview::{FlatTraversal, MemoryTable, Scalar, SortEntry, SortSpec, TraversalConfig};

fn table(rows: u64) -> MemoryTable<u64> {
    let mut table = MemoryTable::new(["symbol", "price", "qty"]);
    for i in 0..rows {
        table.insert_row(
            i,
            [
                Scalar::from(format!("SYM{}", i % 97)),
                Scalar::Float(((i * 7919) % 10_007) as f64 / 3.0),
                Scalar::Int((i % 13) as i64 - 6),
            ],
        );
    }
    table
}

fn spec() -> SortSpec {
    SortSpec::new(vec![SortEntry::ascending(0), SortEntry::descending(1)])
}

fn loaded(table: &MemoryTable<u64>, rows: u64, config: TraversalConfig) -> FlatTraversal<u64> {
    let mut view = FlatTraversal::new(config);
    view.sort_by(table, table, spec()).unwrap();
    view.step_begin().unwrap();
    for i in 0..rows {
        view.add_row(table, i).unwrap();
    }
    view.step_end().unwrap();
    view
}

fn resort_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("resort");

    for count in [1_000, 10_000, 100_000] {
        let table = table(count);
        group.throughput(Throughput::Elements(count));

        for (name, threshold) in [("sequential", None), ("parallel", Some(1))] {
            let config = TraversalConfig::default().with_parallel_sort_threshold(threshold);
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, &count| {
                let mut view = loaded(&table, count, config.clone());
                let mut flip = false;
                b.iter(|| {
                    flip = !flip;
                    let entry = if flip {
                        SortEntry::descending(2)
                    } else {
                        SortEntry::ascending(2)
                    };
                    view.sort_by(&table, &table, SortSpec::new(vec![entry])).unwrap();
                    black_box(view.key_at(0));
                });
            });
        }
    }

    group.finish();
}

fn step_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_commit");

    for count in [1_000, 10_000, 100_000] {
        let mut table = table(count);
        let batch = count / 100;
        group.throughput(Throughput::Elements(batch));

        group.bench_with_input(BenchmarkId::new("update_1pct", count), &count, |b, &count| {
            let mut view = loaded(&table, count, TraversalConfig::default());
            let mut round = 0_u64;
            b.iter(|| {
                round += 1;
                for i in 0..batch {
                    let key = (i * 101 + round) % count;
                    table.set(&key, "price", ((key + round) % 500) as f64);
                }
                view.step_begin().unwrap();
                for i in 0..batch {
                    view.update_row(&table, (i * 101 + round) % count).unwrap();
                }
                view.step_end().unwrap();
                black_box(view.size());
            });
        });
    }

    group.finish();
}

fn query_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let count = 100_000;
    let table = table(count);
    let view = loaded(&table, count, TraversalConfig::default());
    let keys: Vec<u64> = (0..count).step_by(37).collect();

    group.bench_function("position_of", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(view.position_of(key));
            }
        });
    });

    group.bench_function("positions_for_keys_in", |b| {
        b.iter(|| black_box(view.positions_for_keys_in(1_000, 2_000, &keys)));
    });

    group.bench_function("lower_bound_position", |b| {
        let values = [Scalar::from("SYM50"), Scalar::Float(1_234.5), Scalar::Null];
        b.iter(|| black_box(view.lower_bound_position(&table, &values).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, resort_benchmarks, step_benchmarks, query_benchmarks);
criterion_main!(benches);
