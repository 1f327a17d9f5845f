//! Tracing Hot-Path Benchmarks
//!
//! Measures the per-span cost an instrumented application pays:
//!
//! - `span/*`: full start + end through the facade (registry lookup,
//!   context push/pop, statistics recording)
//! - `record/*`: the statistics recorder in isolation
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench trace_overhead
//! cargo bench --bench trace_overhead -- "span"   # specific group
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proftree::{PointStats, Profiler};
use std::time::Duration;

fn bench_span(c: &mut Criterion) {
    let mut group = c.benchmark_group("span");

    group.bench_function("flat", |b| {
        let profiler = Profiler::new();
        b.iter(|| {
            profiler.start(black_box("bench.flat")).end();
        });
    });

    group.bench_function("nested_three_deep", |b| {
        let profiler = Profiler::new();
        b.iter(|| {
            let outer = profiler.start("bench.outer");
            let mid = profiler.start("bench.mid");
            profiler.start("bench.inner").end();
            mid.end();
            outer.end();
        });
    });

    group.bench_function("inherited_name", |b| {
        let profiler = Profiler::new();
        b.iter(|| {
            let outer = profiler.start("bench.parent");
            profiler.start_inherited(black_box("child")).end();
            outer.end();
        });
    });

    group.finish();
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");

    group.bench_function("single_point", |b| {
        let stats = PointStats::new();
        b.iter(|| {
            stats.record(black_box(Duration::from_nanos(1_500)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_span, bench_record);
criterion_main!(benches);
