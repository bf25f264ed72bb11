//! Criterion benches for the parity pipeline (group "parity").
//!
//! - Row building from a random chart.
//! - Graph construction (placement enumeration + cost model).
//! - Full analysis: graph, cheapest path and tech tags.
//!
//! Charts come from the seeded generator, so runs are reproducible.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use stepparity::api::*;

fn chart(steps: usize, columns: usize) -> (Vec<Note>, ConstantBpm) {
    let params = ChartGenParams {
        steps,
        subdivision: 4,
        ..Default::default()
    };
    let timing = ConstantBpm::new(params.bpm);
    let notes = random_chart(params, columns, 42).expect("valid params");
    (notes, timing)
}

fn bench_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("parity");
    for steps in [256usize, 1024] {
        let (notes, timing) = chart(steps, 4);
        group.throughput(Throughput::Elements(notes.len() as u64));
        group.bench_function(BenchmarkId::new("build_rows", steps), |b| {
            b.iter(|| build_rows(&notes, 4, &timing).len())
        });
    }
    group.finish();
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("parity");
    for layout in [StageLayout::dance_single(), StageLayout::dance_double()] {
        let (notes, timing) = chart(512, layout.column_count());
        let rows = build_rows(&notes, layout.column_count(), &timing);
        group.bench_function(BenchmarkId::new("build_graph", layout.name()), |b| {
            b.iter_batched(
                || Analyzer::new(layout.clone(), Weights::default()),
                |mut analyzer| analyzer.build_graph(&rows, None).len(),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("parity");
    group.sample_size(20);
    let (notes, timing) = chart(1024, 4);
    let mut overrides = BeatOverrides::new(4);
    overrides.add_note_override(8.0, 0, Foot::RightHeel);
    let mut analyzer = Analyzer::new(StageLayout::dance_single(), Weights::default());
    group.bench_function(BenchmarkId::new("analyze", "free"), |b| {
        b.iter(|| analyzer.analyze(&notes, &timing, None).map(|a| a.parities.len()))
    });
    group.bench_function(BenchmarkId::new("analyze", "overridden"), |b| {
        b.iter(|| {
            analyzer
                .analyze(&notes, &timing, Some(&overrides))
                .map(|a| a.parities.len())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_rows, bench_graph, bench_analyze);
criterion_main!(benches);
