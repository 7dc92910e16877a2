// Criterion benchmarks for the harness hot spots: scheme resolution,
// timing-table re-sort/render, and perf-log parsing.
//
// None of these are on a kernel path, but the table rewrite runs once
// per (label, run) and grows with history, so its cost is worth
// tracking.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use tile_bench::cli::PartMode;
use tile_bench::perflog;
use tile_bench::report::timetable::{parse_rows, render, sort_rows, TimingRecord};
use tile_bench::schemes::{resolve, supported_modes};

fn bench_resolve(c: &mut Criterion) {
    c.bench_function("resolve_all_schemes", |b| {
        b.iter(|| {
            for &mode in supported_modes() {
                let scheme = resolve(black_box(mode), PartMode::Chunk, black_box(20)).unwrap();
                black_box(scheme);
            }
        })
    });
}

fn bench_table_rewrite(c: &mut Criterion) {
    let rows: Vec<_> = (0..500)
        .map(|i| {
            TimingRecord {
                total_time: ((i * 7919) % 500) as f64 / 10.0,
                avg_compute: 1.0,
                avg_compute_comm: 1.2,
                timesteps: 100,
                mode: format!("loops{}", i % 25 + 1),
                tile_size: 20,
                partitioning: "chunk".to_string(),
                extra_halo: false,
                glb_maps: false,
                coloring: "default".to_string(),
                prefetch: false,
            }
            .fields()
        })
        .collect();
    let content = render(&rows);

    c.bench_function("table_parse_sort_render_500", |b| {
        b.iter(|| {
            let mut rows = parse_rows(black_box(&content));
            sort_rows(&mut rows);
            black_box(render(&rows));
        })
    });
}

fn bench_perflog_parse(c: &mut Criterion) {
    let mut dump = String::new();
    for rank in 0..64 {
        dump.push_str(&format!(
            "event=kernel_compute rank={} time={}\n",
            rank,
            rank as f64 * 0.01
        ));
        dump.push_str(&format!(
            "event=halo_exchange rank={} time={}\n",
            rank,
            rank as f64 * 0.001
        ));
    }

    c.bench_function("perflog_parse_64_ranks", |b| {
        b.iter(|| black_box(perflog::parse(black_box(&dump), 64).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_table_rewrite,
    bench_perflog_parse
);
criterion_main!(benches);
