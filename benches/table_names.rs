use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use filedriver::discovery::glob::{compile, matches};
use filedriver::discovery::naming::derive_all;

fn synthetic_paths(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("/data/{}/{:02}/{:02}/sales-{:05}.csv", 2020 + i % 5, 1 + i % 12, 1 + i % 28, i))
        .collect()
}

fn bench_table_names(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_names");
    group.sample_size(30);

    for &n in &[1_000usize, 20_000usize] {
        let paths = synthetic_paths(n);
        group.throughput(Throughput::Elements(n as u64));

        let matcher = compile("**/sales-*.csv").expect("glob");
        group.bench_with_input(BenchmarkId::new("glob_match", n), &paths, |b, paths| {
            b.iter(|| {
                paths
                    .iter()
                    .filter(|p| {
                        let rel = p.strip_prefix("/data/").unwrap_or(p);
                        let leaf = rel.rsplit('/').next().unwrap_or(rel);
                        matches(&matcher, rel, leaf)
                    })
                    .count()
            })
        });

        group.bench_with_input(BenchmarkId::new("derive_all", n), &paths, |b, paths| {
            b.iter(|| derive_all(paths, "/data").expect("unique names").len())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_table_names);
criterion_main!(benches);
