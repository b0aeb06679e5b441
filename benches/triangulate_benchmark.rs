use criterion::*;

use crate::benchmark_utilities::*;

pub fn triangulate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulate");

    for size in [1000, 4000, 16_000, 64_000] {
        let graph = square_with_points(size).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("square with random points", size),
            &graph,
            |b, graph| b.iter(|| graph.triangulate().unwrap()),
        );
    }

    for size in [100, 1000, 10_000] {
        let graph = star_polygon(size).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("star polygon", size),
            &graph,
            |b, graph| b.iter(|| graph.triangulate().unwrap()),
        );
    }

    group.finish();
}
