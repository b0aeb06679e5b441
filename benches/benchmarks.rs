use criterion::*;

mod benchmark_utilities;
mod refine_benchmark;
mod triangulate_benchmark;

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = locate_benchmark::locate_benchmark, triangulate_benchmark::triangulate_benchmark, refine_benchmark::refine_benchmark
}

criterion_main!(benches);
