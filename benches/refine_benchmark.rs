use std::time::Duration;

use criterion::*;
use terramesh::{AngleLimit, RefinementParameters};

use crate::benchmark_utilities::*;

pub fn refine_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine");
    group
        .sample_size(20)
        .measurement_time(Duration::from_secs(8));

    for angle in [20.0, 30.0] {
        let mesh = star_polygon(200).unwrap().triangulate().unwrap();
        let parameters =
            RefinementParameters::new().with_angle_limit(AngleLimit::from_deg(angle));
        group.bench_with_input(
            BenchmarkId::new("star polygon, angle limit", angle),
            &parameters,
            |b, parameters| {
                b.iter_batched(
                    || mesh.clone(),
                    |mut mesh| mesh.refine(parameters),
                    BatchSize::LargeInput,
                )
            },
        );
    }

    for max_area in [1000.0, 100.0] {
        let mesh = square_with_points(500).unwrap().triangulate().unwrap();
        let parameters = RefinementParameters::new().with_max_allowed_area(max_area);
        group.bench_with_input(
            BenchmarkId::new("square, max area", max_area),
            &parameters,
            |b, parameters| {
                b.iter_batched(
                    || mesh.clone(),
                    |mut mesh| mesh.refine(parameters),
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}
