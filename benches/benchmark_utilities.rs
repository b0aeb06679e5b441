use anyhow::Context;
use rand::{distributions::uniform::SampleUniform, Rng, SeedableRng};
use terramesh::{MeshNum, PlanarGraph, Point2};

pub const SEED: &[u8; 32] = b"\xfb\xdc\x4e\xa0\x30\xde\x82\xba\x69\x97\x3c\x52\x49\x4d\x00\xca
\x5c\x21\xa3\x8d\x5c\xf2\x34\x4e\x58\x7d\x80\x16\x66\x23\x30";

pub const SEED2: &[u8; 32] = b"\x65\xb8\x8e\x3c\x9f\xd8\xb4\x92\xf2\x2e\xcd\x18\xf7\xbc\x2b\x29
dd\xd2\xf3\xa8\x3b\xf4\xe5\x65\xa0\x10\x60\xb1\xce\x22";

pub const RANGE: f64 = 1000.0;

pub fn uniform_distribution<S: MeshNum + SampleUniform>(
    seed: [u8; 32],
    range: S,
) -> impl Iterator<Item = Point2<S>>
where
    S::Sampler: Copy,
{
    let range = rand::distributions::Uniform::new_inclusive(-range, range);
    let mut rng = rand::rngs::StdRng::from_seed(seed);
    std::iter::from_fn(move || Some(Point2::new(rng.sample(range), rng.sample(range))))
}

pub fn uniform_f64() -> impl Iterator<Item = Point2<f64>> {
    uniform_distribution(*SEED, RANGE)
}

/// A square boundary of side length `2 * RANGE` with random interior points.
pub fn square_with_points(num_points: usize) -> anyhow::Result<PlanarGraph<f64>> {
    let mut graph = PlanarGraph::new();
    graph
        .add_polygon([
            Point2::new(-RANGE, -RANGE),
            Point2::new(RANGE, -RANGE),
            Point2::new(RANGE, RANGE),
            Point2::new(-RANGE, RANGE),
        ])
        .context("adding boundary")?;
    graph
        .add_vertices(uniform_distribution(*SEED2, RANGE * 0.99).take(num_points))
        .context("adding interior points")?;
    Ok(graph)
}

/// A closed, star shaped polygon with `num_vertices` corners.
pub fn star_polygon(num_vertices: usize) -> anyhow::Result<PlanarGraph<f64>> {
    let mut graph = PlanarGraph::new();
    let points = (0..num_vertices).map(|index| {
        let angle = index as f64 / num_vertices as f64 * std::f64::consts::TAU;
        let radius = if index % 2 == 0 { RANGE } else { RANGE * 0.6 };
        Point2::new(angle.cos() * radius, angle.sin() * radius)
    });
    graph.add_polygon(points).context("adding star polygon")?;
    Ok(graph)
}
