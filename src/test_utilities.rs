use crate::mesh_core::math;
use crate::mesh_core::FixedVertexHandle;
use crate::{AngleLimit, Mesh, PlanarGraph, Point2};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;

pub const SEED: &[u8; 32] = b"wPYxAkIiHcEmSBAxQFoXFrpYToCe1B71";
pub const SEED2: &[u8; 32] = b"14LzG37Y9EHTcmLW8vBDqWwtYsCeVVyF";

pub fn random_points_in_range(range: f64, size: usize, seed: &[u8; 32]) -> Vec<Point2<f64>> {
    let mut rng = rand::rngs::StdRng::from_seed(*seed);
    let range = Uniform::new(-range, range);
    let mut points = Vec::with_capacity(size);
    for _ in 0..size {
        let x = range.sample(&mut rng);
        let y = range.sample(&mut rng);
        points.push(Point2::new(x, y));
    }
    points
}

pub fn random_points_with_seed(size: usize, seed: &[u8; 32]) -> Vec<Point2<f64>> {
    random_points_in_range(1.0, size, seed)
}

pub fn check_area_bound(mesh: &Mesh<f64>, max_area: f64) {
    for triangle in mesh.triangles() {
        assert!(
            triangle.area() <= max_area,
            "Triangle {:?} has area {}",
            triangle.positions(),
            triangle.area()
        );
    }
}

/// Angles between two constraint edges cannot be improved and are skipped.
pub fn check_min_angle(mesh: &Mesh<f64>, limit: AngleLimit) {
    for triangle in mesh.triangles() {
        let positions = triangle.positions();
        if math::quality_key(positions) <= limit.quality_key_limit() {
            continue;
        }
        let (apex, _) = math::shortest_edge(positions);
        let edges = triangle.edges();
        let is_input_angle = [(apex + 1) % 3, (apex + 2) % 3]
            .iter()
            .all(|slot| edges[*slot].is_constrained());
        assert!(
            is_input_angle,
            "Triangle {:?} has a minimum angle of {} degrees",
            positions,
            triangle.min_angle().to_degrees()
        );
    }
}

/// Checks that every segment of the graph is covered by a chain of constraint edges.
///
/// Split vertices are rounded and rarely lie exactly on a slanted segment, chain vertices only
/// need to lie within a small relative distance of the segment line.
pub fn check_constraints(mesh: &Mesh<f64>, graph: &PlanarGraph<f64>) {
    const TOLERANCE: f64 = 1e-9;

    for [from, to] in graph.segments() {
        let from = mesh.input_vertex(*from).unwrap().fix();
        let to = mesh.input_vertex(*to).unwrap().fix();
        let origin = mesh.vertex(from).position();
        let dir = mesh.vertex(to).position().sub(origin);
        let length_2 = dir.length2();

        // Position of a point along the segment (0 at `from`, 1 at `to`) and its distance to the
        // segment line, both relative to the segment length
        let project = |vertex: FixedVertexHandle| {
            let offset = mesh.vertex(vertex).position().sub(origin);
            let along = offset.dot(dir) / length_2;
            let across = (dir.x * offset.y - dir.y * offset.x).abs() / length_2;
            (along, across)
        };

        let mut current = from;
        let mut current_along = 0.0;
        let mut steps = 0;
        while current != to {
            let next = mesh
                .subsegments()
                .filter_map(|subsegment| {
                    let [v0, v1] = subsegment.vertices().map(|vertex| vertex.fix());
                    match (v0 == current, v1 == current) {
                        (true, _) => Some(v1),
                        (_, true) => Some(v0),
                        _ => None,
                    }
                })
                .find(|other| {
                    let (along, across) = project(*other);
                    *other == to
                        || (across <= TOLERANCE && along > current_along && along < 1.0)
                });
            current = next.unwrap_or_else(|| {
                panic!("Segment {:?} -> {:?} is not covered by sub-segments", from, to)
            });
            current_along = project(current).0;
            steps += 1;
            assert!(steps <= mesh.num_subsegments());
        }
    }
}
