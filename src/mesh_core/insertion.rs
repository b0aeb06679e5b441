use log::trace;
use smallvec::SmallVec;

use super::handles::*;
use super::math::{contained_in_circumference, orientation, Orientation};
use super::store::{TriangleStore, VertexKind};
use super::store_operations::{flip, split_edge, split_triangle};
use crate::{MeshNum, Point2};

/// Describes where a point lies relative to a triangulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointLocation {
    /// The point lies in the interior of a triangle.
    Inside(FixedTriangleHandle),
    /// The point lies on the interior of an edge.
    OnEdge(OrientedTriangle),
    /// The point coincides with a vertex.
    OnVertex(FixedVertexHandle),
    /// The point lies outside of the triangulation. The edge faces the point.
    Outside(OrientedTriangle),
}

impl PointLocation {
    /// Returns a triangle that contains the point in its interior or on its boundary.
    pub(crate) fn containing_triangle<S: Copy>(
        &self,
        store: &TriangleStore<S>,
    ) -> Option<FixedTriangleHandle> {
        match self {
            PointLocation::Inside(triangle) => Some(*triangle),
            PointLocation::OnEdge(edge) => Some(edge.triangle()),
            PointLocation::OnVertex(vertex) => store.vertex_entry(*vertex).triangle,
            PointLocation::Outside(_) => None,
        }
    }
}

/// Result of inserting a single vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InsertionOutcome {
    /// A new vertex was created. The triangles around it can be enumerated with
    /// [VertexHandle::triangles].
    Inserted(FixedVertexHandle),
    /// The position coincides with an existing vertex. Nothing was changed.
    Duplicate(FixedVertexHandle),
    /// The position lies outside of the triangulation. Nothing was changed.
    Outside,
}

/// Result of a walk that may stop at constraint edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WalkResult {
    Found(PointLocation),
    /// The walk would have to cross this constrained edge.
    Blocked(OrientedTriangle),
}

impl<S: MeshNum> TriangleStore<S> {
    fn validate_triangle_handle(&self, handle: FixedTriangleHandle) -> FixedTriangleHandle {
        if handle.index() < self.num_triangles() {
            handle
        } else {
            FixedTriangleHandle::new(0)
        }
    }

    /// Returns the location of `position`, starting the search at `hint`.
    ///
    /// The hint may be invalid.
    pub fn locate(&self, position: Point2<S>, hint: FixedTriangleHandle) -> PointLocation {
        match self.walk(position, hint, false) {
            Some(WalkResult::Found(location)) => location,
            _ => {
                trace!("Walk did not converge, falling back to exhaustive search");
                self.locate_exhaustive(position)
            }
        }
    }

    /// Walks from `start` towards `position` with orientation tests.
    ///
    /// Returns `None` if the walk does not converge within a step bound. This can only happen
    /// if the triangulation is not Delaunay.
    pub(crate) fn walk(
        &self,
        position: Point2<S>,
        start: FixedTriangleHandle,
        stop_at_subsegments: bool,
    ) -> Option<WalkResult> {
        let mut current = self.validate_triangle_handle(start);
        let max_steps = self.num_triangles() + 16;

        for step in 0..max_steps {
            let entry = self.triangle_entry(current);
            let sides = self.sides_of(current, position);

            // Alternating the examined edge avoids cycles in non Delaunay regions.
            let mut exit = None;
            for offset in 0..3 {
                let slot = (offset + step) % 3;
                if !sides[slot].is_cw() {
                    continue;
                }
                let blocked = stop_at_subsegments && entry.subsegments[slot].is_some();
                match exit {
                    None => exit = Some((slot, blocked)),
                    Some((_, true)) if !blocked => exit = Some((slot, blocked)),
                    _ => {}
                }
            }

            let Some((slot, blocked)) = exit else {
                return Some(WalkResult::Found(self.classify(current, sides)));
            };

            let edge = OrientedTriangle::new(current, slot);
            if blocked {
                return Some(WalkResult::Blocked(edge));
            }
            match entry.neighbors[slot] {
                Some(neighbor) => current = neighbor.triangle(),
                None => return Some(WalkResult::Found(PointLocation::Outside(edge))),
            }
        }
        None
    }

    /// Returns the orientation of `position` relative to each edge slot of a triangle.
    fn sides_of(&self, triangle: FixedTriangleHandle, position: Point2<S>) -> [Orientation; 3] {
        let positions = self.triangle_positions(triangle);
        [0, 1, 2].map(|slot| {
            orientation(
                positions[(slot + 1) % 3],
                positions[(slot + 2) % 3],
                position,
            )
        })
    }

    /// Classifies a point that is not on the right side of any edge of `triangle`.
    fn classify(&self, triangle: FixedTriangleHandle, sides: [Orientation; 3]) -> PointLocation {
        let collinear: SmallVec<[usize; 3]> =
            (0..3).filter(|slot| sides[*slot].is_collinear()).collect();
        match collinear.as_slice() {
            [] => PointLocation::Inside(triangle),
            [slot] => PointLocation::OnEdge(OrientedTriangle::new(triangle, *slot)),
            [first, second] => {
                // Both edges share the vertex that is opposite of the remaining slot
                let shared = 3 - first - second;
                PointLocation::OnVertex(self.triangle_entry(triangle).vertices[shared])
            }
            _ => panic!("Degenerate triangle. This is a bug."),
        }
    }

    fn locate_exhaustive(&self, position: Point2<S>) -> PointLocation {
        let mut outside = None;
        for index in 0..self.num_triangles() {
            let triangle = FixedTriangleHandle::new(index);
            let sides = self.sides_of(triangle, position);
            if !sides.iter().any(|side| side.is_cw()) {
                return self.classify(triangle, sides);
            }
            for slot in (0..3).filter(|slot| sides[*slot].is_cw()) {
                let edge = OrientedTriangle::new(triangle, slot);
                if self.sym(edge).is_none() {
                    outside = Some(edge);
                }
            }
        }
        PointLocation::Outside(outside.expect("Empty triangulation. This is a bug."))
    }

    /// Inserts a vertex and restores the Delaunay property around it.
    pub fn insert_vertex(
        &mut self,
        position: Point2<S>,
        kind: VertexKind,
        hint: FixedTriangleHandle,
    ) -> InsertionOutcome {
        let location = self.locate(position, hint);
        self.insert_at_location(location, position, kind)
    }

    /// Inserts a vertex at a known location.
    ///
    /// A vertex that falls onto a constraint edge splits the sub-segment and is turned into a
    /// [VertexKind::Segment] vertex.
    pub(crate) fn insert_at_location(
        &mut self,
        location: PointLocation,
        position: Point2<S>,
        kind: VertexKind,
    ) -> InsertionOutcome {
        match location {
            PointLocation::OnVertex(vertex) => InsertionOutcome::Duplicate(vertex),
            PointLocation::Outside(_) => InsertionOutcome::Outside,
            PointLocation::Inside(triangle) => {
                let vertex = self.push_vertex(position, kind);
                let edges = split_triangle(self, triangle, vertex);
                self.legalize_vertex(vertex, edges);
                InsertionOutcome::Inserted(vertex)
            }
            PointLocation::OnEdge(edge) => {
                let kind = match (self.subsegment_at(edge), kind) {
                    (Some(_), VertexKind::Free) => VertexKind::Segment,
                    _ => kind,
                };
                let vertex = self.push_vertex(position, kind);
                let split = split_edge(self, edge, vertex);
                self.legalize_vertex(vertex, split.opposite_edges);
                InsertionOutcome::Inserted(vertex)
            }
        }
    }

    /// Returns `true` if `edge` is unconstrained and its neighbor's apex lies strictly inside
    /// the circumcircle of `edge`'s triangle.
    pub(crate) fn is_illegal(&self, edge: OrientedTriangle) -> bool {
        if self.subsegment_at(edge).is_some() {
            return false;
        }
        let Some(sym) = self.sym(edge) else {
            return false;
        };
        contained_in_circumference(
            self.position(self.org(edge)),
            self.position(self.dest(edge)),
            self.position(self.apex(edge)),
            self.position(self.apex(sym)),
        )
    }

    /// Flips edges opposite of a freshly inserted vertex until the triangulation is Delaunay
    /// again. Returns the number of flips.
    ///
    /// All given edges must have `vertex` as apex.
    pub(crate) fn legalize_vertex(
        &mut self,
        vertex: FixedVertexHandle,
        edges: impl IntoIterator<Item = OrientedTriangle>,
    ) -> usize {
        let mut stack: SmallVec<[OrientedTriangle; 16]> = edges.into_iter().collect();
        let mut flips = 0;
        while let Some(edge) = stack.pop() {
            if self.apex(edge) != vertex || !self.is_illegal(edge) {
                continue;
            }
            let [first, second] = flip(self, edge);
            flips += 1;
            stack.push(first);
            stack.push(second);
        }
        flips
    }

    /// Runs Lawson's flip algorithm on a set of edges given by their endpoints.
    ///
    /// Edges that no longer exist are skipped. Returns the number of flips.
    pub(crate) fn legalize_edges(
        &mut self,
        mut stack: Vec<(FixedVertexHandle, FixedVertexHandle)>,
    ) -> usize {
        let mut flips = 0;
        while let Some((from, to)) = stack.pop() {
            let Some(edge) = self.find_edge(from, to).or_else(|| self.find_edge(to, from)) else {
                continue;
            };
            if !self.is_illegal(edge) {
                continue;
            }
            let a = self.org(edge);
            let b = self.dest(edge);
            let c = self.apex(edge);
            let d = self
                .sym(edge)
                .map(|sym| self.apex(sym))
                .expect("Illegal edge without neighbor. This is a bug.");
            flip(self, edge);
            flips += 1;
            stack.extend([(a, d), (d, b), (b, c), (c, a)]);
        }
        flips
    }

    /// Returns every edge with a triangle on both sides exactly once.
    pub(crate) fn inner_edges(&self) -> Vec<(FixedVertexHandle, FixedVertexHandle)> {
        let mut result = Vec::with_capacity(self.num_triangles() * 3 / 2);
        for index in 0..self.num_triangles() {
            let triangle = FixedTriangleHandle::new(index);
            for slot in 0..3 {
                let edge = OrientedTriangle::new(triangle, slot);
                if matches!(self.sym(edge), Some(sym) if sym.triangle().index() > index) {
                    result.push((self.org(edge), self.dest(edge)));
                }
            }
        }
        result
    }
}

#[cfg(test)]
impl<S: MeshNum> TriangleStore<S> {
    /// Panics if any unconstrained edge violates the Delaunay property.
    pub(crate) fn delaunay_sanity_check(&self) {
        for index in 0..self.num_triangles() {
            for slot in 0..3 {
                let edge = OrientedTriangle::new(FixedTriangleHandle::new(index), slot);
                assert!(
                    !self.is_illegal(edge),
                    "Edge {:?} violates the Delaunay property",
                    edge
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh_core::store_operations::create_bootstrap_triangle;
    use crate::test_utilities::{random_points_with_seed, SEED, SEED2};

    fn bootstrap() -> TriangleStore<f64> {
        let mut store = TriangleStore::default();
        let v0 = store.push_vertex(Point2::new(-100.0, -100.0), VertexKind::Undead);
        let v1 = store.push_vertex(Point2::new(100.0, -100.0), VertexKind::Undead);
        let v2 = store.push_vertex(Point2::new(0.0, 100.0), VertexKind::Undead);
        create_bootstrap_triangle(&mut store, [v0, v1, v2]);
        store
    }

    fn hint() -> FixedTriangleHandle {
        FixedTriangleHandle::new(0)
    }

    #[test]
    fn test_locate() {
        let mut store = bootstrap();
        assert_eq!(
            store.locate(Point2::new(0.0, 0.0), hint()),
            PointLocation::Inside(hint())
        );
        assert!(matches!(
            store.locate(Point2::new(0.0, -100.0), hint()),
            PointLocation::OnEdge(_)
        ));
        assert_eq!(
            store.locate(Point2::new(100.0, -100.0), hint()),
            PointLocation::OnVertex(FixedVertexHandle::new(1))
        );
        assert!(matches!(
            store.locate(Point2::new(0.0, -200.0), hint()),
            PointLocation::Outside(_)
        ));

        let outcome = store.insert_vertex(Point2::new(1.0, 2.0), VertexKind::Input, hint());
        let InsertionOutcome::Inserted(vertex) = outcome else {
            panic!("Expected insertion");
        };
        assert_eq!(
            store.locate(Point2::new(1.0, 2.0), hint()),
            PointLocation::OnVertex(vertex)
        );
    }

    #[test]
    fn test_insert_duplicate() {
        let mut store = bootstrap();
        let position = Point2::new(3.0, 4.0);
        let InsertionOutcome::Inserted(vertex) =
            store.insert_vertex(position, VertexKind::Input, hint())
        else {
            panic!("Expected insertion");
        };
        assert_eq!(
            store.insert_vertex(position, VertexKind::Input, hint()),
            InsertionOutcome::Duplicate(vertex)
        );
        assert_eq!(store.num_vertices(), 4);
    }

    #[test]
    fn test_insert_random_points_is_delaunay() {
        let mut store = bootstrap();
        for position in random_points_with_seed(300, SEED) {
            let outcome = store.insert_vertex(position, VertexKind::Input, hint());
            assert!(matches!(outcome, InsertionOutcome::Inserted(_)));
        }
        store.sanity_check();
        store.delaunay_sanity_check();
        // Euler: 2n - 2 - h triangles with a hull of three vertices
        assert_eq!(store.num_triangles(), 2 * store.num_vertices() - 5);
    }

    #[test]
    fn test_insert_on_edges() {
        let mut store = bootstrap();
        // Points on a grid create many on-edge insertions
        for x in -5..=5 {
            for y in -5..=5 {
                let position = Point2::new(x as f64, y as f64);
                store.insert_vertex(position, VertexKind::Input, hint());
            }
        }
        store.sanity_check();
        store.delaunay_sanity_check();
        assert_eq!(store.num_vertices(), 3 + 121);
    }

    #[test]
    fn test_legalize_edges_restores_delaunay() {
        let mut store = bootstrap();
        for position in random_points_with_seed(50, SEED2) {
            store.insert_vertex(position, VertexKind::Input, hint());
        }

        // Flip a few legal edges to produce a non Delaunay triangulation
        let edges = store.inner_edges();
        let mut flipped = 0;
        for (from, to) in edges.iter().copied().step_by(7) {
            if let Some(edge) = store.find_edge(from, to) {
                let sym = store.sym(edge).unwrap();
                let [a, b, c, d] = [
                    store.org(edge),
                    store.dest(edge),
                    store.apex(edge),
                    store.apex(sym),
                ]
                .map(|v| store.position(v));
                let convex = orientation(c, d, a).is_cw() && orientation(c, d, b).is_ccw();
                if convex {
                    flip(&mut store, edge);
                    flipped += 1;
                }
            }
        }
        assert!(flipped > 0);

        store.legalize_edges(store.inner_edges());
        store.sanity_check();
        store.delaunay_sanity_check();
    }
}
