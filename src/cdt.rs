//! Constraint enforcement: recovers input segments inside a Delaunay triangulation and carves
//! the exterior and holes out of the meshed domain.

use std::collections::VecDeque;

use hashbrown::HashSet;
use log::trace;

use crate::error::GeometryError;
use crate::mesh_core::math::{orientation, Orientation};
use crate::mesh_core::store_operations::{flip, insert_subsegment};
use crate::mesh_core::{
    FixedTriangleHandle, FixedVertexHandle, InsertionOutcome, OrientedTriangle, PointLocation,
    TriangleStore, VertexKind,
};
use crate::{MeshNum, Point2};

/// Result of tracing a segment from one of its endpoints.
enum Trace {
    /// The segment runs exactly through this vertex.
    ThroughVertex(FixedVertexHandle),
    /// Edges crossing the segment, ordered from its start. Each edge runs from the right to the
    /// left side of the segment.
    Crossing(Vec<(FixedVertexHandle, FixedVertexHandle)>),
}

impl<S: MeshNum> TriangleStore<S> {
    /// Makes the segment `from -> to` part of the triangulation.
    ///
    /// The segment may end up as a chain of several sub-segments if it runs through other
    /// vertices or if edge flipping does not converge and the segment is split.
    ///
    /// Leaves the triangulation in a valid but possibly non Delaunay state. Call
    /// [Self::legalize_edges] afterwards.
    pub(crate) fn insert_segment(
        &mut self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
        segment_index: usize,
    ) -> Result<(), GeometryError> {
        let mut todo = vec![(from, to)];
        while let Some((start, end)) = todo.pop() {
            if start == end {
                continue;
            }
            if let Some(edge) = self.find_edge(start, end) {
                self.mark_subsegment(edge, [from, to], segment_index);
                continue;
            }

            match self.trace_segment(start, end, segment_index)? {
                Trace::ThroughVertex(vertex) => {
                    trace!("Segment {segment_index} runs through vertex {}", vertex.index());
                    todo.push((vertex, end));
                    todo.push((start, vertex));
                }
                Trace::Crossing(crossing) => {
                    if self.flip_out_crossing_edges(start, end, crossing) {
                        let edge = self
                            .find_edge(start, end)
                            .expect("Recovered segment is missing. This is a bug.");
                        self.mark_subsegment(edge, [from, to], segment_index);
                    } else {
                        let middle = self.split_segment_piece(start, end);
                        todo.push((middle, end));
                        todo.push((start, middle));
                    }
                }
            }
        }
        Ok(())
    }

    fn mark_subsegment(
        &mut self,
        edge: OrientedTriangle,
        segment: [FixedVertexHandle; 2],
        segment_index: usize,
    ) {
        // Overlapping input segments share their sub-segments
        if self.subsegment_at(edge).is_none() {
            insert_subsegment(self, edge, segment, segment_index);
        }
    }

    /// Finds the wedge around `from` that contains the direction towards `to` and walks along
    /// the segment, collecting every crossed edge.
    fn trace_segment(
        &self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
        segment_index: usize,
    ) -> Result<Trace, GeometryError> {
        let start = self.position(from);
        let target = self.position(to);

        let mut crossing_edge = None;
        for edge in self.out_edges(from) {
            let dest = self.dest(edge);
            let apex = self.apex(edge);
            let dest_side = orientation(start, target, self.position(dest));
            if dest_side.is_collinear() && self.points_ahead(start, target, self.position(dest)) {
                return Ok(Trace::ThroughVertex(dest));
            }
            let apex_side = orientation(start, target, self.position(apex));
            if dest_side.is_cw() && apex_side.is_ccw() {
                crossing_edge = Some(edge.lnext());
                break;
            }
        }
        let mut edge = crossing_edge.expect("Segment start wedge not found. This is a bug.");

        let mut crossing = Vec::new();
        loop {
            if let Some(subsegment) = self.subsegment_at(edge) {
                return Err(GeometryError::CrossingSegments {
                    segment: segment_index,
                    other: self.subsegment_entry(subsegment).segment_index,
                });
            }
            crossing.push((self.org(edge), self.dest(edge)));

            let sym = self
                .sym(edge)
                .expect("Segment leaves the triangulation. This is a bug.");
            let opposite = self.apex(sym);
            if opposite == to {
                return Ok(Trace::Crossing(crossing));
            }
            match orientation(start, target, self.position(opposite)) {
                Orientation::Collinear => return Ok(Trace::ThroughVertex(opposite)),
                // sym runs from the left to the right side, continue with the edge that
                // still crosses the segment
                Orientation::Clockwise => edge = sym.lprev(),
                Orientation::CounterClockwise => edge = sym.lnext(),
            }
        }
    }

    fn points_ahead(&self, start: Point2<S>, target: Point2<S>, query: Point2<S>) -> bool {
        target.sub(start).dot(query.sub(start)) > S::zero()
    }

    /// Removes all edges crossing `from -> to` by flipping them (Sloan's algorithm).
    ///
    /// An edge is only flipped if its quadrilateral is strictly convex. Returns `false` if the
    /// flips did not converge within a bound. The triangulation stays valid in that case.
    fn flip_out_crossing_edges(
        &mut self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
        crossing: Vec<(FixedVertexHandle, FixedVertexHandle)>,
    ) -> bool {
        let start = self.position(from);
        let target = self.position(to);

        let num_crossing = crossing.len();
        let mut attempts = 4 * (num_crossing + 1) * (num_crossing + 1) + 32;
        let mut queue: VecDeque<_> = crossing.into();

        while let Some((u, w)) = queue.pop_front() {
            if attempts == 0 {
                trace!("Segment recovery did not converge after flipping");
                return false;
            }
            attempts -= 1;

            let Some(edge) = self.find_edge(u, w).or_else(|| self.find_edge(w, u)) else {
                // The edge was already flipped away
                continue;
            };
            let sym = self
                .sym(edge)
                .expect("Crossing edge without neighbor. This is a bug.");
            let a = self.position(self.org(edge));
            let b = self.position(self.dest(edge));
            let c_vertex = self.apex(edge);
            let d_vertex = self.apex(sym);
            let c = self.position(c_vertex);
            let d = self.position(d_vertex);

            let is_convex = orientation(c, d, a).is_cw() && orientation(c, d, b).is_ccw();
            if !is_convex {
                queue.push_back((u, w));
                continue;
            }

            flip(self, edge);

            let c_side = orientation(start, target, c);
            let d_side = orientation(start, target, d);
            let still_crossing = c_vertex != from
                && c_vertex != to
                && d_vertex != from
                && d_vertex != to
                && ((c_side.is_cw() && d_side.is_ccw()) || (c_side.is_ccw() && d_side.is_cw()))
                && orientation(c, d, start) != orientation(c, d, target);
            if still_crossing {
                queue.push_back((c_vertex, d_vertex));
            }
        }
        true
    }

    /// Inserts a [VertexKind::Segment] vertex at the middle of `from -> to`.
    ///
    /// Returns an existing vertex if the middle coincides with one.
    fn split_segment_piece(
        &mut self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
    ) -> FixedVertexHandle {
        let middle = self.position(from).midpoint(self.position(to));
        let hint = self
            .vertex_entry(from)
            .triangle
            .unwrap_or(FixedTriangleHandle::new(0));
        match self.insert_vertex(middle, VertexKind::Segment, hint) {
            InsertionOutcome::Inserted(vertex) | InsertionOutcome::Duplicate(vertex) => vertex,
            InsertionOutcome::Outside => panic!("Segment leaves the triangulation. This is a bug."),
        }
    }

    /// Marks every triangle reachable from `seeds` without crossing a sub-segment.
    ///
    /// `visit` is called once per reached triangle. Triangles for which `stop` returns `true` are
    /// neither visited nor crossed.
    pub(crate) fn flood_fill(
        &mut self,
        seeds: impl IntoIterator<Item = FixedTriangleHandle>,
        stop: impl Fn(&TriangleStore<S>, FixedTriangleHandle) -> bool,
        mut visit: impl FnMut(&mut TriangleStore<S>, FixedTriangleHandle),
    ) -> usize {
        let mut visited = HashSet::new();
        let mut todo: Vec<_> = seeds
            .into_iter()
            .filter(|seed| !stop(&*self, *seed))
            .collect();
        visited.extend(todo.iter().copied());

        while let Some(triangle) = todo.pop() {
            visit(self, triangle);
            for slot in 0..3 {
                let edge = OrientedTriangle::new(triangle, slot);
                if self.subsegment_at(edge).is_some() {
                    continue;
                }
                if let Some(sym) = self.sym(edge) {
                    let neighbor = sym.triangle();
                    if !stop(self, neighbor) && visited.insert(neighbor) {
                        todo.push(neighbor);
                    }
                }
            }
        }
        visited.len()
    }

    /// Excludes every triangle that is reachable from the bootstrap vertices without crossing
    /// a sub-segment.
    pub(crate) fn carve_exterior(&mut self, bootstrap: [FixedVertexHandle; 3]) -> usize {
        let seeds: Vec<_> = bootstrap
            .iter()
            .flat_map(|vertex| self.triangles_around(*vertex))
            .collect();
        self.flood_fill(
            seeds,
            |store, triangle| store.triangle_entry(triangle).excluded,
            |store, triangle| store.triangle_entry_mut(triangle).excluded = true,
        )
    }

    /// Excludes the area around a hole seed. Seeds outside of the domain are ignored.
    pub(crate) fn carve_hole(&mut self, seed: Point2<S>, hint: FixedTriangleHandle) -> usize {
        let Some(triangle) = self.domain_triangle_at(seed, hint) else {
            trace!("Ignoring hole seed {:?} outside of the domain", seed);
            return 0;
        };
        self.flood_fill(
            [triangle],
            |store, triangle| store.triangle_entry(triangle).excluded,
            |store, triangle| store.triangle_entry_mut(triangle).excluded = true,
        )
    }

    /// Assigns a region to the area around a seed. Seeds outside of the domain are ignored.
    pub(crate) fn fill_region(
        &mut self,
        seed: Point2<S>,
        region: u32,
        attribute: u32,
        hint: FixedTriangleHandle,
    ) -> usize {
        let Some(triangle) = self.domain_triangle_at(seed, hint) else {
            trace!("Ignoring region seed {:?} outside of the domain", seed);
            return 0;
        };
        self.flood_fill(
            [triangle],
            |store, triangle| store.triangle_entry(triangle).excluded,
            |store, triangle| {
                let entry = store.triangle_entry_mut(triangle);
                entry.region = Some(region);
                entry.tag = Some(attribute);
            },
        )
    }

    fn domain_triangle_at(
        &self,
        position: Point2<S>,
        hint: FixedTriangleHandle,
    ) -> Option<FixedTriangleHandle> {
        let triangle = match self.locate(position, hint) {
            PointLocation::Inside(triangle) => triangle,
            PointLocation::OnEdge(edge) => edge.triangle(),
            PointLocation::OnVertex(_) | PointLocation::Outside(_) => return None,
        };
        (!self.triangle_entry(triangle).excluded).then_some(triangle)
    }
}

/// Returns the vertices of the convex hull in counterclockwise order (Andrew's monotone chain).
///
/// Vertices lying on a hull edge are skipped; segment recovery picks them up when the edge
/// runs through them.
pub(crate) fn convex_hull<S: MeshNum>(
    points: &[(FixedVertexHandle, Point2<S>)],
) -> Vec<FixedVertexHandle> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|(_, p0), (_, p1)| {
        p0.x.partial_cmp(&p1.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(p0.y.partial_cmp(&p1.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    sorted.dedup_by(|(_, p0), (_, p1)| p0 == p1);
    if sorted.len() < 3 {
        return sorted.into_iter().map(|(vertex, _)| vertex).collect();
    }

    let mut hull: Vec<(FixedVertexHandle, Point2<S>)> = Vec::with_capacity(sorted.len() * 2);
    let build_chain = |hull: &mut Vec<(FixedVertexHandle, Point2<S>)>,
                       point: (FixedVertexHandle, Point2<S>),
                       min_len: usize| {
        while hull.len() >= min_len
            && !orientation(hull[hull.len() - 2].1, hull[hull.len() - 1].1, point.1).is_ccw()
        {
            hull.pop();
        }
        hull.push(point);
    };

    for point in sorted.iter() {
        build_chain(&mut hull, *point, 2);
    }
    let lower_len = hull.len() + 1;
    for point in sorted.iter().rev().skip(1) {
        build_chain(&mut hull, *point, lower_len);
    }
    hull.pop();
    hull.into_iter().map(|(vertex, _)| vertex).collect()
}
