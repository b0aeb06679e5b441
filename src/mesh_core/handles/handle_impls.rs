use super::handle_defs::*;
use crate::mesh_core::math;
use crate::mesh_core::store::VertexKind;
use crate::{MeshNum, Point2};

impl<'a, S, Type: Copy> Clone for DynamicHandleImpl<'a, S, Type> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S, Type: Copy> Copy for DynamicHandleImpl<'a, S, Type> {}

impl<'a, S, Type: PartialEq> PartialEq for DynamicHandleImpl<'a, S, Type> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<'a, S, Type: Eq> Eq for DynamicHandleImpl<'a, S, Type> {}

impl<'a, S, Type> std::fmt::Debug for DynamicHandleImpl<'a, S, Type> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DynamicHandle").field(&self.handle).finish()
    }
}

impl<'a, S> Clone for OrientedTriangleHandle<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S> Copy for OrientedTriangleHandle<'a, S> {}

impl<'a, S> PartialEq for OrientedTriangleHandle<'a, S> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<'a, S> std::fmt::Debug for OrientedTriangleHandle<'a, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OrientedTriangleHandle")
            .field(&self.handle)
            .finish()
    }
}

impl<'a, S, Type: Copy + Default> DynamicHandleImpl<'a, S, Type> {
    /// Converts this dynamic handle into its fixed variant.
    pub fn fix(&self) -> FixedHandleImpl<Type> {
        self.handle
    }

    /// See [FixedHandleImpl::index].
    pub fn index(&self) -> usize {
        self.handle.index()
    }
}

impl<'a, S: MeshNum> VertexHandle<'a, S> {
    /// Returns the vertex position.
    pub fn position(&self) -> Point2<S> {
        self.store.position(self.handle)
    }

    /// Returns how this vertex was created.
    pub fn kind(&self) -> VertexKind {
        self.store.vertex_entry(self.handle).kind
    }

    /// Returns all edges starting at this vertex in counterclockwise order.
    pub fn out_edges(&self) -> impl Iterator<Item = OrientedTriangleHandle<'a, S>> + 'a {
        let store = self.store;
        store
            .out_edges(self.handle)
            .into_iter()
            .map(move |edge| store.oriented(edge))
    }

    /// Returns the triangles of the meshed domain that contain this vertex.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleHandle<'a, S>> + 'a {
        self.out_edges()
            .map(|edge| edge.triangle())
            .filter(|triangle| triangle.is_in_domain())
    }
}

impl<'a, S: MeshNum> TriangleHandle<'a, S> {
    /// Returns the triangle's vertices in counterclockwise order.
    pub fn vertices(&self) -> [VertexHandle<'a, S>; 3] {
        let store = self.store;
        store
            .triangle_entry(self.handle)
            .vertices
            .map(|vertex| store.vertex(vertex))
    }

    /// Returns the triangle's vertex positions in counterclockwise order.
    pub fn positions(&self) -> [Point2<S>; 3] {
        self.store.triangle_positions(self.handle)
    }

    /// Returns the edge opposite of the vertex with index `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= 3`.
    pub fn edge(&self, slot: usize) -> OrientedTriangleHandle<'a, S> {
        assert!(slot < 3, "Edge slot out of range");
        self.store.oriented(OrientedTriangle::new(self.handle, slot))
    }

    /// Returns the three edges of this triangle in counterclockwise order.
    pub fn edges(&self) -> [OrientedTriangleHandle<'a, S>; 3] {
        [self.edge(0), self.edge(1), self.edge(2)]
    }

    /// Returns the neighboring triangles. `neighbors()[i]` lies across edge `i`.
    ///
    /// Neighbors outside of the meshed domain are reported as well; check
    /// [TriangleHandle::is_in_domain].
    pub fn neighbors(&self) -> [Option<TriangleHandle<'a, S>>; 3] {
        self.edges().map(|edge| edge.sym().map(|sym| sym.triangle()))
    }

    /// Returns the triangle's area.
    pub fn area(&self) -> S {
        let [v0, v1, v2] = self.positions();
        math::triangle_area(v0, v1, v2)
    }

    /// Returns the circumcenter of this triangle.
    pub fn circumcenter(&self) -> Point2<S> {
        let [v0, v1, v2] = self.positions();
        math::circumcenter(v0, v1, v2)
    }

    /// Returns the squared cosine of the smallest inner angle.
    ///
    /// The key grows as the triangle becomes skinnier.
    pub fn quality_key(&self) -> S {
        math::quality_key(self.positions())
    }

    /// Returns the smallest inner angle in radians.
    pub fn min_angle(&self) -> f64 {
        math::min_angle(self.positions())
    }

    /// Returns `false` if this triangle lies in the exterior or inside of a hole.
    pub fn is_in_domain(&self) -> bool {
        !self.store.triangle_entry(self.handle).excluded
    }

    /// Returns the attribute of the region this triangle belongs to.
    pub fn region(&self) -> Option<u32> {
        self.store
            .triangle_entry(self.handle)
            .region
            .map(|region| self.store.regions[region as usize].attribute)
    }

    /// Returns the area bound of this triangle's region, if any.
    pub fn region_max_area(&self) -> Option<S> {
        self.store
            .triangle_entry(self.handle)
            .region
            .and_then(|region| self.store.regions[region as usize].max_area)
    }

    /// Returns the caller defined tag of this triangle.
    ///
    /// Tags start out as the region attribute and can be overwritten with
    /// [Mesh::set_tag](crate::Mesh::set_tag).
    pub fn tag(&self) -> Option<u32> {
        self.store.triangle_entry(self.handle).tag
    }
}

impl<'a, S: MeshNum> SubsegmentHandle<'a, S> {
    /// Returns the current endpoints of this sub-segment.
    pub fn vertices(&self) -> [VertexHandle<'a, S>; 2] {
        let store = self.store;
        store
            .subsegment_entry(self.handle)
            .vertices
            .map(|vertex| store.vertex(vertex))
    }

    /// Returns the current endpoint positions.
    pub fn positions(&self) -> [Point2<S>; 2] {
        self.vertices().map(|vertex| vertex.position())
    }

    /// Returns the endpoints of the constraint segment this sub-segment was cut from.
    pub fn segment_vertices(&self) -> [VertexHandle<'a, S>; 2] {
        let store = self.store;
        store
            .subsegment_entry(self.handle)
            .segment
            .map(|vertex| store.vertex(vertex))
    }

    /// Index of the constraint segment this sub-segment was cut from.
    ///
    /// Indices at or above the number of input segments refer to convex hull segments.
    pub fn segment_index(&self) -> usize {
        self.store.subsegment_entry(self.handle).segment_index
    }

    /// Returns the squared length of this sub-segment.
    pub fn length_2(&self) -> S {
        let [from, to] = self.positions();
        from.distance_2(to)
    }

    /// Returns the two triangle edges bounding this sub-segment.
    ///
    /// `sides()[0]` runs from `vertices()[0]` to `vertices()[1]`, `sides()[1]` runs in the
    /// opposite direction.
    pub fn sides(&self) -> [Option<OrientedTriangleHandle<'a, S>>; 2] {
        let store = self.store;
        store
            .subsegment_entry(self.handle)
            .sides
            .map(|side| side.map(|edge| store.oriented(edge)))
    }

    /// Returns `true` if `position` lies strictly inside this sub-segment's diametral circle.
    pub fn is_encroached_by(&self, position: Point2<S>) -> bool {
        let [from, to] = self.positions();
        math::is_encroaching_edge(from, to, position)
    }
}

impl<'a, S: MeshNum> OrientedTriangleHandle<'a, S> {
    /// Converts this handle into its fixed variant.
    pub fn fix(&self) -> OrientedTriangle {
        self.handle
    }

    /// Returns the triangle this edge belongs to.
    pub fn triangle(&self) -> TriangleHandle<'a, S> {
        self.store.triangle(self.handle.triangle())
    }

    /// Returns the edge's origin.
    pub fn org(&self) -> VertexHandle<'a, S> {
        self.store.vertex(self.store.org(self.handle))
    }

    /// Returns the edge's destination.
    pub fn dest(&self) -> VertexHandle<'a, S> {
        self.store.vertex(self.store.dest(self.handle))
    }

    /// Returns the vertex opposite of this edge.
    pub fn apex(&self) -> VertexHandle<'a, S> {
        self.store.vertex(self.store.apex(self.handle))
    }

    /// Returns the origin and destination positions.
    pub fn positions(&self) -> [Point2<S>; 2] {
        [self.org().position(), self.dest().position()]
    }

    /// Returns the same edge in the opposite direction, seen from the neighboring triangle.
    pub fn sym(&self) -> Option<Self> {
        self.store.sym(self.handle).map(|edge| self.store.oriented(edge))
    }

    /// See [OrientedTriangle::lnext].
    pub fn lnext(&self) -> Self {
        self.store.oriented(self.handle.lnext())
    }

    /// See [OrientedTriangle::lprev].
    pub fn lprev(&self) -> Self {
        self.store.oriented(self.handle.lprev())
    }

    /// Returns the next edge counterclockwise around the origin.
    pub fn onext(&self) -> Option<Self> {
        self.store.onext(self.handle).map(|edge| self.store.oriented(edge))
    }

    /// Returns the next edge clockwise around the origin.
    pub fn oprev(&self) -> Option<Self> {
        self.store.oprev(self.handle).map(|edge| self.store.oriented(edge))
    }

    /// Returns the sub-segment lying on this edge, if any.
    pub fn subsegment(&self) -> Option<SubsegmentHandle<'a, S>> {
        self.store
            .subsegment_at(self.handle)
            .map(|subsegment| self.store.subsegment(subsegment))
    }

    /// Returns `true` if this edge is part of a constraint segment.
    pub fn is_constrained(&self) -> bool {
        self.store.subsegment_at(self.handle).is_some()
    }

    /// Returns the squared length of this edge.
    pub fn length_2(&self) -> S {
        let [from, to] = self.positions();
        from.distance_2(to)
    }

    /// Determines on which side of this edge a point lies.
    pub fn side_query(&self, position: Point2<S>) -> math::Orientation {
        let [from, to] = self.positions();
        math::orientation(from, to, position)
    }
}
