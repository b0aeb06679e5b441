use smallvec::SmallVec;

use super::handles::*;
use super::store_operations::bond;
use crate::Point2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Describes how a vertex came into existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub enum VertexKind {
    /// A vertex of the input graph.
    Input,
    /// A Steiner vertex that was inserted on a constraint segment.
    Segment,
    /// A Steiner vertex that was inserted into the interior of the domain.
    Free,
    /// A vertex that is not part of the meshed domain.
    ///
    /// Input vertices that end up in the exterior or inside of a hole become undead. They are
    /// kept in the underlying triangulation but are never reported as part of the mesh.
    Undead,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct VertexEntry<S> {
    pub position: Point2<S>,
    pub kind: VertexKind,
    /// Some triangle that contains this vertex.
    pub triangle: Option<FixedTriangleHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TriangleEntry {
    /// Counterclockwise.
    pub vertices: [FixedVertexHandle; 3],
    /// `neighbors[i]` is the edge that lies across edge slot `i`.
    pub neighbors: [Option<OrientedTriangle>; 3],
    pub subsegments: [Option<FixedSubsegmentHandle>; 3],
    pub region: Option<u32>,
    pub tag: Option<u32>,
    /// Excluded triangles lie outside of the meshed domain (exterior or holes).
    pub excluded: bool,
}

impl TriangleEntry {
    pub fn new(vertices: [FixedVertexHandle; 3]) -> Self {
        Self {
            vertices,
            neighbors: [None; 3],
            subsegments: [None; 3],
            region: None,
            tag: None,
            excluded: false,
        }
    }

    /// Creates a triangle that inherits region, tag and exclusion from `parent`.
    pub fn derived_from(parent: &TriangleEntry, vertices: [FixedVertexHandle; 3]) -> Self {
        Self {
            vertices,
            neighbors: [None; 3],
            subsegments: [None; 3],
            region: parent.region,
            tag: parent.tag,
            excluded: parent.excluded,
        }
    }

    pub fn slot_of(&self, vertex: FixedVertexHandle) -> Option<usize> {
        self.vertices.iter().position(|v| *v == vertex)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SubsegmentEntry {
    /// Current endpoints.
    pub vertices: [FixedVertexHandle; 2],
    /// Endpoints of the segment this sub-segment was cut from.
    pub segment: [FixedVertexHandle; 2],
    pub segment_index: usize,
    /// `sides[0]` runs from `vertices[0]` to `vertices[1]`, `sides[1]` runs backwards.
    pub sides: [Option<OrientedTriangle>; 2],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RegionEntry<S> {
    pub attribute: u32,
    pub max_area: Option<S>,
}

/// Arena holding all vertices, triangles and sub-segments of a mesh.
///
/// Elements are only ever appended. Flips and splits overwrite existing triangle slots in place
/// and append the triangles they create, so every handle stays valid for the lifetime of the
/// store.
#[derive(Clone, Debug)]
pub struct TriangleStore<S> {
    pub(crate) vertices: Vec<VertexEntry<S>>,
    pub(crate) triangles: Vec<TriangleEntry>,
    pub(crate) subsegments: Vec<SubsegmentEntry>,
    pub(crate) regions: Vec<RegionEntry<S>>,
}

impl<S> Default for TriangleStore<S> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
            subsegments: Vec::new(),
            regions: Vec::new(),
        }
    }
}

impl<S: Copy> TriangleStore<S> {
    pub fn with_capacity(num_vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            triangles: Vec::with_capacity(num_vertices * 2),
            subsegments: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn num_subsegments(&self) -> usize {
        self.subsegments.len()
    }

    pub fn vertex(&self, handle: FixedVertexHandle) -> VertexHandle<S> {
        DynamicHandleImpl::new(self, handle)
    }

    pub fn triangle(&self, handle: FixedTriangleHandle) -> TriangleHandle<S> {
        DynamicHandleImpl::new(self, handle)
    }

    pub fn subsegment(&self, handle: FixedSubsegmentHandle) -> SubsegmentHandle<S> {
        DynamicHandleImpl::new(self, handle)
    }

    pub fn oriented(&self, handle: OrientedTriangle) -> OrientedTriangleHandle<S> {
        OrientedTriangleHandle::new(self, handle)
    }

    pub(crate) fn vertex_entry(&self, handle: FixedVertexHandle) -> &VertexEntry<S> {
        &self.vertices[handle.index()]
    }

    pub(crate) fn vertex_entry_mut(&mut self, handle: FixedVertexHandle) -> &mut VertexEntry<S> {
        &mut self.vertices[handle.index()]
    }

    pub(crate) fn triangle_entry(&self, handle: FixedTriangleHandle) -> &TriangleEntry {
        &self.triangles[handle.index()]
    }

    pub(crate) fn triangle_entry_mut(&mut self, handle: FixedTriangleHandle) -> &mut TriangleEntry {
        &mut self.triangles[handle.index()]
    }

    pub(crate) fn subsegment_entry(&self, handle: FixedSubsegmentHandle) -> &SubsegmentEntry {
        &self.subsegments[handle.index()]
    }

    pub(crate) fn position(&self, vertex: FixedVertexHandle) -> Point2<S> {
        self.vertices[vertex.index()].position
    }

    pub(crate) fn triangle_positions(&self, triangle: FixedTriangleHandle) -> [Point2<S>; 3] {
        self.triangle_entry(triangle)
            .vertices
            .map(|vertex| self.position(vertex))
    }

    pub(crate) fn org(&self, edge: OrientedTriangle) -> FixedVertexHandle {
        self.triangle_entry(edge.triangle()).vertices[edge.org_slot()]
    }

    pub(crate) fn dest(&self, edge: OrientedTriangle) -> FixedVertexHandle {
        self.triangle_entry(edge.triangle()).vertices[edge.dest_slot()]
    }

    pub(crate) fn apex(&self, edge: OrientedTriangle) -> FixedVertexHandle {
        self.triangle_entry(edge.triangle()).vertices[edge.edge()]
    }

    /// The same edge seen from the neighboring triangle.
    pub(crate) fn sym(&self, edge: OrientedTriangle) -> Option<OrientedTriangle> {
        self.triangle_entry(edge.triangle()).neighbors[edge.edge()]
    }

    /// The next edge counterclockwise around the origin.
    pub(crate) fn onext(&self, edge: OrientedTriangle) -> Option<OrientedTriangle> {
        self.sym(edge.lprev())
    }

    /// The next edge clockwise around the origin.
    pub(crate) fn oprev(&self, edge: OrientedTriangle) -> Option<OrientedTriangle> {
        self.sym(edge).map(OrientedTriangle::lnext)
    }

    pub(crate) fn subsegment_at(&self, edge: OrientedTriangle) -> Option<FixedSubsegmentHandle> {
        self.triangle_entry(edge.triangle()).subsegments[edge.edge()]
    }

    pub(crate) fn push_vertex(&mut self, position: Point2<S>, kind: VertexKind) -> FixedVertexHandle {
        let handle = FixedVertexHandle::new(self.vertices.len());
        self.vertices.push(VertexEntry {
            position,
            kind,
            triangle: None,
        });
        handle
    }

    /// Reserves a triangle slot. The slot must be filled with [Self::write_triangle] before the
    /// current edit completes.
    pub(crate) fn allocate_triangle(&mut self) -> FixedTriangleHandle {
        let handle = FixedTriangleHandle::new(self.triangles.len());
        let placeholder = FixedVertexHandle::new(0);
        self.triangles
            .push(TriangleEntry::new([placeholder, placeholder, placeholder]));
        handle
    }

    pub(crate) fn push_subsegment(&mut self, entry: SubsegmentEntry) -> FixedSubsegmentHandle {
        let handle = FixedSubsegmentHandle::new(self.subsegments.len());
        self.subsegments.push(entry);
        handle
    }

    /// Stores a triangle and updates every link pointing into it.
    ///
    /// Neighbors get their back links set, sub-segments their side links and each vertex is
    /// pointed to this triangle. All topological edits go through this method.
    pub(crate) fn write_triangle(&mut self, handle: FixedTriangleHandle, entry: TriangleEntry) {
        self.triangles[handle.index()] = entry;
        for slot in 0..3 {
            let edge = OrientedTriangle::new(handle, slot);
            if let Some(neighbor) = entry.neighbors[slot] {
                bond(self, edge, neighbor);
            }
            if let Some(subsegment) = entry.subsegments[slot] {
                let org = entry.vertices[edge.org_slot()];
                let sub = &mut self.subsegments[subsegment.index()];
                let side = if sub.vertices[0] == org { 0 } else { 1 };
                sub.sides[side] = Some(edge);
            }
            self.vertices[entry.vertices[slot].index()].triangle = Some(handle);
        }
    }

    /// Returns some edge starting at `vertex`.
    pub(crate) fn out_edge(&self, vertex: FixedVertexHandle) -> Option<OrientedTriangle> {
        let triangle = self.vertex_entry(vertex).triangle?;
        let slot = self.triangle_entry(triangle).slot_of(vertex)?;
        Some(OrientedTriangle::new(triangle, (slot + 2) % 3))
    }

    /// Returns all edges starting at `vertex` in counterclockwise order.
    pub(crate) fn out_edges(&self, vertex: FixedVertexHandle) -> SmallVec<[OrientedTriangle; 8]> {
        let mut result = SmallVec::new();
        let Some(start) = self.out_edge(vertex) else {
            return result;
        };
        result.push(start);

        let mut current = start;
        loop {
            match self.onext(current) {
                Some(next) if next == start => return result,
                Some(next) => {
                    result.push(next);
                    current = next;
                }
                None => break,
            }
        }

        // The vertex lies on the arena boundary, collect the remaining clockwise edges.
        current = start;
        while let Some(previous) = self.oprev(current) {
            result.insert(0, previous);
            current = previous;
        }
        result
    }

    pub(crate) fn triangles_around(
        &self,
        vertex: FixedVertexHandle,
    ) -> SmallVec<[FixedTriangleHandle; 8]> {
        self.out_edges(vertex)
            .into_iter()
            .map(|edge| edge.triangle())
            .collect()
    }

    /// Returns the edge `from -> to` if it exists and has a triangle on its left side.
    pub(crate) fn find_edge(
        &self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
    ) -> Option<OrientedTriangle> {
        self.out_edges(from)
            .into_iter()
            .find(|edge| self.dest(*edge) == to)
    }

    /// Returns `true` if the vertex touches at least one triangle of the meshed domain.
    pub(crate) fn is_in_domain(&self, vertex: FixedVertexHandle) -> bool {
        self.out_edges(vertex)
            .iter()
            .any(|edge| !self.triangle_entry(edge.triangle()).excluded)
    }
}

#[cfg(test)]
impl<S: crate::MeshNum> TriangleStore<S> {
    /// Checks the topological invariants of the store and panics if any is violated.
    pub(crate) fn sanity_check(&self) {
        use super::math::orientation;

        for (index, entry) in self.triangles.iter().enumerate() {
            let handle = FixedTriangleHandle::new(index);
            let [p0, p1, p2] = self.triangle_positions(handle);
            assert!(
                orientation(p0, p1, p2).is_ccw(),
                "triangle {index} is not counterclockwise"
            );

            for slot in 0..3 {
                let edge = OrientedTriangle::new(handle, slot);
                if let Some(neighbor) = entry.neighbors[slot] {
                    assert_eq!(self.sym(neighbor), Some(edge));
                    assert_eq!(self.org(neighbor), self.dest(edge));
                    assert_eq!(self.dest(neighbor), self.org(edge));
                    assert_eq!(self.subsegment_at(neighbor), entry.subsegments[slot]);
                }
                if let Some(subsegment) = entry.subsegments[slot] {
                    let sub = self.subsegment_entry(subsegment);
                    let side = if sub.vertices[0] == self.org(edge) { 0 } else { 1 };
                    assert_eq!(sub.sides[side], Some(edge));
                    assert_eq!(sub.vertices[side], self.org(edge));
                    assert_eq!(sub.vertices[1 - side], self.dest(edge));
                }
            }
        }

        for (index, vertex) in self.vertices.iter().enumerate() {
            if let Some(triangle) = vertex.triangle {
                assert!(
                    self.triangle_entry(triangle)
                        .slot_of(FixedVertexHandle::new(index))
                        .is_some(),
                    "vertex {index} points to a triangle that does not contain it"
                );
            }
        }

        for (index, sub) in self.subsegments.iter().enumerate() {
            let handle = FixedSubsegmentHandle::new(index);
            assert!(sub.sides.iter().any(Option::is_some));
            for edge in sub.sides.iter().flatten() {
                assert_eq!(self.subsegment_at(*edge), Some(handle));
            }
        }
    }
}
