use hashbrown::HashSet;
use log::{debug, warn};

use crate::cdt::convex_hull;
use crate::error::GeometryError;
use crate::mesh_core::math::{self, orientation, validate_point};
use crate::mesh_core::store_operations::create_bootstrap_triangle;
use crate::mesh_core::{
    FixedSubsegmentHandle, FixedTriangleHandle, FixedVertexHandle, InsertionOutcome,
    LastUsedTriangleHintGenerator, PointLocation, RegionEntry, SubsegmentHandle, TriangleHandle,
    TriangleStore, VertexHandle, VertexKind,
};
use crate::{
    Diagnostic, MeshError, MeshNum, MeshResult, PlanarGraph, Point2, TriangulationOptions,
};

/// Summary of a triangulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport<S> {
    /// Non fatal conditions, e.g. merged duplicate vertices.
    pub diagnostics: Vec<Diagnostic<S>>,
    /// Number of segments added to close the convex hull.
    pub num_hull_segments: usize,
    /// Number of vertices that ended up outside of the meshed domain.
    pub num_undead_vertices: usize,
    /// Number of edge flips that restored the Delaunay property after segment recovery.
    pub num_recovery_flips: usize,
}

/// Quality measures of a mesh, see [Mesh::statistics].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStatistics<S> {
    /// Number of vertices of the meshed domain.
    pub num_vertices: usize,
    /// Number of triangles of the meshed domain.
    pub num_triangles: usize,
    /// Number of constraint edges.
    pub num_subsegments: usize,
    /// Smallest inner angle of any triangle, in degrees.
    pub min_angle_deg: f64,
    /// Largest inner angle of any triangle, in degrees.
    pub max_angle_deg: f64,
    /// Area of the smallest triangle.
    pub min_area: S,
    /// Area of the largest triangle.
    pub max_area: S,
}

/// Compact buffers describing a mesh, as consumed by renderers.
///
/// Only vertices and triangles of the meshed domain are contained.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuffers<S> {
    /// Vertex positions.
    pub positions: Vec<Point2<S>>,
    /// Kind of each vertex, parallel to `positions`.
    pub kinds: Vec<VertexKind>,
    /// Counterclockwise vertex indices per triangle, pointing into `positions`.
    pub triangles: Vec<[u32; 3]>,
    /// Region attribute per triangle, parallel to `triangles`.
    pub regions: Vec<Option<u32>>,
    /// Tag per triangle, parallel to `triangles`.
    pub tags: Vec<Option<u32>>,
}

/// A constrained Delaunay triangulation of a [PlanarGraph].
///
/// The mesh covers the area enclosed by the graph's segments, minus its holes. Each input
/// segment is represented by a chain of triangle edges (*sub-segments*). Every other edge
/// fulfills the Delaunay property: no vertex lies inside the circumcircle of a triangle unless
/// it is hidden behind a constraint edge.
///
/// Meshes are created with [PlanarGraph::triangulate] and can be refined with
/// [Mesh::refine].
///
/// # Example
/// ```
/// use terramesh::{PlanarGraph, Point2};
///
/// # fn main() -> Result<(), terramesh::MeshError> {
/// let mut graph = PlanarGraph::new();
/// graph.add_polygon([
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ])?;
/// let mesh = graph.triangulate()?;
///
/// assert_eq!(mesh.num_triangles(), 2);
/// for triangle in mesh.triangles() {
///     let [a, b, c] = triangle.positions();
///     println!("triangle {:?} {:?} {:?}", a, b, c);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Mesh<S: MeshNum = f64> {
    pub(crate) store: TriangleStore<S>,
    pub(crate) hint: LastUsedTriangleHintGenerator,
    input_vertices: Vec<FixedVertexHandle>,
    num_input_segments: usize,
    pub(crate) diagnostics: Vec<Diagnostic<S>>,
    report: BuildReport<S>,
}

/// The outer vertices that enclose all input vertices are always stored first.
const BOOTSTRAP_VERTICES: [usize; 3] = [0, 1, 2];

impl<S: MeshNum> Mesh<S> {
    pub(crate) fn from_planar_graph(
        graph: &PlanarGraph<S>,
        options: TriangulationOptions,
    ) -> MeshResult<Self> {
        let positions = graph.vertices();
        validate_input(graph)?;

        let mut store = TriangleStore::with_capacity(positions.len() + 3);
        let bootstrap = bootstrap_vertices(positions)?.map(|position| {
            store.push_vertex(position, VertexKind::Undead)
        });
        let mut hint = create_bootstrap_triangle(&mut store, bootstrap);
        debug!("Bootstrapped mesh for {} input vertices", positions.len());

        let mut mesh = Mesh {
            store,
            hint: LastUsedTriangleHintGenerator::default(),
            input_vertices: Vec::with_capacity(positions.len()),
            num_input_segments: graph.num_segments(),
            diagnostics: Vec::new(),
            report: BuildReport {
                diagnostics: Vec::new(),
                num_hull_segments: 0,
                num_undead_vertices: 0,
                num_recovery_flips: 0,
            },
        };

        // Maps the store index of each created vertex to the input that created it
        let mut first_input = Vec::with_capacity(positions.len());
        for (index, position) in positions.iter().enumerate() {
            match mesh.store.insert_vertex(*position, VertexKind::Input, hint) {
                InsertionOutcome::Inserted(vertex) => {
                    first_input.push(index);
                    mesh.input_vertices.push(vertex);
                    if let Some(triangle) = mesh.store.vertex_entry(vertex).triangle {
                        hint = triangle;
                    }
                }
                InsertionOutcome::Duplicate(vertex) => {
                    let merged_into = first_input[vertex.index() - BOOTSTRAP_VERTICES.len()];
                    warn!("Input vertex {index} duplicates vertex {merged_into} and is merged");
                    mesh.diagnostics.push(Diagnostic::DuplicateVertex {
                        index,
                        merged_into,
                    });
                    mesh.input_vertices.push(vertex);
                }
                InsertionOutcome::Outside => {
                    unreachable!("Input vertex outside of the bootstrap triangle. This is a bug.")
                }
            }
        }

        mesh.insert_segments(graph)?;
        if options.close_convex_hull() || graph.num_segments() == 0 {
            mesh.close_convex_hull()?;
        }
        mesh.report.num_recovery_flips +=
            mesh.store.legalize_edges(mesh.store.inner_edges());

        mesh.carve(graph, bootstrap)?;
        mesh.report.diagnostics = mesh.diagnostics.clone();
        if let Some(triangle) = mesh.triangles().next() {
            mesh.hint.notify_triangle_lookup(triangle.fix());
        }
        debug!(
            "Triangulated {} vertices and {} segments into {} triangles",
            mesh.num_vertices(),
            graph.num_segments() + mesh.report.num_hull_segments,
            mesh.num_triangles()
        );
        Ok(mesh)
    }

    fn insert_segments(&mut self, graph: &PlanarGraph<S>) -> Result<(), GeometryError> {
        let mut inserted = HashSet::new();
        for (segment, [from, to]) in graph.segments().iter().enumerate() {
            let from = self.input_vertices[*from];
            let to = self.input_vertices[*to];
            if from == to {
                return Err(GeometryError::DegenerateSegment { segment });
            }
            let key = if from.index() < to.index() {
                (from, to)
            } else {
                (to, from)
            };
            if !inserted.insert(key) {
                continue;
            }
            self.store.insert_segment(from, to, segment)?;
        }
        debug!("Recovered {} segments", inserted.len());
        Ok(())
    }

    fn close_convex_hull(&mut self) -> Result<(), GeometryError> {
        let mut unique: Vec<_> = self.input_vertices.clone();
        unique.sort();
        unique.dedup();
        let points: Vec<_> = unique
            .into_iter()
            .map(|vertex| (vertex, self.store.position(vertex)))
            .collect();

        let hull = convex_hull(&points);
        for (offset, from) in hull.iter().enumerate() {
            let to = hull[(offset + 1) % hull.len()];
            self.store
                .insert_segment(*from, to, self.num_input_segments + offset)?;
        }
        self.report.num_hull_segments = hull.len();
        Ok(())
    }

    fn carve(
        &mut self,
        graph: &PlanarGraph<S>,
        bootstrap: [FixedVertexHandle; 3],
    ) -> Result<(), GeometryError> {
        let exterior = self.store.carve_exterior(bootstrap);
        let hint = FixedTriangleHandle::new(0);
        let mut holes = 0;
        for seed in graph.holes() {
            holes += self.store.carve_hole(*seed, hint);
        }
        debug!("Carved {exterior} exterior triangles and {holes} hole triangles");

        for spec in graph.regions() {
            let region = self.store.regions.len() as u32;
            self.store.regions.push(RegionEntry {
                attribute: spec.attribute,
                max_area: spec.max_area,
            });
            self.store
                .fill_region(spec.seed, region, spec.attribute, hint);
        }

        if self.num_triangles() == 0 {
            return Err(GeometryError::EmptyDomain);
        }

        let mut undead = 0;
        for index in BOOTSTRAP_VERTICES.len()..self.store.num_vertices() {
            let vertex = FixedVertexHandle::new(index);
            if !self.store.is_in_domain(vertex) {
                self.store.vertex_entry_mut(vertex).kind = VertexKind::Undead;
                undead += 1;
            }
        }
        self.report.num_undead_vertices = undead;
        Ok(())
    }

    /// Returns the number of vertices of the input graph, including merged duplicates.
    pub fn num_input_vertices(&self) -> usize {
        self.input_vertices.len()
    }

    /// Returns the vertex that represents an input vertex.
    ///
    /// Merged duplicates return the vertex they were merged into.
    pub fn input_vertex(&self, index: usize) -> Option<VertexHandle<S>> {
        self.input_vertices
            .get(index)
            .map(|vertex| self.store.vertex(*vertex))
    }

    /// Returns the number of vertices of the meshed domain.
    pub fn num_vertices(&self) -> usize {
        self.vertices().count()
    }

    /// Returns the number of triangles of the meshed domain.
    pub fn num_triangles(&self) -> usize {
        self.store
            .triangles
            .iter()
            .filter(|entry| !entry.excluded)
            .count()
    }

    /// Returns the number of constraint edges.
    pub fn num_subsegments(&self) -> usize {
        self.subsegments().count()
    }

    /// Iterates over all vertices of the meshed domain.
    ///
    /// Vertices outside of the domain (see [VertexKind::Undead]) are skipped.
    pub fn vertices(&self) -> impl Iterator<Item = VertexHandle<'_, S>> + '_ {
        (0..self.store.num_vertices())
            .map(|index| self.store.vertex(FixedVertexHandle::new(index)))
            .filter(|vertex| vertex.kind() != VertexKind::Undead)
    }

    /// Iterates over all triangles of the meshed domain.
    ///
    /// The order is stable as long as the mesh is not modified.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleHandle<'_, S>> + '_ {
        (0..self.store.num_triangles())
            .map(|index| self.store.triangle(FixedTriangleHandle::new(index)))
            .filter(|triangle| triangle.is_in_domain())
    }

    /// Iterates over all constraint edges that border the meshed domain.
    pub fn subsegments(&self) -> impl Iterator<Item = SubsegmentHandle<'_, S>> + '_ {
        (0..self.store.num_subsegments())
            .map(|index| self.store.subsegment(FixedSubsegmentHandle::new(index)))
            .filter(|subsegment| {
                subsegment
                    .sides()
                    .iter()
                    .flatten()
                    .any(|side| side.triangle().is_in_domain())
            })
    }

    /// Returns a vertex by its handle.
    pub fn vertex(&self, handle: FixedVertexHandle) -> VertexHandle<S> {
        self.store.vertex(handle)
    }

    /// Returns a triangle by its handle.
    pub fn triangle(&self, handle: FixedTriangleHandle) -> TriangleHandle<S> {
        self.store.triangle(handle)
    }

    /// Locates a point.
    ///
    /// The location refers to the underlying triangulation, which extends beyond the meshed
    /// domain. Use [TriangleHandle::is_in_domain] to check the result.
    pub fn locate(&self, position: Point2<S>) -> PointLocation {
        let location = self.store.locate(position, self.hint.get_hint());
        if let Some(triangle) = location.containing_triangle(&self.store) {
            self.hint.notify_triangle_lookup(triangle);
        }
        location
    }

    /// Inserts an additional vertex into the meshed domain.
    ///
    /// Returns the existing vertex if the position is already taken. A vertex placed on a
    /// constraint edge splits it.
    pub fn insert(&mut self, position: Point2<S>) -> MeshResult<FixedVertexHandle> {
        validate_point(position)?;
        let location = self.locate(position);
        let is_excluded = |triangle: FixedTriangleHandle| {
            self.store.triangle_entry(triangle).excluded
        };
        let in_domain = match location {
            PointLocation::Inside(triangle) => !is_excluded(triangle),
            PointLocation::OnEdge(edge) => {
                !is_excluded(edge.triangle())
                    || self
                        .store
                        .sym(edge)
                        .is_some_and(|sym| !is_excluded(sym.triangle()))
            }
            PointLocation::OnVertex(vertex) => {
                self.store.vertex_entry(vertex).kind != VertexKind::Undead
            }
            PointLocation::Outside(_) => false,
        };
        if !in_domain {
            return Err(MeshError::OutsideOfDomain);
        }

        match self
            .store
            .insert_at_location(location, position, VertexKind::Input)
        {
            InsertionOutcome::Inserted(vertex) => {
                self.input_vertices.push(vertex);
                Ok(vertex)
            }
            InsertionOutcome::Duplicate(vertex) => Ok(vertex),
            InsertionOutcome::Outside => Err(MeshError::OutsideOfDomain),
        }
    }

    /// Overwrites the tag of a triangle.
    ///
    /// Tags are initialized with the attribute of the triangle's region. Triangles created by
    /// later refinement inherit the tag of the triangle they were split from.
    pub fn set_tag(&mut self, triangle: FixedTriangleHandle, tag: Option<u32>) {
        self.store.triangle_entry_mut(triangle).tag = tag;
    }

    /// Returns all diagnostics collected while building and refining this mesh.
    pub fn diagnostics(&self) -> &[Diagnostic<S>] {
        &self.diagnostics
    }

    /// Returns the report of the initial triangulation.
    pub fn build_report(&self) -> &BuildReport<S> {
        &self.report
    }

    /// Calculates angle and area ranges over all triangles of the meshed domain.
    pub fn statistics(&self) -> MeshStatistics<S> {
        let mut result = MeshStatistics {
            num_vertices: self.num_vertices(),
            num_triangles: 0,
            num_subsegments: self.num_subsegments(),
            min_angle_deg: 180.0,
            max_angle_deg: 0.0,
            min_area: S::infinity(),
            max_area: S::zero(),
        };
        for triangle in self.triangles() {
            let positions = triangle.positions();
            let area = triangle.area();
            result.num_triangles += 1;
            result.min_angle_deg = result
                .min_angle_deg
                .min(math::min_angle(positions).to_degrees());
            result.max_angle_deg = result
                .max_angle_deg
                .max(math::max_angle(positions).to_degrees());
            result.min_area = result.min_area.min(area);
            result.max_area = result.max_area.max(area);
        }
        result
    }

    /// Extracts compact vertex and index buffers of the meshed domain.
    pub fn index_buffers(&self) -> IndexBuffers<S> {
        let mut compact_index = vec![None; self.store.num_vertices()];
        let mut buffers = IndexBuffers {
            positions: Vec::new(),
            kinds: Vec::new(),
            triangles: Vec::with_capacity(self.store.num_triangles()),
            regions: Vec::new(),
            tags: Vec::new(),
        };

        for triangle in self.triangles() {
            let indices = triangle.vertices().map(|vertex| {
                *compact_index[vertex.index()].get_or_insert_with(|| {
                    buffers.positions.push(vertex.position());
                    buffers.kinds.push(vertex.kind());
                    (buffers.positions.len() - 1) as u32
                })
            });
            buffers.triangles.push(indices);
            buffers.regions.push(triangle.region());
            buffers.tags.push(triangle.tag());
        }
        buffers
    }
}

fn validate_input<S: MeshNum>(graph: &PlanarGraph<S>) -> Result<(), GeometryError> {
    let positions = graph.vertices();
    for (index, position) in positions.iter().enumerate() {
        validate_point(*position)
            .map_err(|error| GeometryError::InvalidCoordinate { index, error })?;
    }
    for (segment, [from, to]) in graph.segments().iter().enumerate() {
        for vertex in [*from, *to] {
            if vertex >= positions.len() {
                return Err(GeometryError::VertexOutOfRange {
                    segment,
                    vertex,
                    num_vertices: positions.len(),
                });
            }
        }
    }

    let Some((first, rest)) = positions.split_first() else {
        return Err(GeometryError::CollinearInput);
    };
    let Some(second) = rest.iter().find(|position| *position != first) else {
        return Err(GeometryError::CollinearInput);
    };
    if rest
        .iter()
        .all(|position| orientation(*first, *second, *position).is_collinear())
    {
        return Err(GeometryError::CollinearInput);
    }
    Ok(())
}

/// Returns a counterclockwise triangle that contains all given points well inside.
///
/// Fails if the triangle's coordinates cannot be used by the exact predicates.
fn bootstrap_vertices<S: MeshNum>(
    positions: &[Point2<S>],
) -> Result<[Point2<S>; 3], GeometryError> {
    let (min, max) = positions.iter().skip(1).fold(
        (positions[0], positions[0]),
        |(min, max), position| (min.min_components(*position), max.max_components(*position)),
    );
    let center = min.midpoint(max);
    let extent = max.sub(min);
    let d = extent.x.max(extent.y);
    let far: S = 20.0f32.into();
    let vertices = [
        Point2::new(center.x - d * far, center.y - d),
        Point2::new(center.x + d * far, center.y - d),
        Point2::new(center.x, center.y + d * far),
    ];
    for vertex in vertices {
        validate_point(vertex).map_err(|error| GeometryError::ExtentTooLarge { error })?;
    }
    Ok(vertices)
}

#[cfg(test)]
impl<S: MeshNum> Mesh<S> {
    /// Checks topology, the Delaunay property and the domain boundary.
    pub(crate) fn cdt_sanity_check(&self) {
        self.store.sanity_check();
        self.store.delaunay_sanity_check();

        for triangle in self.store.triangles.iter() {
            for (slot, neighbor) in triangle.neighbors.iter().enumerate() {
                let Some(neighbor) = neighbor else { continue };
                let neighbor_excluded = self.store.triangle_entry(neighbor.triangle()).excluded;
                if triangle.excluded != neighbor_excluded {
                    assert!(
                        triangle.subsegments[slot].is_some(),
                        "Domain boundary without sub-segment"
                    );
                }
            }
        }

        for vertex in self.vertices() {
            assert!(vertex.triangles().next().is_some());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utilities::{check_constraints, random_points_with_seed, SEED};
    use approx::assert_relative_eq;

    fn unit_square() -> Result<PlanarGraph<f64>, GeometryError> {
        let mut graph = PlanarGraph::new();
        graph.add_polygon([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])?;
        Ok(graph)
    }

    #[test]
    fn test_unit_square() -> Result<(), MeshError> {
        let mesh = unit_square()?.triangulate()?;
        mesh.cdt_sanity_check();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.num_subsegments(), 4);

        for triangle in mesh.triangles() {
            assert_relative_eq!(triangle.area(), 0.5);
            assert_relative_eq!(triangle.min_angle().to_degrees(), 45.0, epsilon = 1e-9);
            assert_relative_eq!(
                math::max_angle(triangle.positions()).to_degrees(),
                90.0,
                epsilon = 1e-9
            );
        }
        Ok(())
    }

    #[test]
    fn test_unit_square_with_diagonal() -> Result<(), MeshError> {
        let mut graph = unit_square()?;
        graph.add_segment(1, 3)?;
        let mesh = graph.triangulate()?;
        mesh.cdt_sanity_check();
        check_constraints(&mesh, &graph);

        assert_eq!(mesh.num_triangles(), 2);
        let diagonal = [1, 3].map(|index| mesh.input_vertex(index).unwrap().fix());
        for triangle in mesh.triangles() {
            let vertices = triangle.vertices().map(|vertex| vertex.fix());
            assert!(diagonal.iter().all(|vertex| vertices.contains(vertex)));
        }
        Ok(())
    }

    #[test]
    fn test_point_set_is_closed_by_hull() -> Result<(), MeshError> {
        let mut graph = PlanarGraph::new();
        graph.add_vertices(random_points_with_seed(100, SEED))?;
        let mesh = graph.triangulate()?;
        mesh.cdt_sanity_check();

        assert_eq!(mesh.num_vertices(), 100);
        let hull = mesh.build_report().num_hull_segments;
        assert!(hull >= 3);
        // Euler's formula for a triangulated convex point set
        assert_eq!(mesh.num_triangles(), 2 * 100 - 2 - hull);
        Ok(())
    }

    #[test]
    fn test_duplicate_vertices_are_merged() -> Result<(), MeshError> {
        let mut graph = unit_square()?;
        let duplicate = graph.add_vertex(Point2::new(1.0, 1.0))?;
        let mesh = graph.triangulate()?;

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(
            mesh.diagnostics(),
            &[Diagnostic::DuplicateVertex {
                index: duplicate,
                merged_into: 2
            }]
        );
        assert_eq!(mesh.input_vertex(duplicate), mesh.input_vertex(2));
        Ok(())
    }

    #[test]
    fn test_merged_segment_is_degenerate() -> Result<(), MeshError> {
        let mut graph = unit_square()?;
        let duplicate = graph.add_vertex(Point2::new(1.0, 1.0))?;
        graph.add_segment(2, duplicate)?;
        assert_eq!(
            graph.triangulate().unwrap_err(),
            MeshError::InvalidInputGeometry(GeometryError::DegenerateSegment { segment: 4 })
        );
        Ok(())
    }

    #[test]
    fn test_crossing_segments_are_rejected() -> Result<(), MeshError> {
        let mut graph = unit_square()?;
        graph.add_segment(0, 2)?;
        graph.add_segment(1, 3)?;
        assert_eq!(
            graph.triangulate().unwrap_err(),
            MeshError::InvalidInputGeometry(GeometryError::CrossingSegments {
                segment: 5,
                other: 4
            })
        );
        Ok(())
    }

    #[test]
    fn test_collinear_input() -> Result<(), MeshError> {
        let mut graph = PlanarGraph::new();
        graph.add_vertices([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 0.0),
        ])?;
        assert_eq!(
            graph.triangulate().unwrap_err(),
            MeshError::InvalidInputGeometry(GeometryError::CollinearInput)
        );
        assert_eq!(
            PlanarGraph::<f64>::new().triangulate().unwrap_err(),
            MeshError::InvalidInputGeometry(GeometryError::CollinearInput)
        );
        Ok(())
    }

    #[test]
    fn test_huge_extent_is_rejected() -> Result<(), MeshError> {
        // Every coordinate is valid, the enclosing triangle's are not
        let mut graph = PlanarGraph::new();
        graph.add_polygon([
            Point2::new(-1.0e60, -1.0e60),
            Point2::new(1.0e60, -1.0e60),
            Point2::new(0.0, 1.0e60),
        ])?;
        assert_eq!(
            graph.triangulate().unwrap_err(),
            MeshError::InvalidInputGeometry(GeometryError::ExtentTooLarge {
                error: crate::InsertionError::TooLarge
            })
        );

        let mut graph = PlanarGraph::new();
        graph.add_polygon([
            Point2::new(-1.0e50, -1.0e50),
            Point2::new(1.0e50, -1.0e50),
            Point2::new(0.0, 1.0e50),
        ])?;
        assert_eq!(graph.triangulate()?.num_triangles(), 1);
        Ok(())
    }

    #[test]
    fn test_mesh_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Mesh<f64>>();
        assert_send::<Mesh<f32>>();
    }

    #[test]
    fn test_open_polyline_is_empty() -> Result<(), MeshError> {
        let mut graph = PlanarGraph::new();
        graph.add_vertices([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ])?;
        graph.add_segment(0, 1)?;
        graph.add_segment(1, 2)?;
        assert_eq!(
            graph.triangulate().unwrap_err(),
            MeshError::InvalidInputGeometry(GeometryError::EmptyDomain)
        );

        let mesh = graph.triangulate_with_options(TriangulationOptions::new().with_convex_hull(true))?;
        assert_eq!(mesh.num_triangles(), 1);
        Ok(())
    }

    #[test]
    fn test_hole_and_undead_vertices() -> Result<(), MeshError> {
        let mut graph = PlanarGraph::new();
        graph.add_polygon([
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ])?;
        graph.add_polygon([
            Point2::new(1.0, 1.0),
            Point2::new(3.0, 1.0),
            Point2::new(3.0, 3.0),
            Point2::new(1.0, 3.0),
        ])?;
        let inside_hole = graph.add_vertex(Point2::new(2.0, 2.5))?;
        let outside = graph.add_vertex(Point2::new(10.0, 10.0))?;
        graph.add_hole(Point2::new(2.0, 2.0));
        // Ignored, lies outside of the domain
        graph.add_hole(Point2::new(-5.0, 0.0));

        let mesh = graph.triangulate()?;
        mesh.cdt_sanity_check();
        check_constraints(&mesh, &graph);

        let area: f64 = mesh.triangles().map(|triangle| triangle.area()).sum();
        assert_relative_eq!(area, 12.0, epsilon = 1e-9);
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.build_report().num_undead_vertices, 2);
        for index in [inside_hole, outside] {
            assert_eq!(mesh.input_vertex(index).unwrap().kind(), VertexKind::Undead);
        }
        assert_eq!(
            mesh.clone().insert(Point2::new(2.0, 2.0)),
            Err(MeshError::OutsideOfDomain)
        );
        Ok(())
    }

    #[test]
    fn test_regions_and_tags() -> Result<(), MeshError> {
        let mut graph = unit_square()?;
        graph.add_segment(0, 2)?;
        graph.add_region(Point2::new(0.7, 0.2), 1, None);
        graph.add_region(Point2::new(0.2, 0.7), 2, Some(0.1));
        let mut mesh = graph.triangulate()?;

        let regions: Vec<_> = mesh.triangles().map(|triangle| triangle.region()).collect();
        assert_eq!(regions.len(), 2);
        assert!(regions.contains(&Some(1)));
        assert!(regions.contains(&Some(2)));
        for triangle in mesh.triangles() {
            assert_eq!(triangle.tag(), triangle.region());
            let expected = if triangle.region() == Some(2) {
                Some(0.1)
            } else {
                None
            };
            assert_eq!(triangle.region_max_area(), expected);
        }

        let first = mesh.triangles().next().unwrap().fix();
        mesh.set_tag(first, Some(42));
        assert_eq!(mesh.triangle(first).tag(), Some(42));
        Ok(())
    }

    #[test]
    fn test_insert() -> Result<(), MeshError> {
        let mut mesh = unit_square()?.triangulate()?;
        let center = mesh.insert(Point2::new(0.5, 0.5))?;
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.insert(Point2::new(0.5, 0.5))?, center);

        // On the boundary
        mesh.insert(Point2::new(0.5, 0.0))?;
        assert_eq!(mesh.num_triangles(), 5);
        assert_eq!(mesh.num_subsegments(), 5);
        mesh.cdt_sanity_check();

        assert_eq!(
            mesh.insert(Point2::new(2.0, 0.5)),
            Err(MeshError::OutsideOfDomain)
        );
        assert_eq!(
            mesh.insert(Point2::new(f64::NAN, 0.5)),
            Err(MeshError::InvalidCoordinate(crate::InsertionError::NAN))
        );
        Ok(())
    }

    #[test]
    fn test_locate() -> Result<(), MeshError> {
        let mesh = unit_square()?.triangulate()?;
        let corner = mesh.input_vertex(0).unwrap().fix();
        assert_eq!(mesh.locate(Point2::new(0.0, 0.0)), PointLocation::OnVertex(corner));
        match mesh.locate(Point2::new(0.25, 0.5)) {
            PointLocation::Inside(triangle) => assert!(mesh.triangle(triangle).is_in_domain()),
            other => panic!("unexpected location {other:?}"),
        }
        match mesh.locate(Point2::new(-1.0, 0.5)) {
            PointLocation::Inside(triangle) => assert!(!mesh.triangle(triangle).is_in_domain()),
            other => panic!("unexpected location {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_index_buffers_and_statistics() -> Result<(), MeshError> {
        let mut graph = unit_square()?;
        graph.add_region(Point2::new(0.5, 0.5), 3, None);
        let mesh = graph.triangulate()?;

        let buffers = mesh.index_buffers();
        assert_eq!(buffers.positions.len(), 4);
        assert_eq!(buffers.kinds, vec![VertexKind::Input; 4]);
        assert_eq!(buffers.triangles.len(), 2);
        assert_eq!(buffers.regions, vec![Some(3); 2]);
        for [a, b, c] in &buffers.triangles {
            let [a, b, c] = [a, b, c].map(|index| buffers.positions[*index as usize]);
            assert!(math::triangle_area(a, b, c) > 0.0);
        }

        let statistics = mesh.statistics();
        assert_eq!(statistics.num_triangles, 2);
        assert_eq!(statistics.num_subsegments, 4);
        assert_relative_eq!(statistics.min_angle_deg, 45.0, epsilon = 1e-9);
        assert_relative_eq!(statistics.max_angle_deg, 90.0, epsilon = 1e-9);
        assert_relative_eq!(statistics.min_area, 0.5);
        assert_relative_eq!(statistics.max_area, 0.5);
        Ok(())
    }

    #[test]
    fn test_f32_coordinates() -> Result<(), MeshError> {
        let mut graph = PlanarGraph::<f32>::new();
        graph.add_polygon([
            Point2::new(0.0f32, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.5),
        ])?;
        let mesh = graph.triangulate()?;
        mesh.cdt_sanity_check();
        assert_eq!(mesh.num_triangles(), 1);
        Ok(())
    }
}
