use std::ops::Range;

use crate::error::GeometryError;
use crate::mesh_core::math::validate_point;
use crate::{Mesh, MeshNum, MeshResult, Point2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Assigns an attribute and an optional area bound to all triangles around a seed point.
///
/// The region spreads from the seed until it hits a constraint segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct RegionSpec<S> {
    /// Any point inside of the region.
    pub seed: Point2<S>,
    /// Attribute reported by [crate::handles::TriangleHandle::region].
    pub attribute: u32,
    /// Area bound applied instead of the global bound during refinement.
    pub max_area: Option<S>,
}

/// Controls how a [PlanarGraph] is triangulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct TriangulationOptions {
    close_convex_hull: bool,
}

impl TriangulationOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the edges of the input's convex hull as additional constraint segments.
    ///
    /// This is always done if the graph contains no segments at all, a plain point set is
    /// meshed up to its convex hull.
    #[must_use]
    pub fn with_convex_hull(mut self, close_convex_hull: bool) -> Self {
        self.close_convex_hull = close_convex_hull;
        self
    }

    /// Returns `true` if the convex hull is closed with segments.
    pub fn close_convex_hull(&self) -> bool {
        self.close_convex_hull
    }
}

/// A planar straight line graph: the input of a triangulation.
///
/// Consists of vertices, segments connecting them, hole seeds and region seeds. Segments must
/// not cross each other except at shared endpoints. The meshed domain is the area enclosed by
/// the segments, minus the holes.
///
/// Indices and coordinates are validated eagerly, the remaining checks (crossing segments,
/// collinear input) happen during [PlanarGraph::triangulate].
///
/// # Example
/// ```
/// use terramesh::{PlanarGraph, Point2};
///
/// # fn main() -> Result<(), terramesh::MeshError> {
/// let mut graph = PlanarGraph::new();
/// graph.add_polygon([
///     Point2::new(0.0, 0.0),
///     Point2::new(3.0, 0.0),
///     Point2::new(3.0, 3.0),
///     Point2::new(0.0, 3.0),
/// ])?;
/// graph.add_polygon([
///     Point2::new(1.0, 1.0),
///     Point2::new(2.0, 1.0),
///     Point2::new(2.0, 2.0),
///     Point2::new(1.0, 2.0),
/// ])?;
/// graph.add_hole(Point2::new(1.5, 1.5));
///
/// let mesh = graph.triangulate()?;
/// assert_eq!(mesh.num_triangles(), 8);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct PlanarGraph<S = f64> {
    vertices: Vec<Point2<S>>,
    segments: Vec<[usize; 2]>,
    holes: Vec<Point2<S>>,
    regions: Vec<RegionSpec<S>>,
}

impl<S> Default for PlanarGraph<S> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            segments: Vec::new(),
            holes: Vec::new(),
            regions: Vec::new(),
        }
    }
}

impl<S: MeshNum> PlanarGraph<S> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: Point2<S>) -> Result<usize, GeometryError> {
        let index = self.vertices.len();
        validate_point(position)
            .map_err(|error| GeometryError::InvalidCoordinate { index, error })?;
        self.vertices.push(position);
        Ok(index)
    }

    /// Adds several vertices and returns the range of their indices.
    ///
    /// Nothing is added if any of the vertices is invalid.
    pub fn add_vertices(
        &mut self,
        positions: impl IntoIterator<Item = Point2<S>>,
    ) -> Result<Range<usize>, GeometryError> {
        let start = self.vertices.len();
        let positions: Vec<_> = positions.into_iter().collect();
        for (offset, position) in positions.iter().enumerate() {
            validate_point(*position).map_err(|error| GeometryError::InvalidCoordinate {
                index: start + offset,
                error,
            })?;
        }
        self.vertices.extend(positions);
        Ok(start..self.vertices.len())
    }

    /// Adds a segment between two existing vertices and returns its index.
    pub fn add_segment(&mut self, from: usize, to: usize) -> Result<usize, GeometryError> {
        let segment = self.segments.len();
        let num_vertices = self.vertices.len();
        for vertex in [from, to] {
            if vertex >= num_vertices {
                return Err(GeometryError::VertexOutOfRange {
                    segment,
                    vertex,
                    num_vertices,
                });
            }
        }
        if from == to {
            return Err(GeometryError::DegenerateSegment { segment });
        }
        self.segments.push([from, to]);
        Ok(segment)
    }

    /// Adds a closed polygon: a new vertex per point and a segment between each pair of
    /// consecutive points, including the last and the first one.
    ///
    /// Returns the range of the new vertex indices.
    pub fn add_polygon(
        &mut self,
        points: impl IntoIterator<Item = Point2<S>>,
    ) -> Result<Range<usize>, GeometryError> {
        let range = self.add_vertices(points)?;
        if range.len() >= 2 {
            for from in range.clone() {
                let to = if from + 1 == range.end {
                    range.start
                } else {
                    from + 1
                };
                self.add_segment(from, to)?;
            }
        }
        Ok(range)
    }

    /// Marks the segment bounded area around `seed` as hole.
    ///
    /// Seeds that end up outside of the meshed domain are ignored.
    pub fn add_hole(&mut self, seed: Point2<S>) {
        self.holes.push(seed);
    }

    /// Assigns `attribute` and an optional area bound to the segment bounded area around
    /// `seed`.
    ///
    /// If two regions share an area, the one added last wins.
    pub fn add_region(&mut self, seed: Point2<S>, attribute: u32, max_area: Option<S>) {
        self.regions.push(RegionSpec {
            seed,
            attribute,
            max_area,
        });
    }

    /// Returns all vertex positions in insertion order.
    pub fn vertices(&self) -> &[Point2<S>] {
        &self.vertices
    }

    /// Returns all segments as pairs of vertex indices.
    pub fn segments(&self) -> &[[usize; 2]] {
        &self.segments
    }

    /// Returns all hole seeds.
    pub fn holes(&self) -> &[Point2<S>] {
        &self.holes
    }

    /// Returns all region specifications.
    pub fn regions(&self) -> &[RegionSpec<S>] {
        &self.regions
    }

    /// Returns the number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Builds the constrained Delaunay triangulation of this graph with default options.
    pub fn triangulate(&self) -> MeshResult<Mesh<S>> {
        self.triangulate_with_options(TriangulationOptions::default())
    }

    /// Builds the constrained Delaunay triangulation of this graph.
    ///
    /// The result is not refined, see [Mesh::refine].
    pub fn triangulate_with_options(&self, options: TriangulationOptions) -> MeshResult<Mesh<S>> {
        Mesh::from_planar_graph(self, options)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::InsertionError;

    #[test]
    fn test_add_polygon() -> Result<(), GeometryError> {
        let mut graph = PlanarGraph::new();
        graph.add_vertex(Point2::new(5.0, 5.0))?;
        let range = graph.add_polygon([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ])?;
        assert_eq!(range, 1..4);
        assert_eq!(graph.segments(), &[[1, 2], [2, 3], [3, 1]]);
        Ok(())
    }

    #[test]
    fn test_invalid_input_is_rejected() -> Result<(), GeometryError> {
        let mut graph = PlanarGraph::new();
        let a = graph.add_vertex(Point2::new(0.0, 0.0))?;

        assert_eq!(
            graph.add_vertex(Point2::new(f64::NAN, 0.0)),
            Err(GeometryError::InvalidCoordinate {
                index: 1,
                error: InsertionError::NAN
            })
        );
        assert_eq!(
            graph.add_segment(a, 3),
            Err(GeometryError::VertexOutOfRange {
                segment: 0,
                vertex: 3,
                num_vertices: 1
            })
        );
        assert_eq!(
            graph.add_segment(a, a),
            Err(GeometryError::DegenerateSegment { segment: 0 })
        );

        let result = graph.add_vertices([Point2::new(1.0, 1.0), Point2::new(1e300, 0.0)]);
        assert_eq!(
            result,
            Err(GeometryError::InvalidCoordinate {
                index: 2,
                error: InsertionError::TooLarge
            })
        );
        assert_eq!(graph.num_vertices(), 1);
        assert_eq!(graph.num_segments(), 0);
        Ok(())
    }

    #[test]
    fn test_holes_and_regions() {
        let mut graph = PlanarGraph::<f32>::new();
        graph.add_hole(Point2::new(0.5, 0.5));
        graph.add_region(Point2::new(1.0, 1.0), 7, Some(0.25));

        assert_eq!(graph.holes(), &[Point2::new(0.5, 0.5)]);
        assert_eq!(
            graph.regions(),
            &[RegionSpec {
                seed: Point2::new(1.0, 1.0),
                attribute: 7,
                max_area: Some(0.25)
            }]
        );
    }

    #[test]
    fn test_options() {
        assert!(!TriangulationOptions::new().close_convex_hull());
        assert!(TriangulationOptions::new()
            .with_convex_hull(true)
            .close_convex_hull());
    }
}
