//! Error and diagnostic types.

use thiserror::Error;

use crate::Point2;

/// The error type used for validating coordinates before they enter a mesh.
///
/// Coordinates are checked against [crate::MIN_ALLOWED_VALUE] and [crate::MAX_ALLOWED_VALUE]
/// to keep the exact geometric predicates free of overflow and underflow.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Debug, Hash, Error)]
pub enum InsertionError {
    /// A coordinate value was too small.
    ///
    /// The absolute value of any inserted vertex coordinate must either be zero or
    /// greater than or equal to [crate::MIN_ALLOWED_VALUE].
    #[error("coordinate is too small")]
    TooSmall,

    /// A coordinate value was too large.
    ///
    /// The absolute value of any inserted vertex coordinate must be less than or equal to
    /// [crate::MAX_ALLOWED_VALUE].
    #[error("coordinate is too large")]
    TooLarge,

    /// A coordinate value was NaN.
    #[error("coordinate is NaN")]
    NAN,
}

/// Describes why an input planar straight line graph cannot be triangulated.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum GeometryError {
    /// A vertex coordinate cannot be used by the exact predicates.
    #[error("vertex {index} has an invalid coordinate: {error}")]
    InvalidCoordinate {
        /// Index of the offending input vertex.
        index: usize,
        /// Reason for rejecting the coordinate.
        error: InsertionError,
    },

    /// A segment refers to a vertex that does not exist.
    #[error("segment {segment} references vertex {vertex} but only {num_vertices} vertices exist")]
    VertexOutOfRange {
        /// Index of the segment.
        segment: usize,
        /// The vertex index that is out of range.
        vertex: usize,
        /// Number of input vertices.
        num_vertices: usize,
    },

    /// Both endpoints of a segment coincide (possibly after merging duplicate vertices).
    #[error("segment {segment} has zero length")]
    DegenerateSegment {
        /// Index of the segment.
        segment: usize,
    },

    /// Two segments intersect somewhere else than at a shared endpoint.
    ///
    /// Segment indices at or above the number of input segments refer to convex hull segments
    /// added by [crate::TriangulationOptions::close_convex_hull].
    #[error("segment {segment} crosses segment {other}")]
    CrossingSegments {
        /// Index of the segment that was being inserted.
        segment: usize,
        /// Index of the already inserted segment.
        other: usize,
    },

    /// The segments do not enclose any area. Every triangle was carved away as exterior.
    #[error("segments do not enclose any area")]
    EmptyDomain,

    /// The input does not contain three vertices that span a triangle.
    #[error("input needs at least three vertices that are not collinear")]
    CollinearInput,

    /// The input spans such a large area that the triangle enclosing it during construction
    /// would have coordinates beyond [crate::MAX_ALLOWED_VALUE].
    #[error("input extent is too large to be enclosed: {error}")]
    ExtentTooLarge {
        /// Reason for rejecting the enclosing triangle.
        error: InsertionError,
    },
}

/// Errors returned by fallible mesh operations.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum MeshError {
    /// The input geometry is self intersecting or degenerate. No mesh is produced.
    #[error("invalid input geometry: {0}")]
    InvalidInputGeometry(#[from] GeometryError),

    /// A single inserted point had an invalid coordinate.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] InsertionError),

    /// A point was inserted outside of the meshed domain.
    #[error("point lies outside of the meshed domain")]
    OutsideOfDomain,
}

/// Result type for mesh operations.
pub type MeshResult<T> = std::result::Result<T, MeshError>;

/// Non fatal conditions encountered while building or refining a mesh.
///
/// Diagnostics never invalidate the produced mesh, they are reported alongside it and
/// logged with the `log` facade.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Diagnostic<S> {
    /// An input vertex coincided with an earlier one and was merged into it.
    DuplicateVertex {
        /// Index of the dropped input vertex.
        index: usize,
        /// Index of the input vertex that is used in its place.
        merged_into: usize,
    },

    /// The Steiner point budget ran out before all quality bounds were met.
    ///
    /// The mesh is still a valid constrained Delaunay triangulation, some triangles may violate
    /// the requested angle or area bounds.
    UnboundedRefinement {
        /// Number of Steiner points inserted before giving up.
        steiner_points: usize,
    },

    /// A candidate point could not be inserted without an ambiguous predicate result
    /// (e.g. it coincided with an existing vertex after rounding). The point was skipped.
    NumericalDegeneracy {
        /// The rejected position.
        position: Point2<S>,
    },
}
