//! # terramesh
//!
//! Constrained Delaunay triangulation and quality mesh refinement of planar straight line
//! graphs.
//!
//! Describe the area to mesh as a [PlanarGraph]: a set of vertices, segments connecting them,
//! hole seeds and region seeds. [PlanarGraph::triangulate] turns it into a [Mesh] whose edges
//! respect every segment. [Mesh::refine] then inserts Steiner points until all triangles fulfill
//! a minimum angle and maximum area bound (Ruppert's and Chew's algorithms).
//!
//! # Example
//! ```
//! use terramesh::{AngleLimit, PlanarGraph, Point2, RefinementParameters};
//!
//! # fn main() -> Result<(), terramesh::MeshError> {
//! let mut graph = PlanarGraph::new();
//! // Boundary
//! graph.add_polygon([
//!     Point2::new(0.0, 0.0),
//!     Point2::new(4.0, 0.0),
//!     Point2::new(4.0, 3.0),
//!     Point2::new(0.0, 3.0),
//! ])?;
//! // A hole
//! graph.add_polygon([
//!     Point2::new(1.0, 1.0),
//!     Point2::new(2.0, 1.0),
//!     Point2::new(1.5, 2.0),
//! ])?;
//! graph.add_hole(Point2::new(1.5, 1.5));
//!
//! let mut mesh = graph.triangulate()?;
//! let result = mesh.refine(
//!     &RefinementParameters::new()
//!         .with_angle_limit(AngleLimit::from_deg(25.0))
//!         .with_max_allowed_area(0.2),
//! );
//! assert!(result.refinement_complete);
//!
//! let buffers = mesh.index_buffers();
//! assert_eq!(buffers.triangles.len(), mesh.num_triangles());
//! # Ok(())
//! # }
//! ```
//!
//! # Robustness
//! All geometric decisions use Shewchuk's adaptive exact predicates (provided by the `robust`
//! crate). Coordinates are validated against [MIN_ALLOWED_VALUE] and [MAX_ALLOWED_VALUE] to
//! keep these predicates exact.
//!
//! # Logging
//! Progress and non fatal conditions are reported through the [log](https://docs.rs/log)
//! facade. No logger is installed by this crate.
//!
//! # Cargo features
//! `serde`: Derives `Serialize` and `Deserialize` for the input and parameter types.

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(missing_docs)]

mod cdt;
mod error;
mod mesh;
mod mesh_core;
mod planar_graph;
mod point;

#[cfg(test)]
mod test_utilities;

pub use crate::error::{Diagnostic, GeometryError, InsertionError, MeshError, MeshResult};
pub use crate::mesh::{BuildReport, IndexBuffers, Mesh, MeshStatistics};
pub use crate::mesh_core::math::{
    validate_coordinate, validate_point, Orientation, MAX_ALLOWED_VALUE, MIN_ALLOWED_VALUE,
};
pub use crate::mesh_core::{
    AngleLimit, InsertionOutcome, PointLocation, RefinementParameters, RefinementResult,
    SteinerLimit, VertexKind,
};
pub use crate::planar_graph::{PlanarGraph, RegionSpec, TriangulationOptions};
pub use crate::point::{MeshNum, Point2};

/// Handle types used to navigate a [Mesh].
pub mod handles {
    pub use crate::mesh_core::{
        FixedSubsegmentHandle, FixedTriangleHandle, FixedVertexHandle, OrientedTriangle,
        OrientedTriangleHandle, SubsegmentHandle, TriangleHandle, VertexHandle,
    };
}
