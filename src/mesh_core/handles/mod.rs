//! Handles to the elements of a mesh.
//!
//! *Fixed* handles are plain indices that stay valid while a mesh is being edited. *Dynamic*
//! handles borrow the mesh and can be used to navigate it, e.g. from a triangle to its
//! vertices or across an edge to the neighboring triangle.

mod handle_defs;
mod handle_impls;

pub use handle_defs::*;
