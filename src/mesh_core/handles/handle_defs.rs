use std::convert::TryInto;

use super::super::TriangleStore;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Internal type definition that is only exposed for documentation purposes.
///
/// Use the type aliases [FixedVertexHandle], [FixedTriangleHandle] and
/// [FixedSubsegmentHandle] instead.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct FixedHandleImpl<Type> {
    index: u32,
    ty: Type,
}

impl<Type> std::fmt::Debug for FixedHandleImpl<Type> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedHandle")
            .field("index", &self.index)
            .finish()
    }
}

impl<Type: Default> FixedHandleImpl<Type> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index: index
                .try_into()
                .expect("Index too big - at most 2^32 elements supported"),
            ty: Type::default(),
        }
    }

    /// Returns the internal index of this element.
    ///
    /// Indices are stable: meshing operations only ever append vertices, triangles and
    /// sub-segments, they never remove or reorder them.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct VertexTag;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct TriangleTag;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct SubsegmentTag;

/// Fixed handle to a vertex.
pub type FixedVertexHandle = FixedHandleImpl<VertexTag>;

/// Fixed handle to a triangle.
///
/// The triangle a handle refers to may be rewritten by later splits and flips. Code that keeps
/// handles across edits must compare the triangle's vertices to detect this.
pub type FixedTriangleHandle = FixedHandleImpl<TriangleTag>;

/// Fixed handle to a constraint sub-segment.
pub type FixedSubsegmentHandle = FixedHandleImpl<SubsegmentTag>;

/// A triangle together with one of its three edges.
///
/// Edge `i` of a triangle is the edge opposite of its `i`-th vertex. It starts at the *origin*
/// `vertices[(i + 1) % 3]`, ends at the *destination* `vertices[(i + 2) % 3]` and has the
/// triangle's *apex* `vertices[i]` on its left side.
///
/// This is a plain value. All traversal happens through
/// [OrientedTriangleHandle](crate::handles::OrientedTriangleHandle).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct OrientedTriangle {
    triangle: FixedTriangleHandle,
    edge: u8,
}

impl std::fmt::Debug for OrientedTriangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrientedTriangle")
            .field("triangle", &self.triangle.index())
            .field("edge", &self.edge)
            .finish()
    }
}

impl OrientedTriangle {
    #[inline]
    pub(crate) fn new(triangle: FixedTriangleHandle, edge: usize) -> Self {
        debug_assert!(edge < 3);
        Self {
            triangle,
            edge: edge as u8,
        }
    }

    /// The triangle this handle refers to.
    #[inline]
    pub fn triangle(&self) -> FixedTriangleHandle {
        self.triangle
    }

    /// The edge slot (0, 1 or 2) within the triangle.
    #[inline]
    pub fn edge(&self) -> usize {
        self.edge as usize
    }

    /// The next edge of the same triangle in counterclockwise order.
    ///
    /// Its origin is the destination of this edge.
    #[inline]
    pub fn lnext(self) -> Self {
        Self::new(self.triangle, (self.edge() + 1) % 3)
    }

    /// The previous edge of the same triangle in counterclockwise order.
    ///
    /// Its destination is the origin of this edge.
    #[inline]
    pub fn lprev(self) -> Self {
        Self::new(self.triangle, (self.edge() + 2) % 3)
    }

    #[inline]
    pub(crate) fn org_slot(&self) -> usize {
        (self.edge() + 1) % 3
    }

    #[inline]
    pub(crate) fn dest_slot(&self) -> usize {
        (self.edge() + 2) % 3
    }
}

/// Internal type definition that is only exposed for documentation purposes.
///
/// Use the type aliases [VertexHandle], [TriangleHandle] and [SubsegmentHandle] instead.
pub struct DynamicHandleImpl<'a, S, Type> {
    pub(super) store: &'a TriangleStore<S>,
    pub(super) handle: FixedHandleImpl<Type>,
}

impl<'a, S, Type: Default> DynamicHandleImpl<'a, S, Type> {
    #[inline]
    pub(crate) fn new(store: &'a TriangleStore<S>, handle: FixedHandleImpl<Type>) -> Self {
        Self { store, handle }
    }
}

/// Handle to a vertex of a mesh.
pub type VertexHandle<'a, S> = DynamicHandleImpl<'a, S, VertexTag>;

/// Handle to a triangle of a mesh.
pub type TriangleHandle<'a, S> = DynamicHandleImpl<'a, S, TriangleTag>;

/// Handle to a constraint sub-segment of a mesh.
pub type SubsegmentHandle<'a, S> = DynamicHandleImpl<'a, S, SubsegmentTag>;

/// An [OrientedTriangle] bound to the store it belongs to.
pub struct OrientedTriangleHandle<'a, S> {
    pub(super) store: &'a TriangleStore<S>,
    pub(super) handle: OrientedTriangle,
}

impl<'a, S> OrientedTriangleHandle<'a, S> {
    #[inline]
    pub(crate) fn new(store: &'a TriangleStore<S>, handle: OrientedTriangle) -> Self {
        Self { store, handle }
    }
}
