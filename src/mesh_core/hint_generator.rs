use std::sync::atomic::{AtomicUsize, Ordering};

use super::handles::FixedTriangleHandle;

/// Remembers the triangle of the last lookup as starting point for the next walk.
///
/// Queries issued by meshing are spatially coherent (vertices are inserted next to recently
/// edited triangles), which bounds most walks by a small constant.
///
/// The hint is stored atomically so that read-only lookups through `&Mesh` can update it.
#[derive(Default, Debug)]
pub struct LastUsedTriangleHintGenerator {
    index: AtomicUsize,
}

impl Clone for LastUsedTriangleHintGenerator {
    fn clone(&self) -> Self {
        Self {
            index: AtomicUsize::new(self.index.load(Ordering::Relaxed)),
        }
    }
}

impl LastUsedTriangleHintGenerator {
    /// Returns a triangle that should be close to the next query. The handle may be invalid.
    pub fn get_hint(&self) -> FixedTriangleHandle {
        FixedTriangleHandle::new(self.index.load(Ordering::Relaxed))
    }

    pub fn notify_triangle_lookup(&self, triangle: FixedTriangleHandle) {
        self.index.store(triangle.index(), Ordering::Relaxed);
    }
}
