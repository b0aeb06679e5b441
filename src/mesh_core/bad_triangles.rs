use std::collections::VecDeque;

use super::handles::{FixedTriangleHandle, FixedVertexHandle};
use super::store::TriangleStore;

const NUM_BUCKETS: usize = 64;

/// A triangle that was found to violate the quality bounds.
///
/// The record is a snapshot: if the triangle slot is rewritten after the record was created, its
/// vertices no longer match and the record is considered stale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BadTriangle {
    pub triangle: FixedTriangleHandle,
    pub vertices: [FixedVertexHandle; 3],
    /// Squared cosine of the smallest angle at the time the record was created.
    pub key: f64,
}

impl BadTriangle {
    pub fn is_live<S: Copy>(&self, store: &TriangleStore<S>) -> bool {
        if self.triangle.index() >= store.num_triangles() {
            return false;
        }
        let current = store.triangle_entry(self.triangle).vertices;
        self.vertices.iter().all(|vertex| current.contains(vertex))
    }
}

/// Priority queue of bad triangles, ordered by their quality key.
///
/// Keys are quantized into buckets by the sine of the smallest angle, which resolves skinny
/// triangles finely. Entries of the same bucket are served in insertion order. Both `push` and
/// `pop_worst` run in amortized constant time.
#[derive(Clone, Debug)]
pub struct BadTriangleQueue {
    buckets: Vec<VecDeque<BadTriangle>>,
    /// No bucket above this index contains entries.
    highest: usize,
    len: usize,
}

impl Default for BadTriangleQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BadTriangleQueue {
    pub fn new() -> Self {
        Self {
            buckets: vec![VecDeque::new(); NUM_BUCKETS],
            highest: 0,
            len: 0,
        }
    }

    fn bucket(key: f64) -> usize {
        // sin of the smallest angle, 0 for degenerate triangles
        let sin = (1.0 - key.clamp(0.0, 1.0)).sqrt();
        let scaled = (sin * NUM_BUCKETS as f64) as usize;
        NUM_BUCKETS - 1 - scaled.min(NUM_BUCKETS - 1)
    }

    pub fn push(&mut self, entry: BadTriangle) {
        let bucket = Self::bucket(entry.key);
        self.buckets[bucket].push_back(entry);
        self.highest = self.highest.max(bucket);
        self.len += 1;
    }

    /// Removes and returns the worst live entry. Stale entries encountered on the way are
    /// dropped.
    pub fn pop_worst<S: Copy>(&mut self, store: &TriangleStore<S>) -> Option<BadTriangle> {
        loop {
            let entry = self.buckets[self.highest].pop_front();
            match entry {
                Some(entry) => {
                    self.len -= 1;
                    if entry.is_live(store) {
                        return Some(entry);
                    }
                }
                None if self.highest == 0 => return None,
                None => self.highest -= 1,
            }
        }
    }

    /// Number of entries, including stale ones.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
