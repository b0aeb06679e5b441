use smallvec::SmallVec;

use super::handles::*;
use super::store::{SubsegmentEntry, TriangleEntry, TriangleStore};

/// Links two edges as neighbors of each other.
///
/// Both edges must connect the same two vertices in opposite directions once all triangles of
/// an edit have been written. [TriangleStore::write_triangle] bonds every neighbor it is given.
pub fn bond<S: Copy>(store: &mut TriangleStore<S>, e1: OrientedTriangle, e2: OrientedTriangle) {
    store.triangle_entry_mut(e1.triangle()).neighbors[e1.edge()] = Some(e2);
    store.triangle_entry_mut(e2.triangle()).neighbors[e2.edge()] = Some(e1);
}

/// Creates the first triangle of an empty store.
///
/// The vertices must be ordered counterclockwise.
pub fn create_bootstrap_triangle<S: Copy>(
    store: &mut TriangleStore<S>,
    vertices: [FixedVertexHandle; 3],
) -> FixedTriangleHandle {
    assert_eq!(store.num_triangles(), 0);
    let handle = store.allocate_triangle();
    store.write_triangle(handle, TriangleEntry::new(vertices));
    handle
}

/// Reads the link data of one edge slot: its neighbor and its sub-segment.
fn edge_data<S: Copy>(
    store: &TriangleStore<S>,
    edge: OrientedTriangle,
) -> (Option<OrientedTriangle>, Option<FixedSubsegmentHandle>) {
    (store.sym(edge), store.subsegment_at(edge))
}

fn set_edge_data(
    entry: &mut TriangleEntry,
    slot: usize,
    (neighbor, subsegment): (Option<OrientedTriangle>, Option<FixedSubsegmentHandle>),
) {
    entry.neighbors[slot] = neighbor;
    entry.subsegments[slot] = subsegment;
}

/// Splits a triangle into three by connecting its vertices with a new vertex in its interior.
///
/// Returns the three edges opposite of the new vertex. These are the edges of the former
/// triangle; edge `i` of the result is stored in slot 0 of its triangle.
pub fn split_triangle<S: Copy>(
    store: &mut TriangleStore<S>,
    triangle: FixedTriangleHandle,
    new_vertex: FixedVertexHandle,
) -> [OrientedTriangle; 3] {
    let parent = *store.triangle_entry(triangle);
    let [v0, v1, v2] = parent.vertices;
    let handles = [triangle, store.allocate_triangle(), store.allocate_triangle()];

    let outer = [0, 1, 2].map(|slot| edge_data(store, OrientedTriangle::new(triangle, slot)));
    let rings = [[v1, v2], [v2, v0], [v0, v1]];

    for index in 0..3 {
        let [from, to] = rings[index];
        let mut entry = TriangleEntry::derived_from(&parent, [new_vertex, from, to]);
        set_edge_data(&mut entry, 0, outer[index]);
        entry.neighbors[1] = Some(OrientedTriangle::new(handles[(index + 1) % 3], 2));
        entry.neighbors[2] = Some(OrientedTriangle::new(handles[(index + 2) % 3], 1));
        store.write_triangle(handles[index], entry);
    }

    handles.map(|handle| OrientedTriangle::new(handle, 0))
}

/// Flips the diagonal of the quadrilateral formed by `edge`'s triangle and its neighbor.
///
/// For an edge `a -> b` with apex `c` and the neighbor's apex `d`, the edge is replaced by
/// `c -> d`. Returns the two edges opposite of `c` after the flip: `a -> d` and `d -> b`.
///
/// # Panics
///
/// Panics if the edge has no neighbor or is constrained by a sub-segment.
pub fn flip<S: Copy>(
    store: &mut TriangleStore<S>,
    edge: OrientedTriangle,
) -> [OrientedTriangle; 2] {
    assert!(
        store.subsegment_at(edge).is_none(),
        "Cannot flip a constraint edge"
    );
    let sym = store.sym(edge).expect("Cannot flip an edge without neighbor");

    let a = store.org(edge);
    let b = store.dest(edge);
    let c = store.apex(edge);
    let d = store.apex(sym);

    let b_to_c = edge_data(store, edge.lnext());
    let c_to_a = edge_data(store, edge.lprev());
    let a_to_d = edge_data(store, sym.lnext());
    let d_to_b = edge_data(store, sym.lprev());

    let first = edge.triangle();
    let second = sym.triangle();

    let mut first_entry = TriangleEntry::derived_from(store.triangle_entry(first), [c, a, d]);
    set_edge_data(&mut first_entry, 0, a_to_d);
    first_entry.neighbors[1] = Some(OrientedTriangle::new(second, 1));
    set_edge_data(&mut first_entry, 2, c_to_a);

    let mut second_entry = TriangleEntry::derived_from(store.triangle_entry(second), [d, b, c]);
    set_edge_data(&mut second_entry, 0, b_to_c);
    second_entry.neighbors[1] = Some(OrientedTriangle::new(first, 1));
    set_edge_data(&mut second_entry, 2, d_to_b);

    store.write_triangle(first, first_entry);
    store.write_triangle(second, second_entry);

    [
        OrientedTriangle::new(first, 0),
        OrientedTriangle::new(second, 2),
    ]
}

/// Result of [split_edge].
#[derive(Clone, Debug)]
pub struct EdgeSplit {
    /// All edges opposite of the new vertex.
    pub opposite_edges: SmallVec<[OrientedTriangle; 4]>,
    /// The sub-segment halves if the split edge was constrained.
    ///
    /// The first half contains the origin of the split edge, the second half its destination.
    pub subsegments: Option<[FixedSubsegmentHandle; 2]>,
}

/// Splits an edge by inserting a vertex on it.
///
/// Each adjacent triangle is split into two. At the arena boundary only one triangle exists and
/// the edge is split into two triangles in total. If the edge carries a sub-segment, the
/// sub-segment is split as well.
pub fn split_edge<S: Copy>(
    store: &mut TriangleStore<S>,
    edge: OrientedTriangle,
    new_vertex: FixedVertexHandle,
) -> EdgeSplit {
    let a = store.org(edge);
    let b = store.dest(edge);
    let c = store.apex(edge);
    let sym = store.sym(edge);

    let subsegments = store
        .subsegment_at(edge)
        .map(|subsegment| split_subsegment_entry(store, subsegment, a, new_vertex));
    let (sub_a, sub_b) = match subsegments {
        Some([first, second]) => (Some(first), Some(second)),
        None => (None, None),
    };

    let b_to_c = edge_data(store, edge.lnext());
    let c_to_a = edge_data(store, edge.lprev());

    let a1 = edge.triangle();
    let a2 = store.allocate_triangle();
    let a_parent = *store.triangle_entry(a1);

    let mut opposite_edges = SmallVec::new();

    let (b1, b2) = match sym {
        Some(sym) => (Some(sym.triangle()), Some(store.allocate_triangle())),
        None => (None, None),
    };

    // [c, a, p]: a -> p, p -> c, c -> a
    let mut a1_entry = TriangleEntry::derived_from(&a_parent, [c, a, new_vertex]);
    a1_entry.neighbors[0] = b2.map(|b2| OrientedTriangle::new(b2, 0));
    a1_entry.subsegments[0] = sub_a;
    a1_entry.neighbors[1] = Some(OrientedTriangle::new(a2, 2));
    set_edge_data(&mut a1_entry, 2, c_to_a);

    // [c, p, b]: p -> b, b -> c, c -> p
    let mut a2_entry = TriangleEntry::derived_from(&a_parent, [c, new_vertex, b]);
    a2_entry.neighbors[0] = b1.map(|b1| OrientedTriangle::new(b1, 0));
    a2_entry.subsegments[0] = sub_b;
    set_edge_data(&mut a2_entry, 1, b_to_c);
    a2_entry.neighbors[2] = Some(OrientedTriangle::new(a1, 1));

    opposite_edges.push(OrientedTriangle::new(a1, 2));
    opposite_edges.push(OrientedTriangle::new(a2, 1));

    if let (Some(sym), Some(b1), Some(b2)) = (sym, b1, b2) {
        let d = store.apex(sym);
        let a_to_d = edge_data(store, sym.lnext());
        let d_to_b = edge_data(store, sym.lprev());
        let b_parent = *store.triangle_entry(b1);

        // [d, b, p]: b -> p, p -> d, d -> b
        let mut b1_entry = TriangleEntry::derived_from(&b_parent, [d, b, new_vertex]);
        b1_entry.neighbors[0] = Some(OrientedTriangle::new(a2, 0));
        b1_entry.subsegments[0] = sub_b;
        b1_entry.neighbors[1] = Some(OrientedTriangle::new(b2, 2));
        set_edge_data(&mut b1_entry, 2, d_to_b);

        // [d, p, a]: p -> a, a -> d, d -> p
        let mut b2_entry = TriangleEntry::derived_from(&b_parent, [d, new_vertex, a]);
        b2_entry.neighbors[0] = Some(OrientedTriangle::new(a1, 0));
        b2_entry.subsegments[0] = sub_a;
        set_edge_data(&mut b2_entry, 1, a_to_d);
        b2_entry.neighbors[2] = Some(OrientedTriangle::new(b1, 1));

        store.write_triangle(b1, b1_entry);
        store.write_triangle(b2, b2_entry);

        opposite_edges.push(OrientedTriangle::new(b1, 2));
        opposite_edges.push(OrientedTriangle::new(b2, 1));
    }

    store.write_triangle(a1, a1_entry);
    store.write_triangle(a2, a2_entry);

    EdgeSplit {
        opposite_edges,
        subsegments,
    }
}

/// Splits the sub-segment lying on the edge `subsegment` at `new_vertex`.
///
/// Equivalent to calling [split_edge] with one of the sub-segment's sides.
pub fn split_subsegment<S: Copy>(
    store: &mut TriangleStore<S>,
    subsegment: FixedSubsegmentHandle,
    new_vertex: FixedVertexHandle,
) -> EdgeSplit {
    let sides = store.subsegment_entry(subsegment).sides;
    let edge = sides[0]
        .or(sides[1])
        .expect("Sub-segment is not part of the triangulation");
    split_edge(store, edge, new_vertex)
}

/// Cuts a sub-segment entry in two. The existing entry keeps the half touching `keep`.
///
/// Side links are left for [TriangleStore::write_triangle] to fill in.
fn split_subsegment_entry<S: Copy>(
    store: &mut TriangleStore<S>,
    subsegment: FixedSubsegmentHandle,
    keep: FixedVertexHandle,
    new_vertex: FixedVertexHandle,
) -> [FixedSubsegmentHandle; 2] {
    let old = *store.subsegment_entry(subsegment);
    let mut kept = old;
    let mut other = old;
    kept.sides = [None; 2];
    other.sides = [None; 2];
    if old.vertices[0] == keep {
        kept.vertices = [keep, new_vertex];
        other.vertices = [new_vertex, old.vertices[1]];
    } else {
        kept.vertices = [new_vertex, keep];
        other.vertices = [old.vertices[0], new_vertex];
    }
    store.subsegments[subsegment.index()] = kept;
    let other = store.push_subsegment(other);
    [subsegment, other]
}

/// Creates a sub-segment on an existing edge.
///
/// Both triangles adjacent to the edge are linked to the new sub-segment.
pub fn insert_subsegment<S: Copy>(
    store: &mut TriangleStore<S>,
    edge: OrientedTriangle,
    segment: [FixedVertexHandle; 2],
    segment_index: usize,
) -> FixedSubsegmentHandle {
    let sym = store.sym(edge);
    let handle = store.push_subsegment(SubsegmentEntry {
        vertices: [store.org(edge), store.dest(edge)],
        segment,
        segment_index,
        sides: [Some(edge), sym],
    });
    store.triangle_entry_mut(edge.triangle()).subsegments[edge.edge()] = Some(handle);
    if let Some(sym) = sym {
        store.triangle_entry_mut(sym.triangle()).subsegments[sym.edge()] = Some(handle);
    }
    handle
}
