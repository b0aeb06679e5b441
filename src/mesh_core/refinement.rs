use std::collections::VecDeque;

use hashbrown::HashSet;
use log::{debug, trace, warn};
use smallvec::SmallVec;

use super::bad_triangles::{BadTriangle, BadTriangleQueue};
use super::handles::*;
use super::insertion::{InsertionOutcome, PointLocation, WalkResult};
use super::math::{self, contained_in_circumference, is_encroaching_edge, nearest_power_of_two};
use super::store::{TriangleStore, VertexKind};
use super::store_operations::split_subsegment;
use crate::{Diagnostic, Mesh, MeshNum, Point2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Contains details about the outcome of a refinement procedure.
///
/// *See [Mesh::refine]*
#[derive(Clone, Debug, PartialEq)]
pub struct RefinementResult<S> {
    /// Set to `true` if every quality bound is met.
    ///
    /// This will be `false` if the refinement ran out of Steiner points
    /// (see [RefinementParameters::with_steiner_limit]). Consider a lower angle limit in this
    /// case. It is also `false` if a bad triangle had to be left alone because no valid Steiner
    /// point could be computed for it, see [Diagnostic::NumericalDegeneracy]. The mesh is a
    /// valid constrained Delaunay triangulation either way.
    pub refinement_complete: bool,

    /// Number of Steiner points inserted by this refinement, including segment splits.
    pub steiner_points_inserted: usize,

    /// Number of Steiner points that were inserted on constraint segments.
    pub segment_splits: usize,

    /// Non fatal conditions encountered during refinement.
    pub diagnostics: Vec<Diagnostic<S>>,
}

/// Specifies the minimum allowed angle that should be kept after a refinement procedure.
///
/// *See [RefinementParameters::with_angle_limit]*
#[derive(Copy, Clone, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct AngleLimit {
    min_angle_rad: f64,
}

impl AngleLimit {
    /// Create a new angle limit from an angle given in degrees.
    ///
    /// Refinement is guaranteed to terminate for angle limits up to about 20.7°. Larger limits
    /// usually work in practice but may exhaust the Steiner point budget.
    ///
    /// An angle of 0 degrees will disable refining due to small angles.
    pub fn from_deg(degree: f64) -> Self {
        Self::from_rad(degree.to_radians())
    }

    /// Create a new angle limit from an angle given in radians.
    pub fn from_rad(rad: f64) -> Self {
        Self {
            min_angle_rad: rad.max(0.0),
        }
    }

    /// Returns the angle limit in radians.
    pub fn rad(&self) -> f64 {
        self.min_angle_rad
    }

    /// Returns the angle limit in degrees.
    pub fn deg(&self) -> f64 {
        self.min_angle_rad.to_degrees()
    }

    /// Returns the largest quality key a triangle may have without being refined.
    pub fn quality_key_limit(&self) -> f64 {
        math::quality_key_limit(self.min_angle_rad)
    }
}

impl std::fmt::Debug for AngleLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AngleLimit")
            .field("angle limit (deg)", &self.deg())
            .finish()
    }
}

impl Default for AngleLimit {
    fn default() -> Self {
        Self::from_deg(20.0)
    }
}

/// Limits the number of Steiner points inserted by a single refinement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub enum SteinerLimit {
    /// At most this many Steiner points.
    Total(usize),
    /// At most this many Steiner points per input vertex of the mesh.
    PerInputVertex(usize),
}

impl SteinerLimit {
    fn resolve(&self, num_input_vertices: usize) -> usize {
        match *self {
            SteinerLimit::Total(limit) => limit,
            SteinerLimit::PerInputVertex(factor) => factor.saturating_mul(num_input_vertices),
        }
    }
}

impl Default for SteinerLimit {
    fn default() -> Self {
        SteinerLimit::Total(1_000_000)
    }
}

#[derive(Debug, PartialEq, PartialOrd, Clone, Copy, Hash)]
enum RefinementHint {
    Ignore,
    ShouldRefine,
    MustRefine,
}

/// Controls how a refinement is performed.
///
/// The following parameters will be used by `Self::default` and [Self::new]:
/// * `angle_limit`: 20 degrees
/// * `min_required_area`: disabled - no lower area limit is used
/// * `max_allowed_area`: disabled - only region area bounds are used
/// * `steiner_limit`: at most 1 000 000 Steiner points
///
/// # Example
///
/// ```
/// use terramesh::{AngleLimit, RefinementParameters, SteinerLimit};
///
/// let parameters = RefinementParameters::<f64>::new()
///     .with_angle_limit(AngleLimit::from_deg(25.0))
///     .with_max_allowed_area(4.0)
///     .with_min_required_area(0.0001)
///     .with_steiner_limit(SteinerLimit::PerInputVertex(50));
/// ```
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct RefinementParameters<S> {
    angle_limit: AngleLimit,
    min_area: Option<S>,
    max_area: Option<S>,
    steiner_limit: SteinerLimit,
}

impl<S: MeshNum> Default for RefinementParameters<S> {
    fn default() -> Self {
        Self {
            angle_limit: AngleLimit::default(),
            min_area: None,
            max_area: None,
            steiner_limit: SteinerLimit::default(),
        }
    }
}

impl<S: MeshNum> RefinementParameters<S> {
    /// Creates a new set of `RefinementParameters`.
    ///
    /// Refer to the [struct definition](Self) for more information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specifies the smallest allowed inner angle in a refined mesh.
    ///
    /// Angles between two input segments that are smaller than this limit cannot be improved and
    /// are left alone.
    #[must_use]
    pub fn with_angle_limit(mut self, angle_limit: AngleLimit) -> Self {
        self.angle_limit = angle_limit;
        self
    }

    /// Specifies a lower bound for a triangle's area.
    ///
    /// Triangles below this bound are not refined because of small angles. This can prevent an
    /// exhaustion of the Steiner point budget around tiny input features. The bound never
    /// overrides an area limit.
    #[must_use]
    pub fn with_min_required_area(mut self, min_area: S) -> Self {
        self.min_area = Some(min_area);
        self
    }

    /// Specifies an upper bound for triangle areas.
    ///
    /// Regions with their own area bound use that bound instead.
    #[must_use]
    pub fn with_max_allowed_area(mut self, max_area: S) -> Self {
        self.max_area = Some(max_area);
        self
    }

    /// Specifies how many Steiner points a single refinement may insert.
    ///
    /// Use [RefinementResult::refinement_complete] to check if the refinement has completed
    /// before the limit was reached.
    #[must_use]
    pub fn with_steiner_limit(mut self, steiner_limit: SteinerLimit) -> Self {
        self.steiner_limit = steiner_limit;
        self
    }

    /// Returns the minimum angle bound.
    pub fn angle_limit(&self) -> AngleLimit {
        self.angle_limit
    }

    /// Returns the global upper bound for triangle areas, if any.
    pub fn max_allowed_area(&self) -> Option<S> {
        self.max_area
    }

    /// Returns the area below which small angles are tolerated, if any.
    pub fn min_required_area(&self) -> Option<S> {
        self.min_area
    }

    /// Returns the Steiner point budget.
    pub fn steiner_limit(&self) -> SteinerLimit {
        self.steiner_limit
    }
}

impl<S: MeshNum> Mesh<S> {
    /// Refines the mesh by inserting Steiner points until every triangle of the domain meets
    /// the given quality bounds.
    ///
    /// Bad triangles are split at their circumcenter, worst first. A circumcenter that would
    /// encroach upon a constraint sub-segment (lie inside its diametral circle) is rejected and
    /// the sub-segment is split instead. Input and segment vertices are never moved or removed,
    /// every constraint segment stays represented by a chain of edges.
    ///
    /// Refining an already refined mesh with the same parameters inserts nothing.
    ///
    /// # Example
    /// ```
    /// use terramesh::{AngleLimit, PlanarGraph, Point2, RefinementParameters};
    ///
    /// # fn main() -> Result<(), terramesh::MeshError> {
    /// let mut graph = PlanarGraph::new();
    /// graph.add_polygon([
    ///     Point2::new(0.0, 0.0),
    ///     Point2::new(10.0, 0.0),
    ///     Point2::new(10.0, 1.0),
    ///     Point2::new(0.0, 1.0),
    /// ])?;
    ///
    /// let mut mesh = graph.triangulate()?;
    /// let result = mesh.refine(
    ///     &RefinementParameters::new()
    ///         .with_angle_limit(AngleLimit::from_deg(20.0))
    ///         .with_max_allowed_area(0.5),
    /// );
    /// assert!(result.refinement_complete);
    /// assert!(mesh.triangles().all(|triangle| triangle.area() <= 0.5));
    /// # Ok(())
    /// # }
    /// ```
    pub fn refine(&mut self, parameters: &RefinementParameters<S>) -> RefinementResult<S> {
        let budget = parameters
            .steiner_limit
            .resolve(self.num_input_vertices());
        let refiner = Refiner::new(&mut self.store, parameters, budget);
        let result = refiner.run();
        self.diagnostics.extend(result.diagnostics.iter().copied());
        if let Some(triangle) = self.store.vertices.last().and_then(|vertex| vertex.triangle) {
            self.hint.notify_triangle_lookup(triangle);
        }
        result
    }
}

struct Refiner<'a, S: MeshNum> {
    store: &'a mut TriangleStore<S>,
    parameters: &'a RefinementParameters<S>,
    key_limit: f64,
    queue: BadTriangleQueue,
    encroached: VecDeque<FixedSubsegmentHandle>,
    budget: usize,
    inserted: usize,
    segment_splits: usize,
    /// Bad triangles dropped without being split.
    skipped: usize,
    diagnostics: Vec<Diagnostic<S>>,
}

impl<'a, S: MeshNum> Refiner<'a, S> {
    fn new(
        store: &'a mut TriangleStore<S>,
        parameters: &'a RefinementParameters<S>,
        budget: usize,
    ) -> Self {
        Self {
            store,
            parameters,
            key_limit: parameters.angle_limit.quality_key_limit(),
            queue: BadTriangleQueue::new(),
            encroached: VecDeque::new(),
            budget,
            inserted: 0,
            segment_splits: 0,
            skipped: 0,
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> RefinementResult<S> {
        self.encroached
            .extend((0..self.store.num_subsegments()).map(FixedSubsegmentHandle::new));
        for index in 0..self.store.num_triangles() {
            self.assess(FixedTriangleHandle::new(index));
        }
        debug!(
            "Refining {} sub-segments and {} bad triangles, angle limit {:?}",
            self.encroached.len(),
            self.queue.len(),
            self.parameters.angle_limit
        );

        let finished = self.process();
        self.finish(finished)
    }

    fn finish(mut self, finished: bool) -> RefinementResult<S> {
        if finished && self.skipped > 0 {
            warn!(
                "{} bad triangles could not be split, quality bounds are not met",
                self.skipped
            );
        }
        if !finished || (self.skipped > 0 && self.budget_exhausted()) {
            warn!(
                "Steiner point budget exhausted after {} insertions, quality bounds are not met",
                self.inserted
            );
            self.diagnostics.push(Diagnostic::UnboundedRefinement {
                steiner_points: self.inserted,
            });
        }
        debug!(
            "Refinement inserted {} Steiner points ({} on segments)",
            self.inserted, self.segment_splits
        );

        RefinementResult {
            refinement_complete: finished && self.skipped == 0,
            steiner_points_inserted: self.inserted,
            segment_splits: self.segment_splits,
            diagnostics: self.diagnostics,
        }
    }

    /// Returns `false` if the budget ran out before all work was done.
    fn process(&mut self) -> bool {
        loop {
            while let Some(subsegment) = self.encroached.pop_front() {
                if !self.is_encroached(subsegment) {
                    continue;
                }
                if self.budget_exhausted() {
                    return false;
                }
                self.split_subsegment(subsegment);
            }

            let Some(bad) = self.queue.pop_worst(self.store) else {
                return true;
            };
            if self.refinement_hint(bad.triangle) == RefinementHint::Ignore {
                continue;
            }
            if self.budget_exhausted() {
                return false;
            }
            self.split_triangle(bad);
        }
    }

    fn budget_exhausted(&self) -> bool {
        self.inserted >= self.budget
    }

    fn refinement_hint(&self, triangle: FixedTriangleHandle) -> RefinementHint {
        let entry = self.store.triangle_entry(triangle);
        if entry.excluded {
            return RefinementHint::Ignore;
        }

        let positions = self.store.triangle_positions(triangle);
        let area = math::triangle_area(positions[0], positions[1], positions[2]);

        let max_area = entry
            .region
            .and_then(|region| self.store.regions[region as usize].max_area)
            .or(self.parameters.max_area);
        if let Some(max_area) = max_area {
            if area > max_area {
                return RefinementHint::MustRefine;
            }
        }

        if let Some(min_area) = self.parameters.min_area {
            if area < min_area {
                return RefinementHint::Ignore;
            }
        }

        let key: f64 = math::quality_key(positions).into();
        if key <= self.key_limit {
            return RefinementHint::Ignore;
        }

        if self.is_fixed_angle(triangle, positions) {
            // The angle lies between two input segments and the segments have already been
            // split. Splitting further cannot improve it.
            return RefinementHint::Ignore;
        }
        RefinementHint::ShouldRefine
    }

    fn is_fixed_angle(&self, triangle: FixedTriangleHandle, positions: [Point2<S>; 3]) -> bool {
        let (apex, _) = math::shortest_edge(positions);
        let entry = self.store.triangle_entry(triangle);
        let adjacent_constrained = [(apex + 1) % 3, (apex + 2) % 3]
            .iter()
            .all(|slot| entry.subsegments[*slot].is_some());
        let shortest_edge_split = [(apex + 1) % 3, (apex + 2) % 3]
            .iter()
            .any(|slot| !self.is_input_vertex(entry.vertices[*slot]));
        adjacent_constrained && shortest_edge_split
    }

    fn is_input_vertex(&self, vertex: FixedVertexHandle) -> bool {
        self.store.vertex_entry(vertex).kind == VertexKind::Input
    }

    fn assess(&mut self, triangle: FixedTriangleHandle) {
        if self.refinement_hint(triangle) == RefinementHint::Ignore {
            return;
        }
        let positions = self.store.triangle_positions(triangle);
        self.queue.push(BadTriangle {
            triangle,
            vertices: self.store.triangle_entry(triangle).vertices,
            key: math::quality_key(positions).into(),
        });
    }

    /// A sub-segment is encroached if the apex of an adjacent domain triangle lies inside its
    /// diametral circle.
    fn is_encroached(&self, subsegment: FixedSubsegmentHandle) -> bool {
        let entry = self.store.subsegment_entry(subsegment);
        let [from, to] = entry.vertices.map(|vertex| self.store.position(vertex));
        entry.sides.iter().flatten().any(|side| {
            !self.store.triangle_entry(side.triangle()).excluded
                && is_encroaching_edge(from, to, self.store.position(self.store.apex(*side)))
        })
    }

    fn degeneracy(&mut self, position: Point2<S>) {
        trace!("Skipping numerically degenerate Steiner point {:?}", position);
        self.diagnostics
            .push(Diagnostic::NumericalDegeneracy { position });
    }

    fn split_triangle(&mut self, bad: BadTriangle) {
        if !self.try_split_triangle(bad) {
            self.skipped += 1;
        }
    }

    /// Returns `false` if the triangle was dropped from the queue while still being bad.
    fn try_split_triangle(&mut self, bad: BadTriangle) -> bool {
        let [v0, v1, v2] = self.store.triangle_positions(bad.triangle);
        let center = math::circumcenter(v0, v1, v2);
        if math::validate_point(center).is_err() {
            self.degeneracy(center);
            return false;
        }

        let location = match self.store.walk(center, bad.triangle, true) {
            Some(WalkResult::Found(location)) => location,
            Some(WalkResult::Blocked(edge)) => {
                // The circumcenter lies behind a constraint segment
                let subsegment = self
                    .store
                    .subsegment_at(edge)
                    .expect("Blocked by an unconstrained edge. This is a bug.");
                if !self.split_subsegment(subsegment) {
                    return false;
                }
                self.assess(bad.triangle);
                return true;
            }
            None => {
                self.degeneracy(center);
                return false;
            }
        };

        let Some(encroached) = self.encroached_by(center, location) else {
            self.degeneracy(center);
            return false;
        };

        if !encroached.is_empty() {
            let mut all_split = true;
            for subsegment in encroached {
                if self.budget_exhausted() {
                    all_split = false;
                    break;
                }
                all_split &= self.split_subsegment(subsegment);
            }
            if all_split {
                self.assess(bad.triangle);
            }
            return all_split;
        }

        match self
            .store
            .insert_at_location(location, center, VertexKind::Free)
        {
            InsertionOutcome::Inserted(vertex) => {
                self.inserted += 1;
                self.enqueue_around(vertex);
                true
            }
            InsertionOutcome::Duplicate(_) | InsertionOutcome::Outside => {
                self.degeneracy(center);
                false
            }
        }
    }

    /// Returns all sub-segments on the boundary of the cavity of `position` that `position`
    /// encroaches upon.
    ///
    /// The cavity consists of all triangles whose circumcircle contains `position` and that are
    /// reachable from it without crossing a sub-segment. Returns `None` for positions that cannot
    /// be inserted.
    fn encroached_by(
        &self,
        position: Point2<S>,
        location: PointLocation,
    ) -> Option<SmallVec<[FixedSubsegmentHandle; 4]>> {
        let mut result = SmallVec::new();
        let mut todo: SmallVec<[FixedTriangleHandle; 16]> = SmallVec::new();

        match location {
            PointLocation::Inside(triangle) => todo.push(triangle),
            PointLocation::OnEdge(edge) => {
                if let Some(subsegment) = self.store.subsegment_at(edge) {
                    result.push(subsegment);
                    return Some(result);
                }
                todo.push(edge.triangle());
                todo.extend(self.store.sym(edge).map(|sym| sym.triangle()));
            }
            PointLocation::OnVertex(_) | PointLocation::Outside(_) => return None,
        }

        if todo
            .iter()
            .any(|triangle| self.store.triangle_entry(*triangle).excluded)
        {
            return None;
        }

        let mut visited: HashSet<FixedTriangleHandle> = todo.iter().copied().collect();
        while let Some(triangle) = todo.pop() {
            for slot in 0..3 {
                let edge = OrientedTriangle::new(triangle, slot);
                let from = self.store.position(self.store.org(edge));
                let to = self.store.position(self.store.dest(edge));

                if let Some(subsegment) = self.store.subsegment_at(edge) {
                    if is_encroaching_edge(from, to, position) && !result.contains(&subsegment) {
                        result.push(subsegment);
                    }
                    continue;
                }

                let Some(sym) = self.store.sym(edge) else {
                    continue;
                };
                let neighbor = sym.triangle();
                if visited.contains(&neighbor) {
                    continue;
                }
                let opposite = self.store.position(self.store.apex(sym));
                if contained_in_circumference(to, from, opposite, position) {
                    visited.insert(neighbor);
                    todo.push(neighbor);
                }
            }
        }
        Some(result)
    }

    /// Splits a sub-segment. Returns `false` if no valid split point exists.
    fn split_subsegment(&mut self, subsegment: FixedSubsegmentHandle) -> bool {
        let entry = *self.store.subsegment_entry(subsegment);
        let [v0, v1] = entry.vertices;
        let [p0, p1] = entry.vertices.map(|vertex| self.store.position(vertex));

        let position = match (self.is_input_vertex(v0), self.is_input_vertex(v1)) {
            (true, false) => concentric_shell_split(p0, p1),
            (false, true) => concentric_shell_split(p1, p0),
            _ => p0.midpoint(p1),
        };

        if !self.is_valid_split_position(subsegment, position) {
            self.degeneracy(position);
            return false;
        }

        let vertex = self.store.push_vertex(position, VertexKind::Segment);
        let split = split_subsegment(self.store, subsegment, vertex);
        self.store.legalize_vertex(vertex, split.opposite_edges);

        self.inserted += 1;
        self.segment_splits += 1;
        if let Some(halves) = split.subsegments {
            self.encroached.extend(halves);
        }
        self.enqueue_around(vertex);
        true
    }

    /// The split position must differ from both endpoints and keep every adjacent triangle
    /// counterclockwise.
    fn is_valid_split_position(
        &self,
        subsegment: FixedSubsegmentHandle,
        position: Point2<S>,
    ) -> bool {
        let entry = self.store.subsegment_entry(subsegment);
        entry.sides.iter().flatten().all(|side| {
            let org = self.store.position(self.store.org(*side));
            let dest = self.store.position(self.store.dest(*side));
            let apex = self.store.position(self.store.apex(*side));
            position != org
                && position != dest
                && math::orientation(org, position, apex).is_ccw()
                && math::orientation(position, dest, apex).is_ccw()
        })
    }

    /// Re-evaluates every triangle around a new vertex and every sub-segment it may encroach.
    fn enqueue_around(&mut self, vertex: FixedVertexHandle) {
        for edge in self.store.out_edges(vertex) {
            self.assess(edge.triangle());
            if let Some(subsegment) = self.store.subsegment_at(edge.lnext()) {
                self.encroached.push_back(subsegment);
            }
        }
    }
}

/// Returns a split point on `input_vertex -> other` whose distance to the input vertex is a power
/// of two.
///
/// Segments meeting at a small input angle are then split on concentric circles around their
/// shared vertex and cannot encroach each other indefinitely.
fn concentric_shell_split<S: MeshNum>(input_vertex: Point2<S>, other: Point2<S>) -> Point2<S> {
    let length = input_vertex.distance_2(other).sqrt();
    let half = length * 0.5f32.into();
    let distance = nearest_power_of_two(half);
    let factor = distance / length;
    if !(factor > S::zero() && factor < 1.0f32.into()) {
        return input_vertex.midpoint(other);
    }
    input_vertex.add(other.sub(input_vertex).mul(factor))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utilities::{
        check_area_bound, check_constraints, check_min_angle, random_points_with_seed, SEED,
    };
    use crate::{MeshError, PlanarGraph, Point2};
    use approx::assert_relative_eq;

    fn rectangle(width: f64, height: f64) -> Result<PlanarGraph<f64>, MeshError> {
        let mut graph = PlanarGraph::new();
        graph.add_polygon([
            Point2::new(0.0, 0.0),
            Point2::new(width, 0.0),
            Point2::new(width, height),
            Point2::new(0.0, height),
        ])?;
        Ok(graph)
    }

    #[test]
    fn test_angle_limit() {
        let limit = AngleLimit::from_deg(30.0);
        assert_relative_eq!(limit.quality_key_limit(), 0.75, epsilon = 1e-12);
        assert_relative_eq!(limit.deg(), 30.0, epsilon = 1e-12);
        assert_eq!(AngleLimit::from_deg(0.0).quality_key_limit(), 1.0);
    }

    #[test]
    fn test_steiner_limit() {
        assert_eq!(SteinerLimit::Total(5).resolve(100), 5);
        assert_eq!(SteinerLimit::PerInputVertex(5).resolve(100), 500);
    }

    #[test]
    fn test_concentric_shell_split() {
        let split = concentric_shell_split(Point2::new(0.0, 0.0), Point2::new(3.0, 0.0));
        // Half length 1.5 rounds to 2.0 in log space
        assert_relative_eq!(split.x, 2.0);
        assert_eq!(split.y, 0.0);
    }

    #[test]
    fn test_unit_square_needs_no_refinement() -> Result<(), MeshError> {
        let mut mesh = rectangle(1.0, 1.0)?.triangulate()?;
        let result = mesh.refine(&RefinementParameters::new());
        assert!(result.refinement_complete);
        assert_eq!(result.steiner_points_inserted, 0);
        assert_eq!(mesh.num_triangles(), 2);
        Ok(())
    }

    #[test]
    fn test_thin_rectangle_area_bound() -> Result<(), MeshError> {
        let graph = rectangle(1.0, 0.01)?;
        let mut mesh = graph.triangulate()?;
        let parameters = RefinementParameters::new()
            .with_angle_limit(AngleLimit::from_deg(20.0))
            .with_max_allowed_area(0.0001);
        let result = mesh.refine(&parameters);

        assert!(result.refinement_complete);
        assert!(result.segment_splits > 0);
        check_area_bound(&mesh, 0.0001);
        check_min_angle(&mesh, AngleLimit::from_deg(20.0));
        check_constraints(&mesh, &graph);
        mesh.cdt_sanity_check();

        // The domain has an area of 0.01
        let count = mesh.num_triangles();
        assert!(count >= 100, "only {count} triangles");
        assert!(count <= 10_000, "{count} triangles");
        Ok(())
    }

    #[test]
    fn test_refinement_is_idempotent() -> Result<(), MeshError> {
        let mut graph = rectangle(4.0, 3.0)?;
        graph.add_vertices(random_points_with_seed(40, SEED).into_iter().map(|p| {
            Point2::new(p.x * 1.5 + 2.0, p.y + 1.5)
        }))?;
        let mut mesh = graph.triangulate()?;

        let parameters = RefinementParameters::new()
            .with_angle_limit(AngleLimit::from_deg(20.0))
            .with_max_allowed_area(0.5);
        let first = mesh.refine(&parameters);
        assert!(first.refinement_complete);
        assert!(first.steiner_points_inserted > 0);
        mesh.cdt_sanity_check();

        let num_vertices = mesh.num_vertices();
        let second = mesh.refine(&parameters);
        assert!(second.refinement_complete);
        assert_eq!(second.steiner_points_inserted, 0);
        assert_eq!(mesh.num_vertices(), num_vertices);
        Ok(())
    }

    #[test]
    fn test_angle_bound_with_interior_segments() -> Result<(), MeshError> {
        let mut graph = rectangle(10.0, 10.0)?;
        let a = graph.add_vertex(Point2::new(2.0, 2.0))?;
        let b = graph.add_vertex(Point2::new(8.0, 3.0))?;
        let c = graph.add_vertex(Point2::new(5.0, 8.5))?;
        graph.add_segment(a, b)?;
        graph.add_segment(b, c)?;

        let mut mesh = graph.triangulate()?;
        let limit = AngleLimit::from_deg(20.0);
        let result = mesh.refine(&RefinementParameters::new().with_angle_limit(limit));
        assert!(result.refinement_complete);
        check_min_angle(&mesh, limit);
        check_constraints(&mesh, &graph);
        mesh.cdt_sanity_check();
        Ok(())
    }

    #[test]
    fn test_small_input_angle_terminates() -> Result<(), MeshError> {
        // Two segments meeting at roughly 3 degrees
        let mut graph = rectangle(10.0, 10.0)?;
        let apex = graph.add_vertex(Point2::new(1.0, 1.0))?;
        let a = graph.add_vertex(Point2::new(9.0, 1.4))?;
        let b = graph.add_vertex(Point2::new(9.0, 1.0))?;
        graph.add_segment(apex, a)?;
        graph.add_segment(apex, b)?;

        let mut mesh = graph.triangulate()?;
        let result = mesh.refine(
            &RefinementParameters::new()
                .with_angle_limit(AngleLimit::from_deg(20.0))
                .with_steiner_limit(SteinerLimit::Total(20_000)),
        );
        assert!(result.steiner_points_inserted <= 20_000);
        assert!(result.segment_splits > 0);
        check_constraints(&mesh, &graph);
        mesh.cdt_sanity_check();
        Ok(())
    }

    #[test]
    fn test_steiner_limit_exhaustion() -> Result<(), MeshError> {
        let mut mesh = rectangle(1.0, 0.01)?.triangulate()?;
        let result = mesh.refine(
            &RefinementParameters::new()
                .with_max_allowed_area(0.00001)
                .with_steiner_limit(SteinerLimit::Total(10)),
        );
        assert!(!result.refinement_complete);
        assert_eq!(result.steiner_points_inserted, 10);
        assert!(result
            .diagnostics
            .contains(&Diagnostic::UnboundedRefinement { steiner_points: 10 }));
        mesh.cdt_sanity_check();
        Ok(())
    }

    #[test]
    fn test_region_area_bounds() -> Result<(), MeshError> {
        let mut graph = rectangle(2.0, 1.0)?;
        let top = graph.add_vertex(Point2::new(1.0, 1.0))?;
        let bottom = graph.add_vertex(Point2::new(1.0, 0.0))?;
        graph.add_segment(top, bottom)?;
        graph.add_region(Point2::new(0.5, 0.5), 1, Some(0.01));
        graph.add_region(Point2::new(1.5, 0.5), 2, None);

        let mut mesh = graph.triangulate()?;
        mesh.refine(&RefinementParameters::new().with_max_allowed_area(0.1));

        for triangle in mesh.triangles() {
            match triangle.region() {
                Some(1) => assert!(triangle.area() <= 0.01),
                Some(2) => assert!(triangle.area() <= 0.1),
                other => panic!("unexpected region {other:?}"),
            }
        }
        let left = mesh.triangles().filter(|t| t.region() == Some(1)).count();
        let right = mesh.triangles().filter(|t| t.region() == Some(2)).count();
        assert!(left > right);
        Ok(())
    }

    #[test]
    fn test_slanted_segments_holes_and_regions() -> Result<(), MeshError> {
        let mut graph = PlanarGraph::new();
        // Concave outline with a notch at (6, 4)
        let outline = graph.add_polygon([
            Point2::new(0.0, 0.0),
            Point2::new(9.0, 0.0),
            Point2::new(12.0, 3.0),
            Point2::new(12.0, 8.0),
            Point2::new(6.0, 4.0),
            Point2::new(0.0, 8.0),
        ])?;
        // Slanted segment separating the right part
        graph.add_segment(outline.start + 1, outline.start + 4)?;
        graph.add_polygon([
            Point2::new(2.0, 1.5),
            Point2::new(4.0, 1.0),
            Point2::new(3.0, 3.0),
        ])?;
        graph.add_hole(Point2::new(3.0, 1.8));
        graph.add_region(Point2::new(10.0, 3.0), 1, Some(0.2));
        graph.add_region(Point2::new(2.0, 5.0), 2, None);

        let mut mesh = graph.triangulate()?;
        let limit = AngleLimit::from_deg(25.0);
        let parameters = RefinementParameters::new()
            .with_angle_limit(limit)
            .with_max_allowed_area(1.0);
        let result = mesh.refine(&parameters);

        assert!(result.refinement_complete);
        assert!(result.segment_splits > 0);
        mesh.cdt_sanity_check();
        check_constraints(&mesh, &graph);
        check_min_angle(&mesh, limit);
        for triangle in mesh.triangles() {
            match triangle.region() {
                Some(1) => assert!(triangle.area() <= 0.2),
                Some(2) => assert!(triangle.area() <= 1.0),
                other => panic!("unexpected region {other:?}"),
            }
        }
        // Outline area minus the hole
        let area: f64 = mesh.triangles().map(|triangle| triangle.area()).sum();
        assert_relative_eq!(area, 67.5 - 1.75, epsilon = 1e-9);

        let num_vertices = mesh.num_vertices();
        let second = mesh.refine(&parameters);
        assert!(second.refinement_complete);
        assert_eq!(second.steiner_points_inserted, 0);
        assert_eq!(mesh.num_vertices(), num_vertices);
        Ok(())
    }

    #[test]
    fn test_dropped_bad_triangle_is_reported() -> Result<(), MeshError> {
        let mut mesh = rectangle(1.0, 0.01)?.triangulate()?;
        let parameters = RefinementParameters::new().with_angle_limit(AngleLimit::from_deg(20.0));
        let triangle = mesh.triangles().next().unwrap().fix();

        // The circumcenter of each half encroaches upon the long boundary segments. Without any
        // budget left, none of them can be split.
        let mut refiner = Refiner::new(&mut mesh.store, &parameters, 0);
        let bad = BadTriangle {
            triangle,
            vertices: refiner.store.triangle_entry(triangle).vertices,
            key: math::quality_key(refiner.store.triangle_positions(triangle)).into(),
        };
        refiner.split_triangle(bad);
        assert_eq!(refiner.skipped, 1);

        let finished = refiner.process();
        assert!(finished);
        let result = refiner.finish(finished);
        assert!(!result.refinement_complete);
        assert_eq!(result.steiner_points_inserted, 0);
        assert!(result
            .diagnostics
            .contains(&Diagnostic::UnboundedRefinement { steiner_points: 0 }));
        mesh.cdt_sanity_check();
        Ok(())
    }
}
