use crate::{InsertionError, MeshNum, Point2};

/// The smallest allowed coordinate value greater than zero that can be inserted into a mesh.
/// This value is equal to 2<sup>-142</sup>.
///
/// The *absolute value* of any inserted vertex coordinate must be either zero or greater
/// than or equal to this value.
/// This is a requirement for preventing floating point underflow when calculating exact
/// geometric predicates.
///
/// *See also [validate_coordinate], [MAX_ALLOWED_VALUE]*

// These limits come from Shewchuk's "Adaptive Precision Floating-Point Arithmetic and Fast
// Robust Geometric Predicates": the predicates neither overflow nor underflow if their
// inputs have exponents in the range -[142, 201].
pub const MIN_ALLOWED_VALUE: f64 = 1.793662034335766e-43; // 1.0 * 2^-142

/// The largest allowed coordinate value that can be inserted into a mesh.
/// This value is equal to 2<sup>201</sup>.
///
/// *See also [validate_coordinate], [MIN_ALLOWED_VALUE]*
pub const MAX_ALLOWED_VALUE: f64 = 3.2138760885179806e60; // 1.0 * 2^201

/// Checks if a coordinate value is suitable for insertion into a mesh.
///
/// Will return an error if and only if
///  - The absolute value of the coordinate is too small (See [MIN_ALLOWED_VALUE])
///  - The absolute value of the coordinate is too large (See [MAX_ALLOWED_VALUE])
///  - The coordinate is NaN (not a number)
///
/// Passing in any non-finite floating point number will result in `Err(InsertionError::TooLarge)`.
pub fn validate_coordinate<S: MeshNum>(value: S) -> Result<(), InsertionError> {
    let as_f64: f64 = value.into();
    if as_f64.is_nan() {
        Err(InsertionError::NAN)
    } else if as_f64.abs() < MIN_ALLOWED_VALUE && as_f64 != 0.0 {
        Err(InsertionError::TooSmall)
    } else if as_f64.abs() > MAX_ALLOWED_VALUE {
        Err(InsertionError::TooLarge)
    } else {
        Ok(())
    }
}

/// Checks both coordinates of a point, see [validate_coordinate].
pub fn validate_point<S: MeshNum>(point: Point2<S>) -> Result<(), InsertionError> {
    validate_coordinate(point.x)?;
    validate_coordinate(point.y)?;
    Ok(())
}

/// Describes how three points are oriented relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The query point lies left of the directed line.
    CounterClockwise,
    /// The query point lies right of the directed line.
    Clockwise,
    /// All three points lie on a common line.
    Collinear,
}

impl Orientation {
    #[inline]
    fn from_determinant(determinant: f64) -> Self {
        if determinant > 0.0 {
            Orientation::CounterClockwise
        } else if determinant < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }

    /// Returns `true` if the query point lies strictly left of the line.
    pub fn is_ccw(self) -> bool {
        self == Orientation::CounterClockwise
    }

    /// Returns `true` if the query point lies strictly right of the line.
    pub fn is_cw(self) -> bool {
        self == Orientation::Clockwise
    }

    /// Returns `true` if all points lie on a common line.
    pub fn is_collinear(self) -> bool {
        self == Orientation::Collinear
    }
}

/// Position of a point relative to a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CirclePosition {
    Inside,
    On,
    Outside,
}

fn to_robust_coord<S: MeshNum>(point: Point2<S>) -> robust::Coord<f64> {
    robust::Coord {
        x: point.x.into(),
        y: point.y.into(),
    }
}

/// Returns on which side of the directed line `p1 -> p2` the query point lies.
///
/// Evaluated with adaptive exact arithmetic, the result is never affected by rounding.
pub fn orientation<S: MeshNum>(p1: Point2<S>, p2: Point2<S>, query_point: Point2<S>) -> Orientation {
    let determinant = robust::orient2d(
        to_robust_coord(p1),
        to_robust_coord(p2),
        to_robust_coord(query_point),
    );
    Orientation::from_determinant(determinant)
}

/// Returns the position of `p` relative to the circumcircle of `v1`, `v2` and `v3`.
///
/// `v1`, `v2` and `v3` must be ordered counterclockwise.
pub fn in_circle<S: MeshNum>(
    v1: Point2<S>,
    v2: Point2<S>,
    v3: Point2<S>,
    p: Point2<S>,
) -> CirclePosition {
    let determinant = robust::incircle(
        to_robust_coord(v1),
        to_robust_coord(v2),
        to_robust_coord(v3),
        to_robust_coord(p),
    );

    if determinant > 0.0 {
        CirclePosition::Inside
    } else if determinant < 0.0 {
        CirclePosition::Outside
    } else {
        CirclePosition::On
    }
}

/// Strict variant of [in_circle]. Co-circular points are reported as not contained.
pub fn contained_in_circumference<S: MeshNum>(
    v1: Point2<S>,
    v2: Point2<S>,
    v3: Point2<S>,
    p: Point2<S>,
) -> bool {
    in_circle(v1, v2, v3, p) == CirclePosition::Inside
}

/// Returns the circumcenter of a non degenerate triangle.
pub fn circumcenter<S: MeshNum>(v0: Point2<S>, v1: Point2<S>, v2: Point2<S>) -> Point2<S> {
    let b = v1.sub(v0);
    let c = v2.sub(v0);

    let one: S = 1.0f32.into();
    let two: S = 2.0f32.into();
    let d = two * (b.x * c.y - b.y * c.x);
    let len_b = b.length2();
    let len_c = c.length2();
    let d_inv = one / d;

    let x = (c.y * len_b - b.y * len_c) * d_inv;
    let y = (b.x * len_c - c.x * len_b) * d_inv;
    v0.add(Point2::new(x, y))
}

/// Returns the signed area of a triangle. Positive for counterclockwise triangles.
pub fn triangle_area<S: MeshNum>(v0: Point2<S>, v1: Point2<S>, v2: Point2<S>) -> S {
    let b = v1.sub(v0);
    let c = v2.sub(v0);
    let half: S = 0.5f32.into();
    (b.x * c.y - b.y * c.x) * half
}

/// Returns the squared length of the shortest edge and the index of the vertex opposite to it.
pub fn shortest_edge<S: MeshNum>(vertices: [Point2<S>; 3]) -> (usize, S) {
    let mut result = (0, S::infinity());
    for index in 0..3 {
        let from = vertices[(index + 1) % 3];
        let to = vertices[(index + 2) % 3];
        let length_2 = from.distance_2(to);
        if length_2 < result.1 {
            result = (index, length_2);
        }
    }
    result
}

/// Calculates the quality key of a triangle: the squared cosine of its smallest angle.
///
/// The smallest angle is always acute and opposite of the shortest edge. Larger keys indicate
/// skinnier triangles. A degenerate triangle has a key of `1.0`.
pub fn quality_key<S: MeshNum>(vertices: [Point2<S>; 3]) -> S {
    let (apex, _) = shortest_edge(vertices);
    let origin = vertices[apex];
    let d1 = vertices[(apex + 1) % 3].sub(origin);
    let d2 = vertices[(apex + 2) % 3].sub(origin);

    let dot = d1.dot(d2);
    let denominator = d1.length2() * d2.length2();
    if denominator <= S::zero() {
        return 1.0f32.into();
    }
    (dot * dot / denominator).min(1.0f32.into())
}

/// Converts an angle bound into the corresponding bound on the quality key.
pub fn quality_key_limit(min_angle_rad: f64) -> f64 {
    let cos = min_angle_rad.cos();
    cos * cos
}

/// Returns the smallest inner angle of a triangle in radians.
pub fn min_angle<S: MeshNum>(vertices: [Point2<S>; 3]) -> f64 {
    let key: f64 = quality_key(vertices).into();
    key.sqrt().min(1.0).acos()
}

/// Returns the largest inner angle of a triangle in radians.
pub fn max_angle<S: MeshNum>(vertices: [Point2<S>; 3]) -> f64 {
    let vertices = vertices.map(|vertex| vertex.to_f64());
    let mut result: f64 = 0.0;
    for index in 0..3 {
        let origin = vertices[index];
        let d1 = vertices[(index + 1) % 3].sub(origin);
        let d2 = vertices[(index + 2) % 3].sub(origin);
        let denominator = (d1.length2() * d2.length2()).sqrt();
        if denominator <= 0.0 {
            continue;
        }
        let cos = (d1.dot(d2) / denominator).clamp(-1.0, 1.0);
        result = result.max(cos.acos());
    }
    result
}

/// Returns `true` if the query point lies strictly inside the diametral circle of an edge.
pub fn is_encroaching_edge<S: MeshNum>(
    edge_from: Point2<S>,
    edge_to: Point2<S>,
    query_point: Point2<S>,
) -> bool {
    let edge_center = edge_from.midpoint(edge_to);
    let radius_2 = edge_from.distance_2(edge_to) * 0.25f32.into();

    query_point.distance_2(edge_center) < radius_2
}

/// Rounds to the nearest power of two (in log space).
pub fn nearest_power_of_two<S: MeshNum>(input: S) -> S {
    input.log2().round().exp2()
}
