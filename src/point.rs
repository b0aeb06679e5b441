use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coordinate type that can be used for meshing.
///
/// Geometric predicates are evaluated after converting into `f64`; `f32` coordinates only reduce
/// the storage footprint of a mesh.
///
/// This type should usually be either `f32` or `f64`.
pub trait MeshNum: Float + Into<f64> + From<f32> + Copy + std::fmt::Debug {}

impl<T> MeshNum for T where T: Float + Into<f64> + From<f32> + Copy + std::fmt::Debug {}

/// A two dimensional point.
///
/// This is the basic type used for defining positions of input vertices, hole seeds and region seeds.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point2<S> {
    /// The point's x coordinate
    pub x: S,
    /// The point's y coordinate
    pub y: S,
}

impl<S> Point2<S> {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: S, y: S) -> Self {
        Point2 { x, y }
    }
}

impl<S: MeshNum> Point2<S> {
    /// Returns the squared distance of this point and another point.
    #[inline]
    pub fn distance_2(&self, other: Self) -> S {
        self.sub(other).length2()
    }

    /// Returns the point halfway between this point and another point.
    pub fn midpoint(&self, other: Self) -> Self {
        let half: S = 0.5f32.into();
        self.add(other).mul(half)
    }

    pub(crate) fn to_f64(self) -> Point2<f64> {
        Point2::new(self.x.into(), self.y.into())
    }

    pub(crate) fn mul(&self, factor: S) -> Self {
        Point2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub(crate) fn add(&self, other: Self) -> Self {
        Point2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub(crate) fn length2(&self) -> S {
        self.x * self.x + self.y * self.y
    }

    pub(crate) fn sub(&self, other: Self) -> Self {
        Point2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub(crate) fn dot(&self, other: Self) -> S {
        self.x * other.x + self.y * other.y
    }

    pub(crate) fn min_components(&self, other: Self) -> Self {
        Point2::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub(crate) fn max_components(&self, other: Self) -> Self {
        Point2::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl<S: MeshNum> From<Point2<S>> for [S; 2] {
    #[inline]
    fn from(point: Point2<S>) -> Self {
        [point.x, point.y]
    }
}

impl<S: MeshNum> From<Point2<S>> for (S, S) {
    #[inline]
    fn from(point: Point2<S>) -> (S, S) {
        (point.x, point.y)
    }
}

impl<S: MeshNum> From<[S; 2]> for Point2<S> {
    #[inline]
    fn from(source: [S; 2]) -> Self {
        Self::new(source[0], source[1])
    }
}

impl<S: MeshNum> From<(S, S)> for Point2<S> {
    #[inline]
    fn from(source: (S, S)) -> Self {
        Self::new(source.0, source.1)
    }
}

#[cfg(test)]
mod test {
    use super::Point2;

    #[test]
    fn test_midpoint_and_distance() {
        let p0 = Point2::new(1.0, -2.0);
        let p1 = Point2::new(3.0, 2.0);

        assert_eq!(p0.midpoint(p1), Point2::new(2.0, 0.0));
        assert_eq!(p0.distance_2(p1), 20.0);
        assert_eq!(p1.distance_2(p0), 20.0);
    }

    #[test]
    fn test_conversions() {
        let point: Point2<f32> = [1.5f32, 2.5].into();
        assert_eq!(point, Point2::new(1.5, 2.5));

        let (x, y): (f32, f32) = point.into();
        assert_eq!((x, y), (1.5, 2.5));
        assert_eq!(point.to_f64(), Point2::new(1.5f64, 2.5f64));
    }
}
