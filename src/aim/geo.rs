//! Field geometry for aiming.
//!
//! # Types
//!
//! - `Point`: A 2D point on the field.
//! - `Pose`: A robot position with heading.
//! - `Alliance`: Which side of the field the robot plays from.

use serde::{Deserialize, Serialize};

use crate::constants::field;

/// A 2D point in field coordinates.
///
/// # Example
///
/// ```
/// use talos::aim::geo::Point;
///
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(3.0, 4.0);
/// assert_eq!(a.distance(b), 5.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// The x-coordinate in meters, along the field's length.
    pub x: f64,
    /// The y-coordinate in meters.
    pub y: f64,
}

impl Point {
    /// Create a new point using `x` and `y` coordinates
    pub const fn new(x: f64, y: f64) -> Self { Point { x, y } }

    /// Straight-line distance to `other`.
    pub fn distance(self, other: Point) -> f64 { (self.x - other.x).hypot(self.y - other.y) }
}

/// A robot position and heading on the field.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// The x-coordinate in meters.
    pub x: f64,
    /// The y-coordinate in meters.
    pub y: f64,
    /// The heading in radians, counter-clockwise from the +x axis.
    pub t: f64,
}

impl Pose {
    /// Creates a pose from a position in meters and a heading in radians.
    pub const fn new(x: f64, y: f64, t: f64) -> Self { Self { x, y, t } }

    /// The position part of the pose.
    pub const fn translation(&self) -> Point { Point::new(self.x, self.y) }
}

/// The side of the field the robot plays from.
///
/// Field coordinates are always given from the blue side. Red positions are
/// mirrored across the field's length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alliance {
    #[default]
    Blue,
    Red,
}

impl Alliance {
    /// Mirrors a blue-side x-coordinate onto this alliance's side.
    pub fn flip_x(self, x: f64) -> f64 {
        match self {
            Alliance::Blue => x,
            Alliance::Red => field::LENGTH_METERS - x,
        }
    }

    /// Mirrors a blue-side point onto this alliance's side.
    pub fn apply(self, point: Point) -> Point { Point::new(self.flip_x(point.x), point.y) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blue_is_identity() {
        let p = Point::new(1.5, 2.0);
        assert_eq!(Alliance::Blue.apply(p), p);
    }

    #[test]
    fn red_mirrors_x_only() {
        let p = Alliance::Red.apply(Point::new(1.0, 2.0));
        assert!((p.x - (field::LENGTH_METERS - 1.0)).abs() < 1e-12);
        assert_eq!(p.y, 2.0);
    }

    #[test]
    fn pose_translation() {
        let pose = Pose::new(1.0, 2.0, 0.5);
        assert_eq!(pose.translation(), Point::new(1.0, 2.0));
        assert_eq!(Pose::default().translation().distance(Point::new(0.0, 2.0)), 2.0);
    }
}
