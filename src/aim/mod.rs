//! Arm angle for scoring from where the robot stands.
//!
//! The shot angle follows an empirical curve fitted on the practice field:
//!
//! ```text
//! angle_deg = (-0.33 * ln(119 * (d - 0.67)) + 2) * 180 / π
//! ```
//!
//! where `d` is the distance in meters from the robot to the speaker opening.
//! The curve is only defined for `d > 0.67 + 1/119`; closer than that the
//! logarithm is zero, negative or undefined, and asking for an angle is an
//! error rather than a NaN headed for the motors.
//!
//! # Example
//!
//! ```
//! use talos::aim::{self, geo::{Alliance, Pose}};
//!
//! let angle = aim::shot_angle_deg(2.0).unwrap();
//! assert!((angle - 18.84).abs() < 0.01);
//!
//! assert!(aim::shot_angle_deg(0.67).is_err());
//!
//! let pose = Pose::new(2.0, 5.5479, 0.0);
//! let from_pose = aim::angle_to_speaker(pose, Alliance::Blue).unwrap();
//! assert!((from_pose - angle).abs() < 1e-9);
//! ```

/// Field geometry for aiming.
///
/// Provides [`Point`](geo::Point), [`Pose`](geo::Pose) and the
/// [`Alliance`](geo::Alliance) mirror.
pub mod geo;

use log::warn;

use self::geo::{Alliance, Point, Pose};
use crate::{
    constants::{aim, field},
    error::{AimDomainSnafu, Result},
};

/// Smallest distance the curve accepts, exclusive.
pub fn min_distance() -> f64 { aim::DISTANCE_OFFSET + 1.0 / aim::DISTANCE_SCALE }

/// Arm angle in degrees for a shot from `distance` meters.
pub fn shot_angle_deg(distance: f64) -> Result<f64> {
    let limit = min_distance();
    if !distance.is_finite() || distance <= limit {
        warn!("Aim distance {:.3} m is inside the curve's domain limit", distance);
        return AimDomainSnafu { distance, limit }.fail();
    }
    let log = (aim::DISTANCE_SCALE * (distance - aim::DISTANCE_OFFSET)).ln();
    Ok((-aim::LOG_GAIN * log + aim::ANGLE_OFFSET_RAD).to_degrees())
}

/// The center of the speaker opening for `alliance`.
pub fn speaker_opening(alliance: Alliance) -> Point {
    alliance.apply(Point::new(field::SPEAKER_OPENING_X, field::SPEAKER_OPENING_Y))
}

/// Distance from `pose` to the alliance's speaker opening.
pub fn distance_to_speaker(pose: Pose, alliance: Alliance) -> f64 {
    pose.translation().distance(speaker_opening(alliance))
}

/// Arm angle in degrees for a shot from `pose`.
pub fn angle_to_speaker(pose: Pose, alliance: Alliance) -> Result<f64> {
    shot_angle_deg(distance_to_speaker(pose, alliance))
}
