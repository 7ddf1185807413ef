//! Error types shared by the controllers, the tunable channel and the
//! hardware layer.
//!
//! Most runtime problems are not errors here: a flaky sensor read is logged
//! and replaced with a neutral value, and a disabled robot is simply driven to
//! zero. The variants below are the cases a caller can actually act on.

use snafu::Snafu;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the control core.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// An arm target outside the mechanism's travel was requested.
    ///
    /// The command is dropped and the arm keeps its previous goal.
    #[snafu(display("arm target {angle_deg:.2}° is outside [{min_deg}°, {max_deg}°]"))]
    InvalidTarget {
        /// The rejected target in degrees.
        angle_deg: f64,
        /// Lower travel bound in degrees.
        min_deg:   f64,
        /// Upper travel bound in degrees.
        max_deg:   f64,
    },

    /// A device required by a hardware deployment is not plugged in.
    #[snafu(display("{device} is not connected on port {port}"))]
    HardwareUnavailable {
        /// Human readable device role, e.g. `"arm leader motor"`.
        device: &'static str,
        /// The port the device was expected on.
        port:   u8,
    },

    /// The aiming curve was evaluated at or inside its singularity.
    #[snafu(display("distance {distance:.3} m is inside the aiming singularity (needs > {limit:.4} m)"))]
    AimDomain {
        /// Distance to the target in meters.
        distance: f64,
        /// Smallest distance the curve accepts.
        limit:    f64,
    },

    /// A payload on the tunable configuration channel could not be parsed.
    #[snafu(display("tunable payload rejected: {source}"))]
    Channel {
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_message_names_bounds() {
        let err = Error::InvalidTarget {
            angle_deg: 95.0,
            min_deg:   0.0,
            max_deg:   90.0,
        };
        assert_eq!(err.to_string(), "arm target 95.00° is outside [0°, 90°]");
    }

    #[test]
    fn hardware_message_names_port() {
        let err = Error::HardwareUnavailable {
            device: "shooter top motor",
            port:   4,
        };
        assert_eq!(err.to_string(), "shooter top motor is not connected on port 4");
    }
}
