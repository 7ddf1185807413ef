//! Control primitives shared by the mechanism controllers.
//!
//! Everything in here is plain arithmetic on `f64` and knows nothing about
//! motors or ports. The mechanisms in [`crate::mechanism`] compose these
//! pieces and own the IO.
//!
//! - **PID**: a discrete PID with integral anti-windup and output capping.
//! - **Trapezoid profile**: velocity/acceleration limited motion between two
//!   states.
//! - **Profiled PID**: a PID that chases a moving profile setpoint instead of
//!   jumping straight to the goal.
//! - **Feedforward**: the static + velocity + acceleration motor model.
//! - **Filter**: a single-pole low-pass filter for noisy signals.
//!
//! # Example
//!
//! ```
//! use talos::motion::{
//!     profile::Constraints,
//!     profiled::ProfiledPid,
//! };
//!
//! let mut arm = ProfiledPid::new(18.0, 0.0, 0.0, Constraints::new(0.9, 1.1));
//! arm.reset(0.5);
//! arm.set_goal(1.2);
//! let volts = arm.calculate(0.5, 0.02);
//! assert!(volts > 0.0);
//! ```

/// Discrete PID controller.
pub mod pid;

/// Trapezoidal motion profile.
///
/// Generates the intermediate states a [`profiled::ProfiledPid`] tracks.
pub mod profile;

/// PID that follows a trapezoidal profile towards its goal.
pub mod profiled;

/// Motor feedforward models.
pub mod feedforward;

/// Low-pass filtering.
pub mod filter;

/// Caps the absolute value of `val` to `cap`.
pub(crate) fn abscap(val: f64, cap: f64) -> f64 {
    if val > cap {
        cap
    } else if val < -cap {
        -cap
    } else {
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abscap_is_symmetric() {
        assert_eq!(abscap(14.0, 12.0), 12.0);
        assert_eq!(abscap(-14.0, 12.0), -12.0);
        assert_eq!(abscap(3.5, 12.0), 3.5);
        assert_eq!(abscap(3.5, f64::INFINITY), 3.5);
    }
}
