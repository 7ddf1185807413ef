//! Robot-wide constants.
//!
//! Values that never change at runtime live here. Anything that a person is
//! expected to tweak from the dashboard is registered as a tunable by the
//! owning controller instead, using the defaults below.

use serde::{Deserialize, Serialize};

/// Seconds between two controller periods.
pub const LOOP_PERIOD_SECS: f64 = 0.02;

/// Voltage rail every motor output is clamped to.
pub const MAX_VOLTAGE: f64 = 12.0;

/// Which robot the code is running on.
///
/// The physics simulator is treated as a separate robot with its own
/// feedforward tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deployment {
    /// The competition robot with real motors and sensors.
    Real,
    /// The desktop physics simulation.
    Sim,
}

impl Deployment {
    /// The deployment this binary was built for.
    pub const fn current() -> Self {
        if cfg!(feature = "v5") { Self::Real } else { Self::Sim }
    }
}

pub mod arm {
    /// Lowest accepted target angle in degrees.
    pub const MIN_TARGET_DEG: f64 = 0.0;
    /// Highest accepted target angle in degrees.
    pub const MAX_TARGET_DEG: f64 = 90.0;
    /// Above this angle the arm may only be driven down.
    pub const SOFT_LIMIT_UPPER_DEG: f64 = 80.0;
    /// Below this angle the arm may only be driven up.
    pub const SOFT_LIMIT_LOWER_DEG: f64 = 15.0;
    /// Target held before anything is commanded.
    pub const INITIAL_TARGET_DEG: f64 = 50.0;

    /// Position PID gains, volts per radian of error.
    pub const KP: f64 = 18.0;
    pub const KI: f64 = 0.0;
    pub const KD: f64 = 0.0;
    /// Goal tolerance, degrees.
    pub const POSITION_TOLERANCE_DEG: f64 = 2.0;
    /// Profile cruise velocity, rad/s.
    pub const MAX_VELOCITY_RAD: f64 = 0.9;
    /// Profile acceleration, rad/s².
    pub const MAX_ACCELERATION_RAD: f64 = 1.1;

    /// Motor rotations per arm rotation.
    pub const GEAR_RATIO: f64 = 100.0;
    /// Arm moment of inertia about the shoulder, kg·m².
    pub const MOMENT_OF_INERTIA: f64 = 0.5;
    /// Angle the simulated arm starts at, degrees.
    pub const SIM_START_DEG: f64 = 30.0;
    /// Hard stop travel of the mechanism, degrees.
    pub const HARD_STOP_MIN_DEG: f64 = 0.0;
    pub const HARD_STOP_MAX_DEG: f64 = 95.0;
}

pub mod shooter {
    pub const SHOOT_RPM: f64 = 2000.0;
    pub const DELIVER_RPM: f64 = 1200.0;
    pub const REVERSE_RPM: f64 = -500.0;
    /// Spin-up time before a note is fed.
    pub const SPIN_DURATION_SECS: f64 = 1.5;
    /// Velocity PID gains, volts per RPM of error.
    pub const KP: f64 = 0.0;
    pub const KD: f64 = 0.0;

    /// Feedforward (ks, kv) on the competition robot, volts per RPM.
    pub const REAL_FF: (f64, f64) = (0.001, 0.0060);
    /// Feedforward (ks, kv) in simulation, volts per RPM.
    pub const SIM_FF: (f64, f64) = (0.0, 0.0055);

    pub const GEAR_RATIO: f64 = 1.0;
    pub const MOMENT_OF_INERTIA: f64 = 0.004;
}

pub mod indexer {
    pub const INDEX_RPM: f64 = 600.0;
    pub const REVERSE_RPM: f64 = -300.0;
    /// Velocity PID gains, volts per rad/s of error.
    pub const KP: f64 = 0.1;
    pub const KI: f64 = 0.01;

    /// Feedforward (ks, kv) on the competition robot, volts per rad/s.
    pub const REAL_FF: (f64, f64) = (0.1, 0.12);
    /// Feedforward (ks, kv) in simulation, volts per rad/s.
    pub const SIM_FF: (f64, f64) = (0.0, 0.0);

    pub const GEAR_RATIO: f64 = 3.0;
    pub const MOMENT_OF_INERTIA: f64 = 0.002;
}

pub mod intake {
    pub const EAT_VOLTS: f64 = 8.0;
    pub const VOMIT_VOLTS: f64 = -8.0;
    pub const DIGEST_VOLTS: f64 = 10.0;

    pub const FIRST_STAGE_GEAR_RATIO: f64 = 3.0;
    pub const SECOND_STAGE_GEAR_RATIO: f64 = 2.0;
    pub const MOMENT_OF_INERTIA: f64 = 0.004;

    /// A rangefinder reading below this means a note is seated.
    pub const NOTE_RANGE_INCHES: f64 = 10.0;

    /// Filtered velocity magnitude below which the signature is ignored.
    pub const SIGNATURE_MIN_VELOCITY_RAD: f64 = 10.0;
    /// Time constant of the signature's velocity low-pass filter.
    pub const SIGNATURE_FILTER_TIME_CONSTANT_SECS: f64 = 0.1;
    /// Time the rollers must run inward before a note counts as eaten.
    pub const SIGNATURE_INTAKE_DWELL_SECS: f64 = 2.0;
    /// Time the rollers must run outward before a note counts as gone.
    pub const SIGNATURE_EXPEL_DWELL_SECS: f64 = 0.25;
}

pub mod field {
    /// Field length along the alliance axis, meters.
    pub const LENGTH_METERS: f64 = 16.541;
    /// Blue speaker opening, meters.
    pub const SPEAKER_OPENING_X: f64 = 0.0;
    pub const SPEAKER_OPENING_Y: f64 = 5.5479;
}

pub mod aim {
    /// Coefficients of `(-A * ln(B * (d - C)) + D) * 180 / π`.
    pub const LOG_GAIN: f64 = 0.33;
    pub const DISTANCE_SCALE: f64 = 119.0;
    pub const DISTANCE_OFFSET: f64 = 0.67;
    pub const ANGLE_OFFSET_RAD: f64 = 2.0;
}
